use std::sync::Arc;

use auth::PasswordHasher;
use auth::TokenIssuer;
use chrono::Duration;
use sso_service::config::DatabaseConfig;
use sso_service::domain::auth::models::AppId;
use sso_service::domain::auth::service::AuthService;
use sso_service::inbound::grpc::AuthGrpcService;
use sso_service::outbound::repositories::SqliteStorage;
use sso_service::proto::auth_client::AuthClient;
use sso_service::proto::auth_server::AuthServer;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Channel;
use tonic::transport::Server;

pub const APP_SECRET: &str = "s1";
pub const TOKEN_TTL_MINUTES: i64 = 15;

/// Test application that serves the real gRPC API over an in-memory store
pub struct TestApp {
    pub address: String,
    pub storage: SqliteStorage,
    pub app_id: AppId,
    pub client: AuthClient<Channel>,
}

impl TestApp {
    /// Spawn the server in a background task, seeded with one application
    pub async fn spawn() -> Self {
        let storage = SqliteStorage::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
        .expect("Failed to open in-memory database");

        let app_id = storage
            .save_app("test-app", APP_SECRET)
            .await
            .expect("Failed to seed app");

        let shared = Arc::new(storage.clone());
        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&shared),
            Arc::clone(&shared),
            shared,
            // Cheap cost keeps the suite fast
            PasswordHasher::with_cost(1024, 1, 1).expect("Failed to build hasher"),
            TokenIssuer::new(Duration::minutes(TOKEN_TTL_MINUTES))
                .expect("Failed to build token issuer"),
        ));

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            Server::builder()
                .add_service(AuthServer::new(AuthGrpcService::new(auth_service)))
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .expect("Server error");
        });

        let client = AuthClient::connect(address.clone())
            .await
            .expect("Failed to connect gRPC client");

        Self {
            address,
            storage,
            app_id,
            client,
        }
    }

    /// Open an independent client connection to the running server
    pub async fn connect(&self) -> AuthClient<Channel> {
        AuthClient::connect(self.address.clone())
            .await
            .expect("Failed to connect gRPC client")
    }
}
