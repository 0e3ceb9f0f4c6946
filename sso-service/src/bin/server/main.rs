use std::sync::Arc;

use auth::PasswordHasher;
use auth::TokenIssuer;
use sso_service::config::Config;
use sso_service::domain::auth::service::AuthService;
use sso_service::inbound::grpc::AuthGrpcService;
use sso_service::outbound::repositories::SqliteStorage;
use sso_service::proto::auth_server::AuthServer;
use tonic::transport::Server;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sso_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "sso-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        database_url = %config.database.url,
        grpc_port = config.server.grpc_port,
        timeout_secs = config.server.timeout_secs,
        token_ttl_minutes = config.token.ttl_minutes,
        "Configuration loaded"
    );

    let storage = Arc::new(SqliteStorage::connect(&config.database).await?);
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "sqlite",
        "Database ready"
    );

    let password_hasher = PasswordHasher::with_cost(
        config.password.memory_kib,
        config.password.iterations,
        config.password.parallelism,
    )?;
    let token_issuer = TokenIssuer::new(config.token.ttl()?)?;

    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&storage),
        Arc::clone(&storage),
        Arc::clone(&storage),
        password_hasher,
        token_issuer,
    ));

    let grpc_address = format!("0.0.0.0:{}", config.server.grpc_port).parse()?;
    let grpc_service = AuthGrpcService::new(auth_service);
    tracing::info!(
        address = %grpc_address,
        port = config.server.grpc_port,
        protocol = "grpc",
        "gRpc server listening"
    );

    Server::builder()
        .timeout(config.server.timeout())
        .trace_fn(|request| {
            tracing::info_span!(
                "grpc_request",
                method = %request.uri().path(),
            )
        })
        .add_service(AuthServer::new(grpc_service))
        .serve_with_shutdown(grpc_address, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!("Server exited successfully");

    Ok(())
}
