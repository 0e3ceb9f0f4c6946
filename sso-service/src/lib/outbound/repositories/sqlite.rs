use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqliteJournalMode;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use sqlx::SqlitePool;

use crate::config::DatabaseConfig;
use crate::domain::auth::errors::StorageError;
use crate::domain::auth::models::App;
use crate::domain::auth::models::AppId;
use crate::domain::auth::models::EmailAddress;
use crate::domain::auth::models::User;
use crate::domain::auth::models::UserId;
use crate::domain::auth::ports::AppProvider;
use crate::domain::auth::ports::UserProvider;
use crate::domain::auth::ports::UserSaver;

/// SQLite implementation of the credential store.
///
/// Every operation is a single statement, so the pool alone arbitrates
/// concurrent callers and the `users.email` UNIQUE constraint settles
/// registration races.
///
/// Emails are compared with SQLite's default BINARY collation, which makes
/// lookups case-sensitive: `Alice@x.com` and `alice@x.com` are two users.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Wrap an existing connection pool.
    ///
    /// The schema is expected to be migrated already.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open or create the database and run migrations.
    ///
    /// An in-memory URL (`sqlite::memory:`) gives every pooled connection its
    /// own database, so it needs `max_connections = 1`.
    ///
    /// # Arguments
    /// * `config` - Database URL and pool size
    ///
    /// # Returns
    /// Storage backed by a migrated pool
    ///
    /// # Errors
    /// * `sqlx::Error` - URL is invalid, connection or migration failed
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            // An in-memory database lives only as long as its connection
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::new(pool))
    }

    /// Provision a client application.
    ///
    /// Operator-side helper; the authentication flow only reads apps.
    pub async fn save_app(&self, name: &str, secret: &str) -> Result<AppId, StorageError> {
        let result = sqlx::query("INSERT INTO apps (name, secret) VALUES (?, ?)")
            .bind(name)
            .bind(secret)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        let id = i32::try_from(result.last_insert_rowid())
            .map_err(|e| StorageError::Database(format!("App id out of range: {}", e)))?;

        Ok(AppId(id))
    }

    /// Set or clear a user's admin flag.
    ///
    /// Operator-side helper; the authentication flow only reads the flag.
    pub async fn set_admin(&self, user_id: UserId, is_admin: bool) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE users SET is_admin = ? WHERE id = ?")
            .bind(is_admin)
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::UserNotFound);
        }

        Ok(())
    }
}

fn database_error(e: sqlx::Error) -> StorageError {
    StorageError::Database(e.to_string())
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId(row.try_get("id")?),
        email: row.try_get("email")?,
        password_hash: row.try_get("pass_hash")?,
    })
}

fn app_from_row(row: &SqliteRow) -> Result<App, sqlx::Error> {
    Ok(App {
        id: AppId(row.try_get("id")?),
        name: row.try_get("name")?,
        secret: row.try_get("secret")?,
    })
}

#[async_trait]
impl UserSaver for SqliteStorage {
    async fn save_user(
        &self,
        email: &EmailAddress,
        password_hash: &str,
    ) -> Result<UserId, StorageError> {
        let result = sqlx::query("INSERT INTO users (email, pass_hash) VALUES (?, ?)")
            .bind(email.as_str())
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return StorageError::UserExists(email.as_str().to_string());
                    }
                }
                StorageError::Database(e.to_string())
            })?;

        Ok(UserId(result.last_insert_rowid()))
    }
}

#[async_trait]
impl UserProvider for SqliteStorage {
    async fn find_user_by_email(&self, email: &str) -> Result<User, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, pass_hash
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .ok_or(StorageError::UserNotFound)?;

        user_from_row(&row).map_err(database_error)
    }

    async fn is_admin(&self, user_id: UserId) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT is_admin FROM users WHERE id = ?")
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .ok_or(StorageError::UserNotFound)?;

        row.try_get("is_admin").map_err(database_error)
    }
}

#[async_trait]
impl AppProvider for SqliteStorage {
    async fn find_app(&self, app_id: AppId) -> Result<App, StorageError> {
        let row = sqlx::query("SELECT id, name, secret FROM apps WHERE id = ?")
            .bind(app_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .ok_or(StorageError::AppNotFound)?;

        app_from_row(&row).map_err(database_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage() -> SqliteStorage {
        SqliteStorage::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
        .expect("Failed to open in-memory database")
    }

    fn email(s: &str) -> EmailAddress {
        EmailAddress::new(s.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_find_user() {
        let storage = storage().await;

        let user_id = storage
            .save_user(&email("a@x.com"), "$argon2id$hash")
            .await
            .expect("Failed to save user");
        assert_eq!(user_id, UserId(1));

        let user = storage.find_user_by_email("a@x.com").await.unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.password_hash, "$argon2id$hash");
    }

    #[tokio::test]
    async fn test_save_user_duplicate_email() {
        let storage = storage().await;

        storage.save_user(&email("a@x.com"), "h1").await.unwrap();
        let result = storage.save_user(&email("a@x.com"), "h2").await;

        assert!(matches!(result, Err(StorageError::UserExists(e)) if e == "a@x.com"));

        // The failed insert left the original record untouched
        let user = storage.find_user_by_email("a@x.com").await.unwrap();
        assert_eq!(user.password_hash, "h1");
    }

    #[tokio::test]
    async fn test_concurrent_registration_has_one_winner() {
        let storage = storage().await;
        let address = email("race@x.com");

        let (first, second) = tokio::join!(
            storage.save_user(&address, "h1"),
            storage.save_user(&address, "h2"),
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(StorageError::UserExists(_))))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_find_user_not_found() {
        let storage = storage().await;

        let result = storage.find_user_by_email("nobody@x.com").await;
        assert!(matches!(result, Err(StorageError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let storage = storage().await;

        storage.save_user(&email("Alice@x.com"), "h1").await.unwrap();

        assert!(matches!(
            storage.find_user_by_email("alice@x.com").await,
            Err(StorageError::UserNotFound)
        ));

        // Differently-cased address registers as a separate user
        let other = storage.save_user(&email("alice@x.com"), "h2").await;
        assert_eq!(other.unwrap(), UserId(2));
    }

    #[tokio::test]
    async fn test_is_admin() {
        let storage = storage().await;

        let regular = storage.save_user(&email("u@x.com"), "h").await.unwrap();
        let admin = storage.save_user(&email("root@x.com"), "h").await.unwrap();
        storage.set_admin(admin, true).await.unwrap();

        assert!(!storage.is_admin(regular).await.unwrap());
        assert!(storage.is_admin(admin).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_admin_unknown_user() {
        let storage = storage().await;

        assert!(matches!(
            storage.is_admin(UserId(42)).await,
            Err(StorageError::UserNotFound)
        ));
        assert!(matches!(
            storage.is_admin(UserId(0)).await,
            Err(StorageError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_set_admin_unknown_user() {
        let storage = storage().await;

        let result = storage.set_admin(UserId(7), true).await;
        assert!(matches!(result, Err(StorageError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_find_app() {
        let storage = storage().await;

        let app_id = storage.save_app("web", "s1").await.unwrap();
        assert_eq!(app_id, AppId(1));

        let app = storage.find_app(app_id).await.unwrap();
        assert_eq!(app.id, app_id);
        assert_eq!(app.name, "web");
        assert_eq!(app.secret, "s1");
    }

    #[tokio::test]
    async fn test_find_app_not_found() {
        let storage = storage().await;

        assert!(matches!(
            storage.find_app(AppId(3)).await,
            Err(StorageError::AppNotFound)
        ));
        assert!(matches!(
            storage.find_app(AppId(0)).await,
            Err(StorageError::AppNotFound)
        ));
    }
}
