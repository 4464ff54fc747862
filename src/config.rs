/**
 * Service Configuration
 *
 * This module handles loading and validation of service configuration:
 * the PostgreSQL connection, the push-provider endpoints and credentials,
 * and the invite-token settings.
 *
 * # Configuration Sources
 *
 * Configuration is loaded from environment variables, with sensible defaults
 * for local development when possible. A `.env` file is honored if present.
 *
 * # Error Handling
 *
 * Configuration errors are logged but do not prevent startup. The database
 * loader returns `None` on failure so embedders can run against the
 * in-memory store instead.
 */

use std::time::Duration;

use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

/// Default FCM message-send endpoint
const DEFAULT_FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";
/// Default Instance-ID endpoint base for topic management
const DEFAULT_FCM_TOPIC_URL: &str = "https://iid.googleapis.com";

/// Push-provider (FCM) configuration.
#[derive(Debug, Clone)]
pub struct FcmConfig {
    /// Server key sent in the `Authorization` header
    pub server_key: String,
    /// Message-send endpoint
    pub send_url: String,
    /// Instance-ID endpoint base for topic subscribe/unsubscribe
    pub topic_url: String,
    /// Per-request timeout; bridge calls are never retried internally
    pub timeout: Duration,
}

/// Pending-admin invite token configuration.
#[derive(Debug, Clone)]
pub struct InviteConfig {
    /// HMAC secret for the invite bearer tokens
    pub secret: String,
    /// Token lifetime in hours
    pub ttl_hours: i64,
}

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub fcm: FcmConfig,
    pub invite: InviteConfig,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let fcm = FcmConfig {
            server_key: std::env::var("FCM_SERVER_KEY").unwrap_or_else(|err| {
                tracing::warn!("Missing FCM_SERVER_KEY ({err}); push calls will be rejected");
                String::new()
            }),
            send_url: std::env::var("FCM_SEND_URL")
                .unwrap_or_else(|_| DEFAULT_FCM_SEND_URL.to_string()),
            topic_url: std::env::var("FCM_TOPIC_URL")
                .unwrap_or_else(|_| DEFAULT_FCM_TOPIC_URL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("FCM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
        };

        let invite = InviteConfig {
            secret: std::env::var("INVITE_TOKEN_SECRET").unwrap_or_else(|err| {
                tracing::warn!("Missing INVITE_TOKEN_SECRET. Error: {err}");
                "your-secret-key-change-in-production".to_string()
            }),
            // Invite links stay valid for three days
            ttl_hours: std::env::var("INVITE_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(72),
        };

        Self { fcm, invite }
    }
}

/// Load and initialize the database connection pool.
///
/// This function:
/// 1. Reads `DATABASE_URL` from environment
/// 2. Creates a PostgreSQL connection pool
/// 3. Runs database migrations
///
/// # Returns
///
/// - `Some(PgPool)` if the database is successfully configured
/// - `None` if `DATABASE_URL` is not set or the connection fails
pub async fn load_database() -> Option<PgPool> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("DATABASE_URL not set. Database features will be disabled.");
            return None;
        }
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Database features will be disabled.");
            return None;
        }
    };

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => {
            tracing::info!("Database migrations completed successfully");
        }
        Err(e) => {
            tracing::error!("Failed to run database migrations: {:?}", e);
            // Continue anyway - migrations might have already been run
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}

/// Install the global tracing subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
