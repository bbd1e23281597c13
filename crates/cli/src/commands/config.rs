//! `check-config` command.

use archetype_sync::SyncConfig;

use super::{CliError, print_json};

/// Load the configuration and print a summary with secrets redacted.
///
/// # Errors
///
/// Returns the configuration error if loading fails.
pub fn check() -> Result<(), CliError> {
    let config = SyncConfig::from_env()?;

    print_json(&serde_json::json!({
        "listen": config.socket_addr().to_string(),
        "adminApiBase": config.shopify.admin_api_base(),
        "metafield": config.metafield.to_string(),
        "createMissingCustomers": config.create_missing_customers,
        "timeoutSecs": config.shopify.timeout.as_secs(),
        "connectTimeoutSecs": config.shopify.connect_timeout.as_secs(),
        "searchMaxRetries": config.shopify.search_max_retries,
        "appProxySignature": config.app_proxy_secret.is_some(),
        "allowedOrigins": config.allowed_origins,
        "sentry": config.sentry_dsn.is_some(),
    }))
}
