//! `sync` and `show` commands.

use archetype_sync::{
    AppState, SyncConfig, SyncError,
    shopify::{CustomerRecord, ShopifyClient},
    sync::{SyncPayload, SyncRequest, SyncResponse, pick_match},
};
use archetype_sync_core::Email;

use super::{CliError, print_json};

/// Run one sync and print the success body.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the sync fails; a
/// failed sync prints the same `{ error, details }` body the endpoint would.
pub async fn run(payload: SyncPayload) -> Result<(), CliError> {
    let config = SyncConfig::from_env()?;
    let request = SyncRequest::from_payload(payload)?;
    let state = AppState::from_config(config)?;

    match state.sync_service().sync(&request).await {
        Ok(outcome) => {
            tracing::info!(
                customer_id = %outcome.customer_id,
                created = outcome.created,
                "Sync complete"
            );
            print_json(&SyncResponse::from(outcome))
        }
        Err(e) => {
            print_json(&e.body())?;
            Err(e.into())
        }
    }
}

/// Print the archetype metafield of the customer with this email.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the email is malformed,
/// no customer matches, or a Shopify call fails.
pub async fn show(email: &str) -> Result<(), CliError> {
    let config = SyncConfig::from_env()?;
    let email = Email::parse(email).map_err(|e| CliError::InvalidEmail(e.to_string()))?;
    let client = ShopifyClient::new(&config.shopify)?;

    let matches = client.search_customers_by_email(&email).await?;
    let customer = select_customer(matches, &email)?;

    let metafield = client
        .get_customer_metafield(&customer.id, &config.metafield)
        .await?;

    print_json(&serde_json::json!({
        "customerId": customer.id,
        "email": customer.email,
        "metafield": metafield,
    }))
}

/// Pick the customer the service would sync for this email.
fn select_customer(matches: Vec<CustomerRecord>, email: &Email) -> Result<CustomerRecord, SyncError> {
    pick_match(matches, email.as_str())
        .ok_or_else(|| SyncError::NotFound(format!("No customer with email {email}.")))
}
