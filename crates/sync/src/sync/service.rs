//! Find-or-create followed by the metafield write.

use std::sync::Arc;

use archetype_sync_core::{CustomerId, Email, MetafieldKey};
use serde::Serialize;
use tracing::instrument;

use super::{CustomerDirectory, SyncRequest};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncStage};
use crate::shopify::{
    CustomerRecord, Metafield, MetafieldInput, MetafieldsSetResult, ShopifyError,
};

/// Behavior knobs for [`SyncService`].
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Metafield the archetype is written to.
    pub metafield: MetafieldKey,
    /// Create unknown customers instead of answering 404.
    pub create_missing_customers: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            metafield: MetafieldKey::default(),
            create_missing_customers: true,
        }
    }
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            metafield: config.metafield.clone(),
            create_missing_customers: config.create_missing_customers,
        }
    }
}

/// Result of a successful sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// The customer the metafield was written to.
    pub customer_id: CustomerId,
    /// Whether the customer was created by this request.
    pub created: bool,
    /// The metafield as echoed by the platform.
    pub metafield: Metafield,
}

/// Success body: `{ ok, customerId, metafield }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// Always `true`.
    pub ok: bool,
    /// Customer ID, as a string.
    pub customer_id: CustomerId,
    /// The metafield as echoed by the platform.
    pub metafield: Metafield,
}

impl From<SyncOutcome> for SyncResponse {
    fn from(outcome: SyncOutcome) -> Self {
        Self {
            ok: true,
            customer_id: outcome.customer_id,
            metafield: outcome.metafield,
        }
    }
}

/// Runs the sync pipeline against a [`CustomerDirectory`].
#[derive(Clone)]
pub struct SyncService {
    directory: Arc<dyn CustomerDirectory>,
    settings: SyncSettings,
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl SyncService {
    /// Create a service over a customer directory.
    #[must_use]
    pub fn new(directory: Arc<dyn CustomerDirectory>, settings: SyncSettings) -> Self {
        Self {
            directory,
            settings,
        }
    }

    /// Find or create the customer, then store the archetype.
    ///
    /// The search is the only call that may be retried (inside the
    /// directory). Creation and the mutation are attempted once each, and
    /// nothing is written after a failed step.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no customer matches and creation is disabled
    /// - `Upstream` if the search, the create, or the mutation fails
    /// - `Validation` if the mutation reports user errors (all of them)
    #[instrument(
        skip(self, request),
        fields(email = %request.email, archetype = %request.archetype)
    )]
    pub async fn sync(&self, request: &SyncRequest) -> Result<SyncOutcome, SyncError> {
        let (customer_id, created) = self.resolve_customer(request).await?;

        let input = MetafieldInput::text(self.settings.metafield.clone(), request.archetype.as_str());

        let result = self
            .directory
            .set_metafield(&customer_id, &input)
            .await
            .map_err(stage_failed(&request.email, SyncStage::SetMetafield))?;

        if !result.user_errors.is_empty() {
            tracing::warn!(
                email = %request.email,
                stage = %SyncStage::SetMetafield,
                customer_id = %customer_id,
                user_errors = result.user_errors.len(),
                "Metafield rejected"
            );
        }

        let metafield = echoed_metafield(result, &input)?;

        tracing::info!(
            customer_id = %customer_id,
            created,
            metafield = %self.settings.metafield,
            "Archetype synced"
        );

        Ok(SyncOutcome {
            customer_id,
            created,
            metafield,
        })
    }

    async fn resolve_customer(&self, request: &SyncRequest) -> Result<(CustomerId, bool), SyncError> {
        let matches = self
            .directory
            .find_customers_by_email(&request.email)
            .await
            .map_err(stage_failed(&request.email, SyncStage::Search))?;

        if let Some(customer) = pick_match(matches, request.email.as_str()) {
            tracing::debug!(
                email = %request.email,
                stage = %SyncStage::Search,
                customer_id = %customer.id,
                "Existing customer found"
            );
            return Ok((customer.id, false));
        }

        if !self.settings.create_missing_customers {
            tracing::warn!(
                email = %request.email,
                stage = %SyncStage::Search,
                "No customer found and creation is disabled"
            );
            return Err(SyncError::NotFound(format!(
                "No customer with email {}.",
                request.email
            )));
        }

        let customer = self
            .directory
            .create_customer(&request.new_customer())
            .await
            .map_err(stage_failed(&request.email, SyncStage::Create))?;

        tracing::info!(
            email = %request.email,
            stage = %SyncStage::Create,
            customer_id = %customer.id,
            "Customer created"
        );

        Ok((customer.id, true))
    }
}

/// Log a failed Shopify call with its email and stage, then wrap it.
fn stage_failed(email: &Email, stage: SyncStage) -> impl FnOnce(ShopifyError) -> SyncError + '_ {
    move |e| {
        tracing::error!(email = %email, stage = %stage, error = %e, "Shopify call failed");
        SyncError::upstream(stage, e)
    }
}

/// Prefer an exact (case-insensitive) email match; otherwise take the
/// platform's first result.
#[must_use]
pub fn pick_match(matches: Vec<CustomerRecord>, email: &str) -> Option<CustomerRecord> {
    let exact = matches.iter().position(|c| {
        c.email
            .as_deref()
            .is_some_and(|e| e.trim().eq_ignore_ascii_case(email))
    });

    match exact {
        Some(index) => matches.into_iter().nth(index),
        None => matches.into_iter().next(),
    }
}

fn echoed_metafield(result: MetafieldsSetResult, input: &MetafieldInput) -> Result<Metafield, SyncError> {
    if !result.user_errors.is_empty() {
        return Err(SyncError::Validation(result.user_errors));
    }

    let target = &input.target;
    let mut metafields = result.metafields;

    let position = metafields
        .iter()
        .position(|m| m.namespace == target.namespace() && m.key == target.key());

    Ok(match position {
        Some(index) => metafields.swap_remove(index),
        None if !metafields.is_empty() => metafields.swap_remove(0),
        None => input.to_metafield(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shopify::FieldError;
    use crate::sync::testing::FakeDirectory;

    fn service(directory: &Arc<FakeDirectory>) -> SyncService {
        SyncService::new(directory.clone(), SyncSettings::default())
    }

    fn request(body: &str) -> SyncRequest {
        SyncRequest::from_json(body.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_existing_customer_gets_metafield() {
        let directory = Arc::new(FakeDirectory::new().with_customer(42, "ada@example.com"));

        let outcome = service(&directory)
            .sync(&request(r#"{"email": "ada@example.com", "archetype": "Visionary"}"#))
            .await
            .unwrap();

        assert_eq!(outcome.customer_id.as_str(), "42");
        assert!(!outcome.created);
        assert_eq!(outcome.metafield.value, "Visionary");
        assert_eq!(outcome.metafield.namespace, "dearmykelexperience");
        assert_eq!(outcome.metafield.key, "archetype");
        assert_eq!(directory.create_count(), 0);
        assert_eq!(directory.mutation_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_email_creates_customer() {
        let directory = Arc::new(FakeDirectory::new());

        let outcome = service(&directory)
            .sync(&request(
                r#"{"email": "new@example.com", "archetype": "Sage", "first_name": "Nia"}"#,
            ))
            .await
            .unwrap();

        assert!(outcome.created);
        let created = directory.creates.lock().unwrap()[0].clone();
        assert_eq!(created.email.as_str(), "new@example.com");
        assert_eq!(created.first_name.as_deref(), Some("Nia"));

        let (owner, _) = directory.last_mutation().unwrap();
        assert_eq!(owner, outcome.customer_id);
    }

    #[tokio::test]
    async fn test_repeated_sync_creates_at_most_once() {
        let directory = Arc::new(FakeDirectory::new());
        let service = service(&directory);
        let body = r#"{"email": "repeat@example.com", "archetype": "Sage"}"#;

        let first = service.sync(&request(body)).await.unwrap();
        let second = service.sync(&request(body)).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.customer_id, second.customer_id);
        assert_eq!(directory.create_count(), 1);
        assert_eq!(directory.mutation_count(), 2);
    }

    #[tokio::test]
    async fn test_blank_archetype_stores_unknown() {
        let directory = Arc::new(FakeDirectory::new().with_customer(7, "a@example.com"));

        service(&directory)
            .sync(&request(r#"{"email": "a@example.com", "archetype": ""}"#))
            .await
            .unwrap();

        let (_, input) = directory.last_mutation().unwrap();
        assert_eq!(input.value, "Unknown");
        assert_eq!(input.kind.as_str(), "single_line_text_field");
    }

    #[tokio::test]
    async fn test_value_sent_unmodified() {
        let directory = Arc::new(FakeDirectory::new().with_customer(7, "a@example.com"));
        let hostile = "O'Brien \"The\" Seer\nline two \\ } mutation {";
        let body = serde_json::json!({"email": "a@example.com", "archetype": hostile}).to_string();

        let outcome = service(&directory).sync(&request(&body)).await.unwrap();

        let (_, input) = directory.last_mutation().unwrap();
        assert_eq!(input.value, hostile);
        assert_eq!(outcome.metafield.value, hostile);
    }

    #[tokio::test]
    async fn test_find_or_404_mode() {
        let directory = Arc::new(FakeDirectory::new());
        let service = SyncService::new(
            directory.clone(),
            SyncSettings {
                create_missing_customers: false,
                ..SyncSettings::default()
            },
        );

        let err = service
            .sync(&request(r#"{"email": "ghost@example.com"}"#))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::NotFound(_)));
        assert_eq!(directory.create_count(), 0);
        assert_eq!(directory.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_search_failure_stops_pipeline() {
        let directory = Arc::new(FakeDirectory {
            fail_search: Some(503),
            ..FakeDirectory::new()
        });

        let err = service(&directory)
            .sync(&request(r#"{"email": "a@example.com"}"#))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Upstream {
                stage: SyncStage::Search,
                ..
            }
        ));
        assert_eq!(directory.create_count(), 0);
        assert_eq!(directory.mutation_count(), 0);
    }

    /// Captures formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn line_containing(&self, needle: &str) -> Option<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .find(|line| line.contains(needle))
                .map(ToString::to_string)
        }
    }

    #[tokio::test]
    async fn test_stage_failures_logged_with_email_and_stage() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let search_down = Arc::new(FakeDirectory {
            fail_search: Some(503),
            ..FakeDirectory::new()
        });
        service(&search_down)
            .sync(&request(r#"{"email": "ada@example.com"}"#))
            .await
            .unwrap_err();

        let line = logs.line_containing("Shopify call failed").unwrap();
        assert!(line.contains("ERROR"), "{line}");
        assert!(line.contains("email=ada@example.com"), "{line}");
        assert!(line.contains("stage=search"), "{line}");
        assert!(line.contains("503"), "{line}");

        let create_down = Arc::new(FakeDirectory {
            fail_create: Some(422),
            ..FakeDirectory::new()
        });
        service(&create_down)
            .sync(&request(r#"{"email": "nia@example.com"}"#))
            .await
            .unwrap_err();

        let line = logs.line_containing("stage=create").unwrap();
        assert!(line.contains("email=nia@example.com"), "{line}");
        assert!(line.contains("has already been taken"), "{line}");
    }

    #[tokio::test]
    async fn test_create_failure_skips_mutation() {
        let directory = Arc::new(FakeDirectory {
            fail_create: Some(422),
            ..FakeDirectory::new()
        });

        let err = service(&directory)
            .sync(&request(r#"{"email": "a@example.com", "phone": "+15550000000"}"#))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Upstream {
                stage: SyncStage::Create,
                ..
            }
        ));
        assert!(err.to_string().contains("has already been taken"));
        assert_eq!(directory.create_count(), 1);
        assert_eq!(directory.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_user_errors_reported_in_full() {
        let errors = vec![
            FieldError {
                field: vec!["metafields".into(), "0".into(), "value".into()],
                message: "is too long".into(),
                code: Some("INVALID_VALUE".into()),
                element_index: Some(0),
            },
            FieldError {
                field: vec!["metafields".into(), "0".into(), "type".into()],
                message: "is invalid".into(),
                code: Some("INVALID_TYPE".into()),
                element_index: Some(0),
            },
        ];
        let directory = Arc::new(FakeDirectory {
            user_errors: errors.clone(),
            ..FakeDirectory::new().with_customer(7, "a@example.com")
        });

        let err = service(&directory)
            .sync(&request(r#"{"email": "a@example.com"}"#))
            .await
            .unwrap_err();

        match err {
            SyncError::Validation(reported) => assert_eq!(reported, errors),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_echo_falls_back_to_input() {
        let directory = Arc::new(FakeDirectory {
            echo_metafield: false,
            ..FakeDirectory::new().with_customer(7, "a@example.com")
        });

        let outcome = service(&directory)
            .sync(&request(r#"{"email": "a@example.com", "archetype": "Sage"}"#))
            .await
            .unwrap();

        assert_eq!(outcome.metafield.value, "Sage");
        assert!(outcome.metafield.id.is_none());
    }

    #[test]
    fn test_pick_match_prefers_exact_email() {
        let record = |id: u64, email: &str| CustomerRecord {
            id: CustomerId::from(id),
            email: Some(email.to_string()),
            first_name: None,
            last_name: None,
            phone: None,
        };

        let picked = pick_match(
            vec![record(1, "ada+old@example.com"), record(2, "ADA@example.com")],
            "ada@example.com",
        )
        .unwrap();
        assert_eq!(picked.id.as_str(), "2");

        let picked = pick_match(vec![record(3, "other@example.com")], "ada@example.com").unwrap();
        assert_eq!(picked.id.as_str(), "3");

        assert!(pick_match(vec![], "ada@example.com").is_none());
    }

    #[test]
    fn test_response_shape() {
        let response = SyncResponse::from(SyncOutcome {
            customer_id: CustomerId::from(42),
            created: true,
            metafield: MetafieldInput::text(MetafieldKey::default(), "Sage").to_metafield(),
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["customerId"], "42");
        assert_eq!(json["metafield"]["value"], "Sage");
        assert!(json.get("created").is_none());
    }
}
