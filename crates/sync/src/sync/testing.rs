//! In-memory customer directory for pipeline and route tests.

use std::sync::Mutex;

use archetype_sync_core::{CustomerId, Email};
use async_trait::async_trait;

use super::CustomerDirectory;
use crate::shopify::{
    CustomerRecord, FieldError, MetafieldInput, MetafieldsSetResult, NewCustomer, ShopifyError,
};

/// Records every call and answers from in-memory state.
#[derive(Default)]
pub struct FakeDirectory {
    pub customers: Mutex<Vec<CustomerRecord>>,
    pub searches: Mutex<Vec<String>>,
    pub creates: Mutex<Vec<NewCustomer>>,
    pub mutations: Mutex<Vec<(CustomerId, MetafieldInput)>>,
    pub fail_search: Option<u16>,
    pub fail_create: Option<u16>,
    pub user_errors: Vec<FieldError>,
    /// Echo the metafield from the mutation (otherwise return none)
    pub echo_metafield: bool,
}

#[allow(clippy::unwrap_used)]
impl FakeDirectory {
    pub fn new() -> Self {
        Self {
            echo_metafield: true,
            ..Self::default()
        }
    }

    pub fn with_customer(self, id: u64, email: &str) -> Self {
        self.customers.lock().unwrap().push(CustomerRecord {
            id: CustomerId::from(id),
            email: Some(email.to_string()),
            first_name: None,
            last_name: None,
            phone: None,
        });
        self
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    pub fn create_count(&self) -> usize {
        self.creates.lock().unwrap().len()
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.lock().unwrap().len()
    }

    pub fn last_mutation(&self) -> Option<(CustomerId, MetafieldInput)> {
        self.mutations.lock().unwrap().last().cloned()
    }
}

#[async_trait]
#[allow(clippy::unwrap_used)]
impl CustomerDirectory for FakeDirectory {
    async fn find_customers_by_email(
        &self,
        email: &Email,
    ) -> Result<Vec<CustomerRecord>, ShopifyError> {
        self.searches.lock().unwrap().push(email.to_string());

        if let Some(status) = self.fail_search {
            return Err(ShopifyError::Status {
                status,
                body: "search unavailable".to_string(),
            });
        }

        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                c.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email.as_str()))
            })
            .cloned()
            .collect())
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<CustomerRecord, ShopifyError> {
        self.creates.lock().unwrap().push(customer.clone());

        if let Some(status) = self.fail_create {
            return Err(ShopifyError::Status {
                status,
                body: r#"{"errors":{"phone":["has already been taken"]}}"#.to_string(),
            });
        }

        let mut customers = self.customers.lock().unwrap();
        let record = CustomerRecord {
            id: CustomerId::from(1000 + customers.len() as u64),
            email: Some(customer.email.to_string()),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            phone: customer.phone.clone(),
        };
        customers.push(record.clone());
        Ok(record)
    }

    async fn set_metafield(
        &self,
        owner: &CustomerId,
        input: &MetafieldInput,
    ) -> Result<MetafieldsSetResult, ShopifyError> {
        self.mutations
            .lock()
            .unwrap()
            .push((owner.clone(), input.clone()));

        if !self.user_errors.is_empty() {
            return Ok(MetafieldsSetResult {
                metafields: vec![],
                user_errors: self.user_errors.clone(),
            });
        }

        let metafields = if self.echo_metafield {
            let mut metafield = input.to_metafield();
            metafield.id = Some("gid://shopify/Metafield/1".to_string());
            vec![metafield]
        } else {
            vec![]
        };

        Ok(MetafieldsSetResult {
            metafields,
            user_errors: vec![],
        })
    }
}
