//! Conversions from generated GraphQL types to domain types.

use super::queries::{get_customer_metafield, metafields_set};
use crate::shopify::types::{FieldError, Metafield, MetafieldsSetResult};

pub(super) fn convert_metafields_set(
    payload: metafields_set::MetafieldsSetMetafieldsSet,
) -> MetafieldsSetResult {
    MetafieldsSetResult {
        metafields: payload
            .metafields
            .unwrap_or_default()
            .into_iter()
            .map(|m| Metafield {
                id: Some(m.id),
                namespace: m.namespace,
                key: m.key,
                value: m.value,
                type_: m.type_,
            })
            .collect(),
        user_errors: payload
            .user_errors
            .into_iter()
            .map(|e| FieldError {
                field: e.field.unwrap_or_default(),
                message: e.message,
                code: e.code.as_ref().and_then(error_code_name),
                element_index: e.element_index,
            })
            .collect(),
    }
}

/// Wire name of a user error code, unknown codes included.
fn error_code_name(code: &metafields_set::MetafieldsSetUserErrorCode) -> Option<String> {
    serde_json::to_value(code)
        .ok()
        .and_then(|value| value.as_str().map(ToString::to_string))
}

pub(super) fn convert_customer_metafield(
    m: get_customer_metafield::GetCustomerMetafieldCustomerMetafield,
) -> Metafield {
    Metafield {
        id: Some(m.id),
        namespace: m.namespace,
        key: m.key,
        value: m.value,
        type_: m.type_,
    }
}
