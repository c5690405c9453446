//! Sidecar HTTP API wire types.

use serde::Serialize;

use dialogue_core::sidecar::StateOperation;

/// One element of a bulk state save body.
#[derive(Debug, Serialize)]
pub struct StateItem<'a> {
    pub key: &'a str,
    pub value: &'a serde_json::Value,
}

/// Body of `POST /v1.0/state/{store}/transaction`.
#[derive(Debug, Serialize)]
pub struct TransactionRequest<'a> {
    pub operations: Vec<TransactionOperation<'a>>,
}

#[derive(Debug, Serialize)]
pub struct TransactionOperation<'a> {
    pub operation: &'static str,
    pub request: TransactionItem<'a>,
}

#[derive(Debug, Serialize)]
pub struct TransactionItem<'a> {
    pub key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'a serde_json::Value>,
}

impl<'a> TransactionRequest<'a> {
    pub fn from_operations(operations: &'a [StateOperation]) -> Self {
        let operations = operations
            .iter()
            .map(|op| match op {
                StateOperation::Upsert { key, value } => TransactionOperation {
                    operation: "upsert",
                    request: TransactionItem {
                        key,
                        value: Some(value),
                    },
                },
                StateOperation::Delete { key } => TransactionOperation {
                    operation: "delete",
                    request: TransactionItem { key, value: None },
                },
            })
            .collect();
        Self { operations }
    }
}
