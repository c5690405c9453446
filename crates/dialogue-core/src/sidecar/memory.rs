//! In-process sidecar double for tests.
//!
//! `InMemorySidecar` implements every sidecar port over shared maps. Clones
//! share state, so a test can hand one clone to the code under test and
//! inspect another. Failure switches make each building block error on
//! demand.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use dialogue_types::error::SidecarError;

use super::{Invoker, Publisher, StateOperation, StateStore};

/// A recorded service invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub app_id: String,
    pub method: String,
    pub payload: serde_json::Value,
}

#[derive(Default)]
struct Inner {
    state: Mutex<HashMap<String, serde_json::Value>>,
    published: Mutex<Vec<(String, serde_json::Value)>>,
    invocations: Mutex<Vec<Invocation>>,
    invoke_reply: Mutex<String>,
    transactions: Mutex<usize>,
    fail_state: AtomicBool,
    fail_writes: AtomicBool,
    fail_publish: AtomicBool,
    fail_invoke: AtomicBool,
    no_transactions: AtomicBool,
}

/// Shared-state sidecar double.
#[derive(Clone, Default)]
pub struct InMemorySidecar {
    inner: Arc<Inner>,
}

fn injected(what: &str) -> SidecarError {
    SidecarError::Status {
        status: 500,
        body: format!("injected {what} failure"),
    }
}

impl InMemorySidecar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw state value.
    pub fn put(&self, key: &str, value: serde_json::Value) {
        self.inner
            .state
            .lock()
            .unwrap()
            .insert(key.to_string(), value);
    }

    /// Read a raw state value.
    pub fn value(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.state.lock().unwrap().get(key).cloned()
    }

    /// Every `(topic, payload)` published so far, in order.
    pub fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.inner.published.lock().unwrap().clone()
    }

    /// Every invocation made so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.inner.invocations.lock().unwrap().clone()
    }

    /// Number of committed transactions.
    pub fn transaction_count(&self) -> usize {
        *self.inner.transactions.lock().unwrap()
    }

    /// Body returned by subsequent invocations.
    pub fn set_invoke_reply(&self, body: &str) {
        *self.inner.invoke_reply.lock().unwrap() = body.to_string();
    }

    pub fn fail_state(&self, fail: bool) {
        self.inner.fail_state.store(fail, Ordering::SeqCst);
    }

    /// Fail state writes (save, delete, transact) while reads still work.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_publish(&self, fail: bool) {
        self.inner.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub fn fail_invoke(&self, fail: bool) {
        self.inner.fail_invoke.store(fail, Ordering::SeqCst);
    }

    /// Reject transactions, like a state store without transaction support.
    pub fn disable_transactions(&self, disabled: bool) {
        self.inner.no_transactions.store(disabled, Ordering::SeqCst);
    }

    fn check_state(&self) -> Result<(), SidecarError> {
        if self.inner.fail_state.load(Ordering::SeqCst) {
            return Err(injected("state"));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), SidecarError> {
        self.check_state()?;
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(injected("state write"));
        }
        Ok(())
    }
}

impl StateStore for InMemorySidecar {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, SidecarError> {
        self.check_state()?;
        Ok(self.value(key))
    }

    async fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), SidecarError> {
        self.check_write()?;
        self.put(key, value.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SidecarError> {
        self.check_write()?;
        self.inner.state.lock().unwrap().remove(key);
        Ok(())
    }

    async fn transact(&self, operations: &[StateOperation]) -> Result<(), SidecarError> {
        self.check_write()?;
        if self.inner.no_transactions.load(Ordering::SeqCst) {
            return Err(SidecarError::Status {
                status: 500,
                body: "state store does not support transactions".to_string(),
            });
        }
        let mut state = self.inner.state.lock().unwrap();
        for op in operations {
            match op {
                StateOperation::Upsert { key, value } => {
                    state.insert(key.clone(), value.clone());
                }
                StateOperation::Delete { key } => {
                    state.remove(key);
                }
            }
        }
        *self.inner.transactions.lock().unwrap() += 1;
        Ok(())
    }
}

impl Publisher for InMemorySidecar {
    async fn publish(&self, topic: &str, payload: &serde_json::Value) -> Result<(), SidecarError> {
        if self.inner.fail_publish.load(Ordering::SeqCst) {
            return Err(injected("publish"));
        }
        self.inner
            .published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.clone()));
        Ok(())
    }
}

impl Invoker for InMemorySidecar {
    async fn invoke(
        &self,
        app_id: &str,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<String, SidecarError> {
        if self.inner.fail_invoke.load(Ordering::SeqCst) {
            return Err(injected("invoke"));
        }
        self.inner.invocations.lock().unwrap().push(Invocation {
            app_id: app_id.to_string(),
            method: method.to_string(),
            payload: payload.clone(),
        });
        Ok(self.inner.invoke_reply.lock().unwrap().clone())
    }
}
