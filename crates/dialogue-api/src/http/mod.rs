//! HTTP layer for both services.
//!
//! The orchestrator serves the sidecar's subscription endpoints plus the
//! live conversation feed; the generator serves `POST /generate`.

pub mod error;
pub mod handlers;
pub mod router;
