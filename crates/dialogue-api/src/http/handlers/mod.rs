//! Request handlers.

pub mod feed;
pub mod generate;
pub mod health;
pub mod pubsub;
