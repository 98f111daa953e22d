//! Storage-backed operations. Route handlers validate input, check roles and
//! delegate here; every function takes the pool (or `AppState`) explicitly.

pub mod auth;
pub mod comments;
pub mod metrics;
pub mod notifications;
pub mod projects;
pub mod revocation;
pub mod tasks;
pub mod users;
