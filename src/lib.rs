#![doc = "The `workboard` library crate."]
#![doc = ""]
#![doc = "Project and task management over a JSON API: JWT sessions with a revocation"]
#![doc = "ledger, role-based authorization, password reset, notifications, metrics and"]
#![doc = "PDF reports. The binary (`main.rs`) builds the actix `App` from these modules."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod mailer;
pub mod models;
pub mod reports;
pub mod routes;
pub mod services;
pub mod state;
