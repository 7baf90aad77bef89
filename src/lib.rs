// Library exports for Parse
// This allows integration tests and external code to use Parse modules

pub mod accounts;
pub mod actions;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod posts;
pub mod routes;
pub mod state;
pub mod validation;
