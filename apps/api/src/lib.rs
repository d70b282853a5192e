//! Mirai resume service: resume builder API, PDF export and user provisioning.

pub mod builder;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod identity;
pub mod models;
pub mod resume;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
