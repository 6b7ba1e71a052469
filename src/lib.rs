pub mod app_error;
pub mod app_state;
pub mod bootstrap;
pub mod cache;
pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod schema;
pub mod stores;
pub mod swagger;
