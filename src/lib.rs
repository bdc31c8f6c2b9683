pub mod auth;
pub mod config;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
