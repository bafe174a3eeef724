pub mod api;
pub mod auth;
pub mod authz;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod routes;
pub mod state;

#[cfg(test)]
pub mod testing;
