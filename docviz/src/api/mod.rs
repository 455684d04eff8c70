//! HTTP surface for the visualization service

pub mod routes;
pub mod server;

pub use server::ApiServer;
