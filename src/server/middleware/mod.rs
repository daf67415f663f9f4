pub mod auth;
pub mod connection;
