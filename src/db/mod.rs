pub mod connection;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;
