pub mod connection;
pub mod import;
pub mod schema;
