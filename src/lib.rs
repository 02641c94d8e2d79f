pub mod api;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod models;
pub mod reset;
pub mod sql;
