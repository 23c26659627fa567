pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod state;
pub mod thoughts;
