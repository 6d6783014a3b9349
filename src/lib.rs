pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod session;
pub mod store;
