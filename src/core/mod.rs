pub mod config;
pub mod engine;
pub mod error;
pub mod finding;
pub mod outcome;
pub mod selector;
pub mod session;
pub mod store;
