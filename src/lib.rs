pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logger;
pub mod membership;
pub mod model;
pub mod poller;
pub mod routes;
pub mod wait;

pub use error::{Error, Result};
