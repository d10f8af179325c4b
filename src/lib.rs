// Library exports for the service instance logs client

pub mod cli;
pub mod client;
pub mod config;
pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod logs;
pub mod stream;
pub mod transport;
