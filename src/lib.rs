pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod identity;
pub mod pipeline;
