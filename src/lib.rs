pub mod batch;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod report;
pub mod scanner;
pub mod session;
