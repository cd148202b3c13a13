pub mod analyzers;
pub mod assemble;
pub mod config;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod parser;
pub mod reading;
pub mod report;
pub mod services;
pub mod session;
