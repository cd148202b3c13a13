pub mod client;

pub use client::AirServiceClient;
