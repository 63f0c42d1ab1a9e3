pub mod client;
pub mod models;
pub mod signing;

pub use client::IyzicoClient;
