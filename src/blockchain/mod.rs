// src/blockchain/mod.rs

pub mod client;
pub use client::{HiveApi, HiveClient};

pub mod encoding;
pub mod keys;
pub mod memo;
pub mod models;
pub mod operations;
pub mod transaction;

// Re-export commonly used types
pub use keys::{PrivateKey, PublicKey, Signature};
pub use models::HiveError;
