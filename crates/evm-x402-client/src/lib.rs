//! x402 client agent for making paid API requests.
//!
//! Handles the HTTP 402 payment flow automatically: request -> 402 ->
//! select requirement -> sign -> retry once -> extract receipt. Exactly
//! one authorization is signed per logical call, and a second challenge
//! after paying is terminal.
//!
//! # Quick example
//!
//! ```no_run
//! use alloy::signers::local::PrivateKeySigner;
//! use x402_client::{ExactSchemeClient, LocalKeySigner, X402Client};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let key: PrivateKeySigner = "0xYOUR_KEY".parse().unwrap();
//! let client = X402Client::new(ExactSchemeClient::new(LocalKeySigner::new(key)));
//!
//! let (resp, receipt) = client
//!     .fetch("https://api.example.com/fortune", reqwest::Method::GET)
//!     .await
//!     .unwrap();
//!
//! if let Some(r) = receipt {
//!     println!("paid via tx: {}", r.transaction);
//! }
//! # }
//! ```

mod agent;
mod error;
mod scheme_client;

pub use agent::{parse_challenge, select_requirements, X402Client};
pub use error::AgentError;
pub use scheme_client::{ExactSchemeClient, LocalKeySigner};

// Re-export commonly needed types from core
pub use x402::{
    ChainConfig, PaymentPayload, PaymentRequiredBody, PaymentRequirements, SchemeClient,
    SettlementReceipt, X402Error, DEFAULT_TOKEN, NETWORK, SCHEME_NAME,
};
