//! x402 payment-gate protocol core for EVM networks.
//!
//! Implements HTTP 402 pay-per-request using EIP-712 signed transfer
//! authorizations. A resource server answers unpaid requests with a 402
//! challenge listing [`PaymentRequirements`]; the client signs an
//! authorization bound to one requirement and retries; a facilitator
//! verifies and settles the payment before the resource is served.
//!
//! # Three-party model
//!
//! - **Client** — signs payment authorizations (see the `x402-client` crate)
//! - **Server** — gates endpoints, returns 402 with pricing (see the
//!   `x402-server` crate)
//! - **Facilitator** — external settlement authority, reached through the
//!   [`Facilitator`] contract in this crate
//!
//! This crate holds everything both sides agree on: the wire data model,
//! strict encode/decode, the EIP-712 authorization and its verification
//! helpers, the scheme traits, and the facilitator interface.

// Protocol core
pub mod constants;
pub mod error;
pub mod facilitator;
pub mod hmac;
pub mod payment;
pub mod response;
pub mod scheme;
pub mod security;

// "exact" scheme over EIP-712
pub mod eip712;
pub mod scheme_server;

use alloy::sol;

// EIP-712 struct for payment authorizations.
// The sol! macro derives SolStruct which provides eip712_signing_hash().
sol! {
    #[derive(Debug, serde::Serialize, serde::Deserialize)]
    struct PaymentAuthorization {
        address from;
        address to;
        uint256 value;
        address token;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
}

// Re-exports
pub use constants::ChainConfig;
pub use constants::*;
pub use error::X402Error;
pub use facilitator::{Facilitator, FacilitatorError, RemoteFacilitator};
pub use payment::*;
pub use response::*;
pub use scheme::*;

pub use scheme_server::ExactSchemeServer;
