//! Trait seams for the three-party payment model.
//!
//! - [`AuthorizationSigner`] — the signing capability: produces a signature
//!   over a [`PaymentAuthorization`](crate::PaymentAuthorization)
//! - [`SchemeClient`] — client-side: selects requirements it can satisfy
//!   and creates signed payment payloads
//! - [`SchemeServer`] — server-side: parses prices into on-chain amounts
//! - [`Facilitator`](crate::Facilitator) — the settlement contract, defined
//!   in [`crate::facilitator`]

use crate::constants::ChainConfig;
use crate::error::X402Error;
use crate::payment::{PaymentPayload, PaymentRequirements};
use crate::PaymentAuthorization;
use alloy::primitives::Address;

/// Signing capability over a payment authorization.
///
/// The protocol core only ever sees this trait, so alternative backends
/// (hardware key, remote signer) can be substituted for the local key
/// implementation without touching the payment flow.
pub trait AuthorizationSigner: Send + Sync {
    /// The signer's on-chain identity. Becomes the payload's `from` field.
    fn address(&self) -> Address;

    /// Sign the EIP-712 hash of `auth` under `config`'s domain.
    /// Returns the hex-encoded 65-byte signature.
    fn sign_authorization(
        &self,
        auth: &PaymentAuthorization,
        config: &ChainConfig,
    ) -> Result<String, X402Error>;
}

/// Client-side scheme: creates signed payment payloads.
pub trait SchemeClient: Send + Sync {
    /// Whether this scheme client can satisfy the given requirement
    /// (scheme and network both match).
    fn supports(&self, requirements: &PaymentRequirements) -> bool;

    /// Create a signed payment payload bound to the given requirements.
    fn create_payment_payload(
        &self,
        x402_version: u32,
        requirements: &PaymentRequirements,
    ) -> impl std::future::Future<Output = Result<PaymentPayload, X402Error>> + Send;
}

/// Server-side scheme: parses prices into on-chain amounts.
pub trait SchemeServer: Send + Sync {
    /// Parse a human-readable price string (e.g. "$0.01") into an amount
    /// in the asset's smallest unit and the asset address.
    fn parse_price(&self, price: &str) -> Result<(String, Address), X402Error>;
}
