//! x402 resource server — gates HTTP endpoints behind 402 payments.
//!
//! Provides the payment-gate state machine as a plain async function
//! ([`require_payment`](middleware::require_payment)) consumable from any
//! actix-web handler: it intercepts requests to priced routes, returns 402
//! with [`PaymentRequirements`](x402::PaymentRequirements) when no valid
//! payment is attached, and settles payments through a
//! [`Facilitator`](x402::Facilitator) before the resource is served.
//!
//! # Modules
//!
//! - [`config`] — price configuration and route registration
//!   ([`PaymentConfigBuilder`](config::PaymentConfigBuilder))
//! - [`middleware`] — the gate itself ([`require_payment`](middleware::require_payment))
//! - [`replay`] — optional in-process spent-nonce guard
//! - [`metrics`] — Prometheus counters for request and payment tracking

pub mod config;
pub mod metrics;
pub mod middleware;
pub mod replay;

pub use config::{PaymentConfig, PaymentConfigBuilder, PaymentGateConfig, RoutePaymentConfig};
pub use middleware::{check_payment_gate, payment_required_body, rejection_body, require_payment};
pub use replay::{InMemoryNonceStore, NonceStore};
