use thiserror::Error;

/// Errors surfaced by the client payment agent.
///
/// Each variant names a distinct failure class so callers can decide
/// remediation: fund the wallet on a rejection, switch networks on an
/// unsupported method, alert on facilitator outages.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The 402 body did not decode to a non-empty requirements list.
    #[error("malformed challenge: {0}")]
    MalformedChallenge(String),

    /// No offered requirement matches a supported scheme/network.
    #[error("no supported payment method: {0}")]
    UnsupportedPaymentMethod(String),

    /// The signer capability errored (key unavailable, bad amount, ...).
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// The server declined the payment; the retry is not repeated.
    #[error("payment rejected: {0}")]
    PaymentRejected(String),

    /// A receipt header was present but did not parse.
    #[error("malformed settlement receipt: {0}")]
    MalformedReceipt(String),

    /// The HTTP exchange exceeded its bounded timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The server could not reach its facilitator (infra failure,
    /// distinct from payment denial).
    #[error("facilitator unavailable (server returned {status})")]
    FacilitatorUnavailable { status: u16 },

    /// Any other transport failure.
    #[error("http error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AgentError::Timeout(e.to_string())
        } else {
            AgentError::Http(e.to_string())
        }
    }
}
