use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;

use x402::{
    eip712, AuthorizationSigner, ChainConfig, ExactPaymentData, PaymentAuthorization,
    PaymentPayload, PaymentRequirements, SchemeClient, X402Error,
};

/// Local private-key signing backend.
///
/// Wraps an in-process secp256k1 key. Alternative backends (hardware key,
/// remote signer) implement [`AuthorizationSigner`] the same way and drop
/// in without touching the payment flow.
pub struct LocalKeySigner {
    inner: PrivateKeySigner,
}

impl LocalKeySigner {
    pub fn new(inner: PrivateKeySigner) -> Self {
        Self { inner }
    }

    /// Parse a hex private key (with or without 0x prefix).
    /// The key material is never logged.
    pub fn from_hex(key: &str) -> Result<Self, X402Error> {
        let inner: PrivateKeySigner = key
            .parse()
            .map_err(|_| X402Error::ConfigError("invalid private key".to_string()))?;
        Ok(Self { inner })
    }
}

impl AuthorizationSigner for LocalKeySigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn sign_authorization(
        &self,
        auth: &PaymentAuthorization,
        config: &ChainConfig,
    ) -> Result<String, X402Error> {
        let hash = eip712::signing_hash(auth, config);
        let sig = self
            .inner
            .sign_hash_sync(&hash)
            .map_err(|e| X402Error::SignatureError(format!("signing failed: {e}")))?;
        Ok(eip712::encode_signature_hex(&sig))
    }
}

/// Client-side "exact" scheme: builds and signs EIP-712 payment payloads.
///
/// Use this with [`X402Client`](crate::X402Client) to make paid API requests.
pub struct ExactSchemeClient<S: AuthorizationSigner> {
    signer: S,
    config: ChainConfig,
}

impl<S: AuthorizationSigner> ExactSchemeClient<S> {
    /// Create a scheme client with Base Sepolia defaults.
    pub fn new(signer: S) -> Self {
        Self {
            signer,
            config: ChainConfig::default(),
        }
    }

    /// Create a scheme client with a custom chain configuration.
    pub fn with_chain_config(signer: S, config: ChainConfig) -> Self {
        Self { signer, config }
    }

    /// The payer address payloads will be signed under.
    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

impl<S: AuthorizationSigner> SchemeClient for ExactSchemeClient<S> {
    fn supports(&self, requirements: &PaymentRequirements) -> bool {
        requirements.scheme == self.config.scheme_name
            && requirements.network == self.config.network
    }

    async fn create_payment_payload(
        &self,
        x402_version: u32,
        requirements: &PaymentRequirements,
    ) -> Result<PaymentPayload, X402Error> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| X402Error::ConfigError(format!("system time error: {e}")))?
            .as_secs();

        // Back-date slightly to tolerate clock skew between parties.
        let valid_after = now.saturating_sub(60);
        let valid_before = now + requirements.max_timeout_seconds;

        let value = requirements
            .amount
            .parse::<U256>()
            .map_err(|e| X402Error::InvalidPayment(format!("invalid amount: {e}")))?;

        let nonce = eip712::random_nonce();

        let auth = PaymentAuthorization {
            from: self.signer.address(),
            to: requirements.pay_to,
            value,
            token: requirements.asset,
            validAfter: U256::from(valid_after),
            validBefore: U256::from(valid_before),
            nonce,
        };

        let signature = self.signer.sign_authorization(&auth, &self.config)?;

        Ok(PaymentPayload {
            x402_version,
            scheme: requirements.scheme.clone(),
            network: requirements.network.clone(),
            payload: ExactPaymentData {
                from: self.signer.address(),
                to: requirements.pay_to,
                value: requirements.amount.clone(),
                asset: requirements.asset,
                valid_after,
                valid_before,
                nonce,
                signature,
            },
        })
    }
}
