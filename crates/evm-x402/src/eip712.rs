//! EIP-712 typed-data signing and verification for payment authorizations.
//!
//! The authorization struct itself is declared in [`crate`] via `sol!`;
//! this module builds its signing domain, computes signing hashes, verifies
//! signatures with EIP-2 malleability protection, and generates the random
//! nonces that make authorizations single-use.

use alloy::primitives::{Address, FixedBytes, Signature, B256, U256};
use alloy::sol_types::SolStruct;

use crate::constants::ChainConfig;
use crate::error::X402Error;
use crate::PaymentAuthorization;

/// Build the EIP-712 domain for a chain config and token address.
pub fn payment_domain(config: &ChainConfig, token: Address) -> alloy::sol_types::Eip712Domain {
    alloy::sol_types::Eip712Domain {
        name: Some(std::borrow::Cow::Owned(config.eip712_domain_name.clone())),
        version: Some(std::borrow::Cow::Owned(
            config.eip712_domain_version.clone(),
        )),
        chain_id: Some(U256::from(config.chain_id)),
        verifying_contract: Some(token),
        salt: None,
    }
}

/// Compute the EIP-712 signing hash of an authorization.
pub fn signing_hash(auth: &PaymentAuthorization, config: &ChainConfig) -> B256 {
    let domain = payment_domain(config, auth.token);
    auth.eip712_signing_hash(&domain)
}

/// secp256k1 curve order N / 2 — signatures with s > this are malleable (EIP-2).
const SECP256K1_N_DIV_2: U256 = U256::from_limbs([
    0xBFD25E8CD0364140,
    0xBAAEDCE6AF48A03B,
    0xFFFFFFFFFFFFFFFE,
    0x7FFFFFFFFFFFFFFF,
]);

/// Verify a signature over an authorization and recover the signer address.
///
/// Rejects signatures that are not exactly 65 bytes and high-s signatures
/// (EIP-2 malleability). The caller compares the recovered address against
/// the authorization's `from` field.
pub fn verify_signature(
    auth: &PaymentAuthorization,
    signature_bytes: &[u8],
    config: &ChainConfig,
) -> Result<Address, X402Error> {
    if signature_bytes.len() != 65 {
        return Err(X402Error::SignatureError(format!(
            "signature must be 65 bytes, got {}",
            signature_bytes.len()
        )));
    }

    let sig = Signature::from_raw(signature_bytes)
        .map_err(|e| X402Error::SignatureError(format!("invalid signature: {e}")))?;

    if sig.s() > SECP256K1_N_DIV_2 {
        return Err(X402Error::SignatureError(
            "high-s signature rejected (EIP-2 malleability)".to_string(),
        ));
    }

    let hash = signing_hash(auth, config);
    sig.recover_address_from_prehash(&hash)
        .map_err(|e| X402Error::SignatureError(format!("recovery failed: {e}")))
}

/// Generate a random 32-byte nonce (keccak256 of 32 CSPRNG bytes).
pub fn random_nonce() -> FixedBytes<32> {
    use alloy::primitives::keccak256;
    let mut bytes = [0u8; 32];
    rand::fill(&mut bytes); // OS CSPRNG via ThreadRng
    keccak256(bytes)
}

/// Encode a signature to a 0x-prefixed hex string (65 bytes -> 0x + 130 hex).
pub fn encode_signature_hex(sig: &Signature) -> String {
    format!("0x{}", alloy::hex::encode(sig.as_bytes()))
}

/// Decode a 0x-prefixed (or bare) hex signature string into raw bytes.
pub fn decode_signature_hex(hex_sig: &str) -> Result<Vec<u8>, X402Error> {
    let stripped = hex_sig.strip_prefix("0x").unwrap_or(hex_sig);
    alloy::hex::decode(stripped)
        .map_err(|e| X402Error::SignatureError(format!("invalid signature hex: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, FixedBytes, U256};
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;

    fn sample_auth(from: Address) -> PaymentAuthorization {
        PaymentAuthorization {
            from,
            to: Address::new([0xab; 20]),
            value: U256::from(10_000u64),
            token: crate::constants::DEFAULT_TOKEN,
            validAfter: U256::from(0u64),
            validBefore: U256::from(u64::MAX),
            nonce: FixedBytes::ZERO,
        }
    }

    #[test]
    fn test_sign_verify_recovers_signer() {
        let signer = PrivateKeySigner::random();
        let config = ChainConfig::default();
        let auth = sample_auth(signer.address());

        let sig = signer.sign_hash_sync(&signing_hash(&auth, &config)).unwrap();
        let bytes = decode_signature_hex(&encode_signature_hex(&sig)).unwrap();

        let recovered = verify_signature(&auth, &bytes, &config).unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_verify_rejects_short_signature() {
        let config = ChainConfig::default();
        let auth = sample_auth(Address::ZERO);
        assert!(verify_signature(&auth, &[0xde, 0xad], &config).is_err());
    }

    #[test]
    fn test_domain_binds_chain_id() {
        let config = ChainConfig::default();
        let mut other_chain = ChainConfig::default();
        other_chain.chain_id = 1;

        let auth = sample_auth(Address::ZERO);
        assert_ne!(
            signing_hash(&auth, &config),
            signing_hash(&auth, &other_chain)
        );
    }

    #[test]
    fn test_random_nonce_is_unique() {
        assert_ne!(random_nonce(), random_nonce());
    }

    #[test]
    fn test_signature_hex_roundtrip() {
        let r = U256::from(42u64);
        let s = U256::from(99u64);
        let sig = Signature::new(r, s, true);
        let hex = encode_signature_hex(&sig);
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 132); // 0x + 130 hex chars

        let bytes = decode_signature_hex(&hex).unwrap();
        let parsed = Signature::from_raw(&bytes).unwrap();
        assert_eq!(parsed.r(), r);
        assert_eq!(parsed.s(), s);
    }
}
