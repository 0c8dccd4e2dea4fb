use alloy::primitives::{Address, FixedBytes, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;

use x402::eip712;
use x402::{
    decode_payment, encode_payment, verify_binding, BindingViolation, ChainConfig,
    ExactPaymentData, PaymentAuthorization, PaymentPayload, PaymentRequirements, DEFAULT_TOKEN,
    NETWORK, SCHEME_NAME, X402_VERSION,
};

const RECIPIENT: Address = Address::new([0xab; 20]);

/// Helper: create a valid PaymentAuthorization and sign it.
fn make_signed_auth(signer: &PrivateKeySigner) -> (PaymentAuthorization, Vec<u8>) {
    let config = ChainConfig::default();
    let auth = PaymentAuthorization {
        from: signer.address(),
        to: RECIPIENT,
        value: U256::from(10_000u64),
        token: DEFAULT_TOKEN,
        validAfter: U256::from(0u64),
        validBefore: U256::from(u64::MAX),
        nonce: eip712::random_nonce(),
    };
    let hash = eip712::signing_hash(&auth, &config);
    let sig = signer.sign_hash_sync(&hash).unwrap();
    (auth, sig.as_bytes().to_vec())
}

fn requirements_for(amount: &str, pay_to: Address) -> PaymentRequirements {
    PaymentRequirements {
        scheme: SCHEME_NAME.to_string(),
        network: NETWORK.to_string(),
        price: "$0.01".to_string(),
        amount: amount.to_string(),
        asset: DEFAULT_TOKEN,
        pay_to,
        resource: "/fortune".to_string(),
        max_timeout_seconds: 30,
        description: None,
    }
}

fn payload_for(auth: &PaymentAuthorization, sig_bytes: &[u8]) -> PaymentPayload {
    PaymentPayload {
        x402_version: X402_VERSION,
        scheme: SCHEME_NAME.to_string(),
        network: NETWORK.to_string(),
        payload: ExactPaymentData {
            from: auth.from,
            to: auth.to,
            value: auth.value.to_string(),
            asset: auth.token,
            valid_after: auth.validAfter.to::<u64>(),
            valid_before: 2_000_000_000,
            nonce: auth.nonce,
            signature: format!("0x{}", alloy::hex::encode(sig_bytes)),
        },
    }
}

// -- Signature failure tests --

#[test]
fn test_verify_wrong_signer() {
    let signer_a = PrivateKeySigner::random();
    let signer_b = PrivateKeySigner::random();
    let config = ChainConfig::default();

    let (mut auth, sig_bytes) = make_signed_auth(&signer_a);
    // Claim the auth is from signer_b
    auth.from = signer_b.address();

    let recovered = eip712::verify_signature(&auth, &sig_bytes, &config).unwrap();
    assert_ne!(recovered, signer_b.address());
}

#[test]
fn test_verify_tampered_value() {
    let signer = PrivateKeySigner::random();
    let config = ChainConfig::default();
    let (mut auth, sig_bytes) = make_signed_auth(&signer);

    // Tamper with the value after signing
    auth.value = U256::from(1u64);

    let recovered = eip712::verify_signature(&auth, &sig_bytes, &config).unwrap();
    assert_ne!(recovered, signer.address());
}

#[test]
fn test_verify_tampered_recipient() {
    let signer = PrivateKeySigner::random();
    let config = ChainConfig::default();
    let (mut auth, sig_bytes) = make_signed_auth(&signer);

    auth.to = Address::new([0xcd; 20]);

    let recovered = eip712::verify_signature(&auth, &sig_bytes, &config).unwrap();
    assert_ne!(recovered, signer.address());
}

#[test]
fn test_verify_tampered_nonce() {
    let signer = PrivateKeySigner::random();
    let config = ChainConfig::default();
    let (mut auth, sig_bytes) = make_signed_auth(&signer);

    auth.nonce = FixedBytes::new([0xff; 32]);

    let recovered = eip712::verify_signature(&auth, &sig_bytes, &config).unwrap();
    assert_ne!(recovered, signer.address());
}

#[test]
fn test_verify_invalid_signature_bytes() {
    let signer = PrivateKeySigner::random();
    let config = ChainConfig::default();
    let (auth, _) = make_signed_auth(&signer);

    let result = eip712::verify_signature(&auth, &[0xde, 0xad], &config);
    assert!(result.is_err());
}

// -- Requirements binding tests --

#[test]
fn test_payload_bound_to_issued_requirements() {
    let signer = PrivateKeySigner::random();
    let (auth, sig) = make_signed_auth(&signer);
    let payload = payload_for(&auth, &sig);

    let issued = requirements_for("10000", RECIPIENT);
    assert_eq!(verify_binding(&payload, &issued, 1_700_000_000), Ok(()));
}

#[test]
fn test_payload_rejected_against_cheaper_requirements() {
    // A payload signed for requirements R must not satisfy R' with a
    // different amount, even though it is individually well-formed.
    let signer = PrivateKeySigner::random();
    let (auth, sig) = make_signed_auth(&signer);
    let payload = payload_for(&auth, &sig);

    let other = requirements_for("20000", RECIPIENT);
    assert_eq!(
        verify_binding(&payload, &other, 1_700_000_000),
        Err(BindingViolation::Amount)
    );
}

#[test]
fn test_payload_rejected_against_other_recipient() {
    let signer = PrivateKeySigner::random();
    let (auth, sig) = make_signed_auth(&signer);
    let payload = payload_for(&auth, &sig);

    let other = requirements_for("10000", Address::new([0xcd; 20]));
    assert_eq!(
        verify_binding(&payload, &other, 1_700_000_000),
        Err(BindingViolation::Recipient)
    );
}

// -- Wire format tests --

#[test]
fn test_signed_payload_header_roundtrip() {
    let signer = PrivateKeySigner::random();
    let (auth, sig) = make_signed_auth(&signer);
    let payload = payload_for(&auth, &sig);

    let encoded = encode_payment(&payload).unwrap();
    let decoded = decode_payment(&encoded).unwrap();
    assert_eq!(decoded, payload);

    // The signature survives hex + base64 transport intact.
    let sig_bytes = eip712::decode_signature_hex(&decoded.payload.signature).unwrap();
    assert_eq!(sig_bytes, sig);
}
