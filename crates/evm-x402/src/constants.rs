use alloy::primitives::Address;

/// Protocol version carried in every payload and 402 body.
pub const X402_VERSION: u32 = 1;

/// Request header carrying the base64-encoded [`PaymentPayload`](crate::PaymentPayload).
pub const PAYMENT_HEADER: &str = "PAYMENT-SIGNATURE";

/// Response header carrying the base64-encoded [`SettlementReceipt`](crate::SettlementReceipt).
pub const RECEIPT_HEADER: &str = "PAYMENT-RESPONSE";

/// Base Sepolia chain ID.
pub const CHAIN_ID: u64 = 84532;

/// CAIP-2 network identifier for Base Sepolia.
pub const NETWORK: &str = "eip155:84532";

/// x402 scheme name for exact-amount EIP-712 transfer authorizations.
pub const SCHEME_NAME: &str = "exact";

/// USDC token address on Base Sepolia.
pub const DEFAULT_TOKEN: Address = Address::new([
    0x03, 0x6C, 0xbD, 0x53, 0x84, 0x2c, 0x54, 0x26, 0x63, 0x4e, 0x79, 0x29, 0x54, 0x1e, 0xC2, 0x31,
    0x8f, 0x3d, 0xCF, 0x7e,
]);

/// USDC has 6 decimal places.
pub const TOKEN_DECIMALS: u32 = 6;

/// Default validity window granted to a signed authorization, in seconds.
pub const DEFAULT_MAX_TIMEOUT_SECONDS: u64 = 30;

/// Runtime chain configuration. Decouples scheme implementations from
/// compile-time constants, enabling multi-chain support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub network: String,
    pub scheme_name: String,
    pub default_token: Address,
    pub token_decimals: u32,
    pub eip712_domain_name: String,
    pub eip712_domain_version: String,
}

impl Default for ChainConfig {
    /// Defaults to Base Sepolia configuration.
    fn default() -> Self {
        Self {
            chain_id: CHAIN_ID,
            network: NETWORK.to_string(),
            scheme_name: SCHEME_NAME.to_string(),
            default_token: DEFAULT_TOKEN,
            token_decimals: TOKEN_DECIMALS,
            eip712_domain_name: "x402-exact".to_string(),
            eip712_domain_version: "1".to_string(),
        }
    }
}
