use crate::constants::ChainConfig;
use crate::error::X402Error;
use crate::scheme::SchemeServer;
use alloy::primitives::Address;

/// Server-side "exact" scheme: parses prices and resolves the asset.
pub struct ExactSchemeServer {
    config: ChainConfig,
}

impl ExactSchemeServer {
    pub fn new() -> Self {
        Self {
            config: ChainConfig::default(),
        }
    }

    pub fn with_chain_config(config: ChainConfig) -> Self {
        Self { config }
    }
}

impl Default for ExactSchemeServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemeServer for ExactSchemeServer {
    fn parse_price(&self, price: &str) -> Result<(String, Address), X402Error> {
        // Strip non-numeric characters (except '.') -- handles "$0.01", "0.01", "$1", etc.
        let cleaned: String = price
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        if cleaned.is_empty() {
            return Err(X402Error::InvalidPayment(format!(
                "invalid price '{price}': no numeric content"
            )));
        }

        let decimals = self.config.token_decimals;
        let multiplier = 10u64.pow(decimals);
        let overflow =
            || X402Error::InvalidPayment(format!("invalid price '{price}': overflow"));

        // Integer-only parsing: split on the decimal point and scale the
        // parts separately. No f64 anywhere in the pipeline.
        let amount = match cleaned.split_once('.') {
            Some((whole, frac)) => {
                let whole: u64 = if whole.is_empty() {
                    0
                } else {
                    whole.parse::<u64>().map_err(|e| {
                        X402Error::InvalidPayment(format!(
                            "invalid price '{price}': integer part: {e}"
                        ))
                    })?
                };

                // Truncate fractional digits beyond the asset's precision.
                let frac = &frac[..frac.len().min(decimals as usize)];
                let frac_value: u64 = if frac.is_empty() {
                    0
                } else {
                    frac.parse::<u64>().map_err(|e| {
                        X402Error::InvalidPayment(format!(
                            "invalid price '{price}': fractional part: {e}"
                        ))
                    })?
                };
                let scale = 10u64.pow(decimals - frac.len() as u32);

                whole
                    .checked_mul(multiplier)
                    .and_then(|w| frac_value.checked_mul(scale).and_then(|f| w.checked_add(f)))
                    .ok_or_else(overflow)?
            }
            None => {
                let whole: u64 = cleaned.parse::<u64>().map_err(|e| {
                    X402Error::InvalidPayment(format!("invalid price '{price}': {e}"))
                })?;
                whole.checked_mul(multiplier).ok_or_else(overflow)?
            }
        };

        Ok((amount.to_string(), self.config.default_token))
    }
}
