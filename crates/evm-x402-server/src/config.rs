use alloy::primitives::Address;
use std::collections::HashMap;
use x402::{PaymentRequirements, SchemeServer, DEFAULT_MAX_TIMEOUT_SECONDS, NETWORK, SCHEME_NAME};

/// Payment configuration for a single route.
#[derive(Debug, Clone)]
pub struct RoutePaymentConfig {
    pub requirements: PaymentRequirements,
}

/// Gate-level settings loaded once from the environment at startup.
#[derive(Debug, Clone)]
pub struct PaymentGateConfig {
    pub facilitator_url: String,
    pub hmac_secret: Option<Vec<u8>>,
    pub facilitator_timeout_secs: u64,
    pub rate_limit_rpm: u64,
    pub allowed_origins: Vec<String>,
}

impl PaymentGateConfig {
    pub fn from_env(facilitator_url: &str) -> Self {
        let hmac_secret = std::env::var("FACILITATOR_SHARED_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| s.into_bytes());

        let insecure_no_hmac = std::env::var("X402_INSECURE_NO_HMAC")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        if hmac_secret.is_none() && !insecure_no_hmac {
            tracing::error!(
                "FACILITATOR_SHARED_SECRET is required. \
                 Set it to a secure random value (e.g. `openssl rand -hex 32`). \
                 For local development only, set X402_INSECURE_NO_HMAC=true to skip."
            );
            std::process::exit(1);
        } else if hmac_secret.is_none() {
            tracing::warn!(
                "X402_INSECURE_NO_HMAC=true — facilitator requests will be UNAUTHENTICATED. \
                 DO NOT use this in production!"
            );
        }

        let facilitator_timeout_secs: u64 = std::env::var("FACILITATOR_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(30);

        let rate_limit_rpm: u64 = std::env::var("RATE_LIMIT_RPM")
            .ok()
            .and_then(|r| r.parse().ok())
            .unwrap_or(60);

        let allowed_origins: Vec<String> = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            facilitator_url: facilitator_url.to_string(),
            hmac_secret,
            facilitator_timeout_secs,
            rate_limit_rpm,
            allowed_origins,
        }
    }
}

/// Holds the payment requirements for all priced routes.
/// Built once at startup, read-only thereafter.
pub struct PaymentConfig {
    routes: HashMap<String, RoutePaymentConfig>,
}

/// Builder for constructing a [`PaymentConfig`] with multiple priced routes.
pub struct PaymentConfigBuilder {
    scheme: Box<dyn SchemeServer>,
    pay_to: Address,
    routes: HashMap<String, RoutePaymentConfig>,
}

impl PaymentConfigBuilder {
    /// Create a new builder. `scheme` parses prices into token amounts;
    /// `pay_to` is the recipient for every route.
    pub fn new(scheme: impl SchemeServer + 'static, pay_to: Address) -> Self {
        Self {
            scheme: Box::new(scheme),
            pay_to,
            routes: HashMap::new(),
        }
    }

    /// Register a priced route (e.g. `route("GET", "/fortune", "$0.01", Some("..."))`).
    ///
    /// `price` is a human-readable string parsed via the scheme. Prices are
    /// startup configuration, so a bad one is a programming error.
    pub fn route(
        mut self,
        method: &str,
        path: &str,
        price: &str,
        description: Option<&str>,
    ) -> Self {
        let (amount, asset) = self
            .scheme
            .parse_price(price)
            .unwrap_or_else(|_| panic!("failed to parse price: {price}"));

        let key = format!("{method} {path}");
        self.routes.insert(
            key,
            RoutePaymentConfig {
                requirements: PaymentRequirements {
                    scheme: SCHEME_NAME.to_string(),
                    network: NETWORK.to_string(),
                    price: price.to_string(),
                    amount,
                    asset,
                    pay_to: self.pay_to,
                    resource: path.to_string(),
                    max_timeout_seconds: DEFAULT_MAX_TIMEOUT_SECONDS,
                    description: description.map(String::from),
                },
            },
        );
        self
    }

    /// Consume the builder and produce a read-only [`PaymentConfig`].
    pub fn build(self) -> PaymentConfig {
        PaymentConfig {
            routes: self.routes,
        }
    }
}

impl PaymentConfig {
    /// Look up the payment config for a route (e.g. `("GET", "/fortune")`).
    pub fn get_route(&self, method: &str, path: &str) -> Option<&RoutePaymentConfig> {
        let key = format!("{method} {path}");
        self.routes.get(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x402::ExactSchemeServer;

    #[test]
    fn test_route_requirements_are_fully_populated() {
        let config = PaymentConfigBuilder::new(ExactSchemeServer::new(), Address::new([0xab; 20]))
            .route("GET", "/fortune", "$0.01", Some("One fortune"))
            .build();

        let route = config.get_route("GET", "/fortune").unwrap();
        let req = &route.requirements;
        assert_eq!(req.scheme, "exact");
        assert_eq!(req.network, "eip155:84532");
        assert_eq!(req.price, "$0.01");
        assert_eq!(req.amount, "10000");
        assert_eq!(req.pay_to, Address::new([0xab; 20]));
        assert_eq!(req.resource, "/fortune");
        assert_eq!(req.description.as_deref(), Some("One fortune"));
    }

    #[test]
    fn test_get_route_returns_none_for_unknown() {
        let config = PaymentConfigBuilder::new(ExactSchemeServer::new(), Address::ZERO)
            .route("GET", "/fortune", "$0.01", None)
            .build();
        assert!(config.get_route("POST", "/fortune").is_none());
        assert!(config.get_route("GET", "/other").is_none());
    }

    #[test]
    fn test_builder_multiple_routes() {
        let config = PaymentConfigBuilder::new(ExactSchemeServer::new(), Address::ZERO)
            .route("GET", "/fortune", "$0.01", Some("fortune"))
            .route("POST", "/fortune/custom", "$0.05", None)
            .build();

        let r1 = config.get_route("GET", "/fortune").unwrap();
        assert_eq!(r1.requirements.amount, "10000");

        let r2 = config.get_route("POST", "/fortune/custom").unwrap();
        assert_eq!(r2.requirements.amount, "50000");
        assert!(r2.requirements.description.is_none());
    }

    #[test]
    fn test_builder_empty_builds_no_routes() {
        let config = PaymentConfigBuilder::new(ExactSchemeServer::new(), Address::ZERO).build();
        assert!(config.is_empty());
    }
}
