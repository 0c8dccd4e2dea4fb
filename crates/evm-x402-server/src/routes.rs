use actix_web::{get, web, HttpRequest, HttpResponse};
use x402::response::encode_receipt;
use x402::security::constant_time_eq;
use x402::{RemoteFacilitator, RECEIPT_HEADER};

use x402_server::middleware::require_payment;
use x402_server::replay::InMemoryNonceStore;
use x402_server::PaymentConfig;

/// Shared state for the demo resource server.
pub struct AppState {
    pub payments: PaymentConfig,
    pub facilitator: RemoteFacilitator,
    pub replay: InMemoryNonceStore,
}

const FORTUNES: &[&str] = &[
    "The ledger remembers what you choose to forget.",
    "A signed authorization is a promise the chain will keep.",
    "Your next block arrives exactly when it should.",
    "Small payments, large consequences.",
    "The nonce you spend today cannot be spent tomorrow.",
    "Consensus favors the patient.",
    "An address is not an identity, but it pays like one.",
    "Gas spent on curiosity is never wasted.",
];

/// The paid resource. Payment is enforced before a fortune is drawn.
#[get("/fortune")]
pub async fn fortune(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let receipt =
        match require_payment(&req, &state.payments, &state.facilitator, &state.replay).await {
            Ok(receipt) => receipt,
            Err(resp) => return resp,
        };

    let fortune = FORTUNES[rand::random_range(0..FORTUNES.len())];
    let mut builder = HttpResponse::Ok();
    if let Some(receipt) = receipt {
        if let Ok(encoded) = encode_receipt(&receipt) {
            builder.insert_header((RECEIPT_HEADER, encoded));
        }
    }
    builder.json(serde_json::json!({ "fortune": fortune }))
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "x402-server",
    }))
}

/// Cached metrics token, read once at first access.
static METRICS_TOKEN: std::sync::LazyLock<Option<String>> =
    std::sync::LazyLock::new(|| std::env::var("METRICS_TOKEN").ok().filter(|s| !s.is_empty()));

/// Cached public metrics opt-in flag, read once at first access.
static PUBLIC_METRICS: std::sync::LazyLock<bool> = std::sync::LazyLock::new(|| {
    std::env::var("X402_PUBLIC_METRICS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
});

#[get("/metrics")]
pub async fn metrics_endpoint(req: HttpRequest) -> HttpResponse {
    match &*METRICS_TOKEN {
        Some(expected) => {
            let authorized = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|token| constant_time_eq(token.as_bytes(), expected.as_bytes()))
                .unwrap_or(false);

            if !authorized {
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "unauthorized",
                    "message": "Valid Bearer token required for /metrics"
                }));
            }
        }
        None => {
            // No token configured — metrics stay protected by default.
            if !*PUBLIC_METRICS {
                return HttpResponse::Forbidden().json(serde_json::json!({
                    "error": "forbidden",
                    "message": "Set METRICS_TOKEN or X402_PUBLIC_METRICS=true to access /metrics"
                }));
            }
        }
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(x402_server::metrics::metrics_output())
}
