use actix_web::{HttpRequest, HttpResponse};
use x402::{
    decode_payment, verify_binding, Facilitator, FacilitatorError, PaymentRequiredBody,
    PaymentRequirements, SettlementReceipt, PAYMENT_HEADER, X402_VERSION,
};

use crate::config::PaymentConfig;
use crate::metrics::{PAYMENT_ATTEMPTS, REQUESTS};
use crate::replay::NonceStore;

/// Check if a request is for a priced route and extract its requirements.
pub fn check_payment_gate<'a>(
    req: &HttpRequest,
    config: &'a PaymentConfig,
) -> Option<&'a PaymentRequirements> {
    let method = req.method().as_str();
    let path = req.path();
    config.get_route(method, path).map(|r| &r.requirements)
}

/// Build the 402 Payment Required challenge body.
pub fn payment_required_body(requirements: &PaymentRequirements) -> PaymentRequiredBody {
    PaymentRequiredBody {
        x402_version: X402_VERSION,
        accepts: vec![requirements.clone()],
        error: None,
    }
}

/// Build a 402 body carrying a machine-readable rejection reason.
pub fn rejection_body(requirements: &PaymentRequirements, reason: &str) -> PaymentRequiredBody {
    PaymentRequiredBody {
        x402_version: X402_VERSION,
        accepts: vec![requirements.clone()],
        error: Some(reason.to_string()),
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// The payment gate. Call from a priced route's handler before doing any
/// work.
///
/// State machine per request: Unauthenticated -> Verifying -> {Authorized,
/// Rejected}. Returns `Ok(None)` when the route is not priced, `Ok(receipt)`
/// when the facilitator settled the payment (attach the receipt and serve),
/// or `Err(response)` with the response to return instead of invoking the
/// handler: a 402 challenge when no decodable payment is attached, a 402
/// rejection with a machine-readable reason when the payment is declined,
/// 503/504 when the facilitator is unreachable (fail-closed — a facilitator
/// outage never authorizes).
///
/// The requirements the payload is checked against are reconstructed from
/// the gate's own configuration; nothing embedded in the payload is trusted.
pub async fn require_payment<F: Facilitator>(
    req: &HttpRequest,
    config: &PaymentConfig,
    facilitator: &F,
    replay: &dyn NonceStore,
) -> Result<Option<SettlementReceipt>, HttpResponse> {
    let Some(requirements) = check_payment_gate(req, config) else {
        return Ok(None);
    };

    // Use the matched route pattern (not raw path) to prevent cardinality bombs
    let endpoint = req.match_pattern().unwrap_or_else(|| "unknown".to_string());

    let payment_header = req
        .headers()
        .get(PAYMENT_HEADER)
        .and_then(|v| v.to_str().ok());

    let Some(payment_header) = payment_header else {
        REQUESTS.with_label_values(&[endpoint.as_str(), "402"]).inc();
        let body = payment_required_body(requirements);
        return Err(HttpResponse::PaymentRequired().json(body));
    };

    // A payload that fails structural decode is indistinguishable from no
    // payload: re-issue the challenge so the caller can start over.
    let payload = match decode_payment(payment_header) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "invalid payment header");
            REQUESTS.with_label_values(&[endpoint.as_str(), "402"]).inc();
            return Err(HttpResponse::PaymentRequired()
                .json(rejection_body(requirements, "invalid_payment_header")));
        }
    };

    // The payload must be bound to the requirements this gate would issue
    // for this route right now.
    if let Err(violation) = verify_binding(&payload, requirements, unix_now()) {
        tracing::warn!(
            payer = %payload.payload.from,
            reason = %violation,
            "payment not bound to issued requirements"
        );
        PAYMENT_ATTEMPTS.with_label_values(&["rejected"]).inc();
        REQUESTS.with_label_values(&[endpoint.as_str(), "402"]).inc();
        return Err(
            HttpResponse::PaymentRequired().json(rejection_body(requirements, &violation.to_string()))
        );
    }

    let nonce = payload.payload.nonce;
    if !replay.try_use(nonce) {
        tracing::warn!(payer = %payload.payload.from, nonce = %nonce, "replayed nonce");
        PAYMENT_ATTEMPTS.with_label_values(&["replayed"]).inc();
        REQUESTS.with_label_values(&[endpoint.as_str(), "402"]).inc();
        return Err(
            HttpResponse::PaymentRequired().json(rejection_body(requirements, "nonce_already_used"))
        );
    }

    tracing::info!(
        payer = %payload.payload.from,
        amount = %payload.payload.value,
        resource = %requirements.resource,
        "payment attempt"
    );

    match facilitator.verify_and_settle(&payload, requirements).await {
        Ok(verdict) if verdict.success => {
            PAYMENT_ATTEMPTS.with_label_values(&["success"]).inc();
            REQUESTS.with_label_values(&[endpoint.as_str(), "200"]).inc();
            Ok(verdict.receipt())
        }
        Ok(verdict) => {
            // Not settled; the nonce stays usable for a corrected retry.
            replay.release(&nonce);
            let reason = verdict
                .error_reason
                .as_deref()
                .unwrap_or("payment_rejected");
            tracing::warn!(payer = ?verdict.payer, reason, "payment rejected");
            PAYMENT_ATTEMPTS.with_label_values(&["rejected"]).inc();
            REQUESTS.with_label_values(&[endpoint.as_str(), "402"]).inc();
            Err(HttpResponse::PaymentRequired().json(rejection_body(requirements, reason)))
        }
        Err(FacilitatorError::Timeout(e)) => {
            replay.release(&nonce);
            tracing::error!(error = %e, "facilitator timeout");
            PAYMENT_ATTEMPTS.with_label_values(&["error"]).inc();
            REQUESTS.with_label_values(&[endpoint.as_str(), "504"]).inc();
            Err(HttpResponse::GatewayTimeout().json(serde_json::json!({
                "error": "facilitator timeout"
            })))
        }
        Err(e) => {
            replay.release(&nonce);
            tracing::error!(error = %e, "facilitator communication error");
            PAYMENT_ATTEMPTS.with_label_values(&["error"]).inc();
            REQUESTS.with_label_values(&[endpoint.as_str(), "503"]).inc();
            Err(HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": "payment processing unavailable"
            })))
        }
    }
}
