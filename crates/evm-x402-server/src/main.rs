use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, App, HttpServer};
use alloy::primitives::Address;
use std::time::Duration;

mod routes;

use crate::routes::AppState;
use x402::{ExactSchemeServer, RemoteFacilitator};
use x402_server::config::{PaymentConfigBuilder, PaymentGateConfig};
use x402_server::replay::{InMemoryNonceStore, NonceStore};

fn build_cors(origins: &[String]) -> Cors {
    if origins.is_empty() {
        Cors::default()
            .allowed_origin_fn(|origin, _| {
                origin
                    .to_str()
                    .map(|o| {
                        // Match http://localhost or http://localhost:PORT exactly
                        o == "http://localhost" || o.starts_with("http://localhost:")
                    })
                    .unwrap_or(false)
            })
            .allow_any_method()
            .allow_any_header()
            .max_age(3600)
    } else {
        let mut cors = Cors::default();
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
        cors.allow_any_method().allow_any_header().max_age(3600)
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let facilitator_url =
        std::env::var("FACILITATOR_URL").unwrap_or_else(|_| "http://localhost:4022".to_string());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(4021);

    let pay_to: Address = match std::env::var("PAY_TO").ok().and_then(|a| a.parse().ok()) {
        Some(addr) => addr,
        None => {
            tracing::error!("PAY_TO is required (recipient address for payments)");
            std::process::exit(1);
        }
    };

    let gate_config = PaymentGateConfig::from_env(&facilitator_url);
    let cors_origins = gate_config.allowed_origins.clone();

    let payments = PaymentConfigBuilder::new(ExactSchemeServer::new(), pay_to)
        .route("GET", "/fortune", "$0.01", Some("One fortune from the oracle"))
        .build();

    let mut facilitator = RemoteFacilitator::new(&gate_config.facilitator_url)
        .with_timeout(Duration::from_secs(gate_config.facilitator_timeout_secs));
    if let Some(secret) = gate_config.hmac_secret.clone() {
        facilitator = facilitator.with_hmac_secret(secret);
    }

    let state = web::Data::new(AppState {
        payments,
        facilitator,
        replay: InMemoryNonceStore::new(),
    });

    // Settled nonces only matter while their authorization window is open;
    // sweep the guard well past that.
    let purge_state = state.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(300));
        loop {
            tick.tick().await;
            let purged = purge_state.replay.purge_expired(600);
            if purged > 0 {
                tracing::debug!(purged, "purged settled nonces");
            }
        }
    });

    tracing::info!("x402 resource server listening at http://localhost:{port}");
    tracing::info!(facilitator = %gate_config.facilitator_url, payee = %pay_to, "payment gate ready");
    tracing::info!("Endpoints: GET /fortune (paid), GET /health, GET /metrics");
    tracing::info!("Rate limit: {} req/min per IP", gate_config.rate_limit_rpm);

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(gate_config.rate_limit_rpm)
        .finish()
        .expect("failed to build rate limiter config");

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&cors_origins))
            .wrap(Governor::new(&governor_conf))
            .app_data(web::JsonConfig::default().limit(65_536))
            .app_data(state.clone())
            .service(routes::fortune)
            .service(routes::health)
            .service(routes::metrics_endpoint)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
