use x402_client::{AgentError, ExactSchemeClient, LocalKeySigner, X402Client};

/// Demo client: fetch a paid URL, paying with the key from the
/// `X402_PRIVATE_KEY` environment variable.
///
/// Usage: `x402-client [url]` (defaults to the local demo server's
/// fortune route).
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:4021/fortune".to_string());

    let Ok(key) = std::env::var("X402_PRIVATE_KEY") else {
        tracing::error!("X402_PRIVATE_KEY is not set");
        std::process::exit(1);
    };
    let signer = match LocalKeySigner::from_hex(&key) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "could not load signer");
            std::process::exit(1);
        }
    };

    let scheme = ExactSchemeClient::new(signer);
    tracing::info!(payer = %scheme.address(), url = %url, "requesting");
    let client = X402Client::new(scheme);

    match client.fetch(&url, reqwest::Method::GET).await {
        Ok((resp, receipt)) => {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            println!("{status}");
            println!("{body}");
            if let Some(r) = receipt {
                println!("settled: {} on {}", r.transaction, r.network);
            }
        }
        Err(e @ AgentError::PaymentRejected(_)) => {
            tracing::error!(error = %e, "server declined the payment");
            std::process::exit(1);
        }
        Err(e @ (AgentError::Timeout(_) | AgentError::FacilitatorUnavailable { .. })) => {
            tracing::error!(error = %e, "payment infrastructure unavailable");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %e, "request failed");
            std::process::exit(1);
        }
    }
}
