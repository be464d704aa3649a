//! Fetch one secret from a Grayskull server
//!
//! ```text
//! GRAYSKULL_HOST=https://grayskull.example.com \
//! GRAYSKULL_USERNAME=svc-payments GRAYSKULL_PASSWORD=... \
//! RUST_LOG=grayskull_sdk=debug \
//! cargo run --example get_secret -- payments:db-password
//! ```

use anyhow::Context;
use grayskull_sdk::{BasicAuth, Client, ClientBuilder, Error, RequestContext};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let secret_ref = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demo-project:demo-secret".to_string());

    let client = create_client()?;

    // Example 1: Plain call
    println!("=== Example 1: Get a secret ===");
    match client.get_secret(&secret_ref).await {
        Ok(secret) => {
            println!("Version: {}", secret.data_version);
            println!("Public part: {}", secret.public_part);
            println!(
                "Private part: {} chars",
                secret.private_part.expose_secret().len()
            );
        }
        Err(e) => report(&e),
    }

    // Example 2: Same call under a deadline
    println!("\n=== Example 2: Get a secret with a 2s deadline ===");
    let ctx = RequestContext::new().with_timeout(Duration::from_secs(2));
    println!("Request ID: {}", ctx.request_id());
    match client.get_secret_with_context(ctx, &secret_ref).await {
        Ok(fetched) => println!(
            "Fetched version {} in {} attempt(s)",
            fetched.data.data_version, fetched.attempts
        ),
        Err(e) => report(&e),
    }

    Ok(())
}

fn create_client() -> anyhow::Result<Client> {
    let host = std::env::var("GRAYSKULL_HOST")
        .unwrap_or_else(|_| "https://grayskull.example.com".to_string());
    let username =
        std::env::var("GRAYSKULL_USERNAME").unwrap_or_else(|_| "demo-user".to_string());
    let password =
        std::env::var("GRAYSKULL_PASSWORD").unwrap_or_else(|_| "demo-password".to_string());

    let client = ClientBuilder::new(host)
        .auth(BasicAuth::new(username, password).context("invalid credentials")?)
        .max_attempts(4)
        .min_retry_delay_ms(200)
        .user_agent_extra("demos/1.0")
        .build()
        .context("failed to build client")?;

    Ok(client)
}

fn report(error: &Error) {
    if error.is_canceled() {
        println!("Canceled after {} attempt(s)", error.attempts());
    } else if error.is_retryable() {
        println!("Gave up after {} attempts: {}", error.attempts(), error);
    } else {
        println!("Failed: {}", error);
    }
}
