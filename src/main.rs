//! cfpgate entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Build the origin (static directory or upstream proxy)
//! 3. Derive the session token once
//! 4. Build the gate router
//! 5. Start Axum server
//!
//! Also supports a `token` subcommand that prints the session cookie value for a
//! password.

use cfpgate::{auth::derive_session_token, auth::AppState, config::Config, origin, routes};

fn print_token_usage() {
    eprintln!("Usage: cfpgate token <password>");
    eprintln!();
    eprintln!("Print the CFP-Auth-Key cookie value issued for a password.");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  cfpgate token mysecretpassword");
}

#[tokio::main]
async fn main() {
    // Check for token subcommand
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && args[1] == "token" {
        if args.len() != 3 || args[2].is_empty() {
            print_token_usage();
            std::process::exit(1);
        }
        println!("{}", derive_session_token(&args[2]));
        return;
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().expect("Failed to load config");
    tracing::info!(
        bind_addr = %config.bind_addr,
        cookie_match = %config.cookie_match,
        "Starting cfpgate"
    );

    if config.password.is_none() {
        tracing::warn!("CFP_PASSWORD is not set; every request will be answered with 500");
    }

    let origin = origin::from_config(&config).expect("Failed to build origin");
    match &origin {
        Some(_) => tracing::info!(origin = ?config.origin, "Origin configured"),
        None => tracing::warn!("No origin configured; admitted requests will be answered with 500"),
    }

    let bind_addr = config.bind_addr;
    let state = AppState::new(config, origin);
    let app = routes::gate_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
