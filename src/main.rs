use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleetgate::auth::credentials::CredentialStore;
use fleetgate::{api, config, AppState};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "fleetgate=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::User { command }) => {
            let creds = CredentialStore::connect(&cfg.database_url).await?;
            creds.migrate().await?;
            handle_user_command(&creds, command).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to credential store...");
    let state = Arc::new(AppState::new(cfg).await?);

    if state.config.seed_demo_user {
        state.creds.seed_demo_user().await?;
    }

    tracing::info!(root = %state.config.data_dir.display(), "Dataset root configured");

    let allowed_origins = state.config.allowed_origins.clone();
    let app = api::router(state)
        .layer({
            use axum::http::{HeaderName, Method};
            use tower_http::cors::AllowOrigin;
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(move |origin, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    allowed_origins.iter().any(|o| o == origin_str)
                        || origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                }))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    HeaderName::from_static("content-type"),
                    HeaderName::from_static("authorization"),
                ])
                .allow_credentials(true)
        })
        .layer(axum::middleware::from_fn(request_id_middleware));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Fleetgate listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Middleware: injects a unique X-Request-Id into every response so clients
/// can correlate errors with server logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

async fn handle_user_command(
    creds: &CredentialStore,
    cmd: cli::UserCommands,
) -> anyhow::Result<()> {
    match cmd {
        cli::UserCommands::Add {
            email,
            password,
            brand,
        } => {
            let created = creds.insert_user(&email, &password, &brand).await?;
            if created {
                println!("Operator created:\n  Email: {}\n  Brand: {}", email, brand);
            } else {
                println!("Operator already exists: {}", email);
            }
        }
        cli::UserCommands::List => {
            let users = creds.list_users().await?;
            if users.is_empty() {
                println!("No operators found.");
            } else {
                println!("{:<40} BRAND", "EMAIL");
                for u in users {
                    println!("{:<40} {}", u.email, u.brand);
                }
            }
        }
    }
    Ok(())
}
