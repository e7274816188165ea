//! The REST API server.
//!
//! Requires the environment variable `JWT_SECRET`. When the `SMTP_*`
//! variables are absent, account emails are logged instead of sent.

use std::{
    env::{self},
    fs::OpenOptions,
    net::SocketAddr,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use moneta::{AppState, Mailer, PaginationConfig, SmtpConfig, build_router, graceful_shutdown};

/// The REST API server for moneta.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let secret = env::var("JWT_SECRET").expect("The environment variable 'JWT_SECRET' must be set");
    let mailer = mailer_from_env();

    let connection = Connection::open(&args.db_path).expect("Could not open the database file");
    let state = AppState::new(connection, &secret, mailer, PaginationConfig::default())
        .expect("Could not create the database schema");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
}

/// Build a mailer from the `SMTP_*` environment variables.
///
/// All five variables must be set for mail to be sent. Otherwise the mailer
/// is disabled and one-time passwords only show up in the logs.
fn mailer_from_env() -> Mailer {
    let smtp_vars = (
        env::var("SMTP_HOST"),
        env::var("SMTP_PORT"),
        env::var("SMTP_USER"),
        env::var("SMTP_PASSWORD"),
        env::var("SMTP_DISPLAY_NAME"),
    );

    let (Ok(host), Ok(port), Ok(username), Ok(password), Ok(display_name)) = smtp_vars else {
        tracing::info!("SMTP_* variables not set, emails will be logged instead of sent");
        return Mailer::disabled();
    };

    let port = port
        .parse()
        .expect("The environment variable 'SMTP_PORT' must be a port number");

    Mailer::new(&SmtpConfig {
        host,
        port,
        username,
        password,
        display_name,
    })
    .expect("Could not create the SMTP transport")
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
