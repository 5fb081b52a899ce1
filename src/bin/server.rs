use std::{net::SocketAddr, process::ExitCode};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pennywise::{
    AppState, Environment, TokenKeys, build_router, graceful_shutdown, logging_middleware,
};

/// The REST API server for pennywise.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The environment the server runs in, production hides internal error details.
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = Environment::Development)]
    environment: Environment,

    /// The canonical timezone that decides what today is, e.g. "Pacific/Auckland".
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// The secret that signs access tokens.
    #[arg(long, env = "ACCESS_TOKEN_SECRET", hide_env_values = true)]
    access_token_secret: String,

    /// The secret that signs refresh tokens, must differ from the access token secret.
    #[arg(long, env = "REFRESH_TOKEN_SECRET", hide_env_values = true)]
    refresh_token_secret: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    setup_logging(args.environment);

    let token_keys = match token_keys(&args) {
        Ok(token_keys) => token_keys,
        Err(message) => {
            tracing::error!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let connection = match Connection::open(&args.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not open the database at {}: {error}", args.db_path);
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(connection, token_keys, args.environment, &args.timezone) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not start the server: {error}");
            return ExitCode::FAILURE;
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!(
        "HTTP server listening on {addr} in {} mode",
        args.environment
    );

    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Build the token keys from the secrets given on the command line or in the environment.
fn token_keys(args: &Args) -> Result<TokenKeys, String> {
    if args.access_token_secret == args.refresh_token_secret {
        return Err(
            "'ACCESS_TOKEN_SECRET' and 'REFRESH_TOKEN_SECRET' must be different".to_owned(),
        );
    }

    Ok(TokenKeys::new(
        &args.access_token_secret,
        &args.refresh_token_secret,
    ))
}

fn setup_logging(environment: Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    match environment {
        Environment::Development => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
        Environment::Test | Environment::Production => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
    }
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
        // Errors are logged where they are converted into responses
        .on_failure(());

    router.layer(tracing_layer)
}
