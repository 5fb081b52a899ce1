//! Pennywise is a personal finance bookkeeping service.
//!
//! Users register and authenticate with rotating JSON web tokens, record
//! income and expense transactions, define budgets per category and period,
//! and read derived analytics: summaries, trends, forecasts and
//! budget-vs-actual reports.
//!
//! This library provides a REST API that serves JSON.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod analytics;
mod app_state;
mod auth;
mod budget;
mod category;
mod config;
mod database_id;
mod date_range;
mod db;
mod endpoints;
mod error;
mod extract;
mod logging;
mod pagination;
mod response;
mod routing;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use auth::{PasswordHash, TokenKeys, User, UserID, ValidatedPassword};
pub use config::Environment;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
