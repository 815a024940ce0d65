//! Patient opt-out HTTP API
//!
//! Citizens look up their record (returned redacted), request and verify a
//! one-time validation code, then record a data-sharing decision. Consumer
//! systems fetch the decisions they have not adopted and acknowledge them.
//! Administrators manage every entity through bearer-token protected CRUD.

pub mod clock;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod redaction;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;
pub mod validation;
pub mod validation_code;

pub use error::*;
pub use server::{OptOutServer, ServerDependencies, StartupError};

use std::time::Duration;

use axum::{middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Create the main application router with all routes and middleware
pub fn create_app(server: OptOutServer) -> Router {
    let settings = &server.config.server;
    let cors = middleware::create_cors_layer(&settings.cors_allowed_origins);
    let timeout = Duration::from_secs(settings.request_timeout_secs);

    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(TimeoutLayer::new(timeout))
                .layer(from_fn(middleware::request_timing_middleware)),
        )
        .with_state(server)
}
