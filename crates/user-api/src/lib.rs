//! # user-api
//!
//! HTTP/JSON routes for user records.
//!
//! Wraps a [`UserStore`] in an Axum router. Handlers decode and validate the
//! payload, make exactly one adapter call, and map the outcome to a status
//! code. The store is shared by all handlers with no coordination in front
//! of it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use user_store::{MemoryStore, UserStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let users = UserStore::new(MemoryStore::new());
//!     user_api::start("127.0.0.1:8000", users).await.unwrap();
//! }
//! ```

mod api;
mod error;

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::{info, warn};
use user_store::{HashStore, UserStore};

pub use api::{ErrorBody, HealthResponse, MessageResponse, UsersResponse};
pub use error::ApiError;

/// Shared application state for Axum handlers.
pub(crate) struct AppState<S: HashStore> {
    pub users: UserStore<S>,
}

/// Build the router over `users`.
///
/// | Route | Operation |
/// |-------|-----------|
/// | `GET /` | welcome message |
/// | `GET /health` | store round trip |
/// | `POST /users/` | create |
/// | `GET /users/` | list all |
/// | `GET /users/{email}` | read |
/// | `PUT /users/{email}` | update |
/// | `DELETE /users/{email}` | delete |
///
/// The collection routes answer on both `/users` and `/users/`.
pub fn router<S>(users: UserStore<S>) -> Router
where
    S: HashStore + Send + Sync + 'static,
{
    let state = Arc::new(AppState { users });

    Router::new()
        .route("/", get(api::index))
        .route("/health", get(api::health::<S>))
        .route(
            "/users",
            get(api::list_users::<S>).post(api::create_user::<S>),
        )
        .route(
            "/users/",
            get(api::list_users::<S>).post(api::create_user::<S>),
        )
        .route(
            "/users/{email}",
            get(api::get_user::<S>)
                .put(api::update_user::<S>)
                .delete(api::delete_user::<S>),
        )
        .with_state(state)
}

/// Serve `users` on an already bound listener until Ctrl-C.
pub async fn serve<S>(listener: TcpListener, users: UserStore<S>) -> std::io::Result<()>
where
    S: HashStore + Send + Sync + 'static,
{
    let app = router(users);
    info!(addr = %listener.local_addr()?, "user API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Bind `addr` and serve `users` on it.
///
/// This function blocks until the server is shut down (Ctrl-C).
pub async fn start<S>(addr: &str, users: UserStore<S>) -> Result<(), Box<dyn std::error::Error>>
where
    S: HashStore + Send + Sync + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    serve(listener, users).await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
