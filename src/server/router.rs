use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{get, post, put},
};

use super::{clients, reminders, session};
use crate::auth::AuthPolicy;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: Arc<dyn AuthPolicy>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, auth: Arc<dyn AuthPolicy>) -> Self {
        Self { store, auth }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(session::register))
        .route("/login", post(session::login))
}

pub fn clients_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(clients::list_clients).post(clients::create_client))
        // Registered before /{id} so "export" is never read as a client id
        .route("/export/csv", get(clients::export_clients_csv))
        .route(
            "/{id}",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route("/{id}/contacts", post(clients::add_contact))
}

pub fn reminders_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(reminders::list_reminders).post(reminders::create_reminder),
        )
        .route(
            "/{id}",
            put(reminders::update_reminder).delete(reminders::delete_reminder),
        )
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/auth", auth_router())
        .nest("/api/v1/clients", clients_router())
        .nest("/api/v1/reminders", reminders_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
