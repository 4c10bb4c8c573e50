//! # Clientele
//!
//! A CRM server for tracking clients, contact history, and follow-up
//! reminders. Usable both as a standalone binary and as a library.
//!
//! Every record belongs to exactly one authenticated owner. All store
//! operations are scoped by `(id, owner_id)` at the SQL level, so a row
//! under another owner is indistinguishable from a row that does not
//! exist.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use clientele::auth::BearerTokenPolicy;
//! use clientele::server::{AppState, create_router};
//! use clientele::store::SqliteStore;
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/clientele.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(
//!     Arc::new(store),
//!     Arc::new(BearerTokenPolicy),
//! ));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the server binary. Disable with `default-features = false`.
//! - `insecure-dev-auth`: Allows starting the server with a fixed identity
//!   instead of token verification. Never enable in production.

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod server;
pub mod store;
pub mod types;
