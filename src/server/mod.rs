mod clients;
pub mod dto;
mod reminders;
pub mod response;
mod router;
mod session;
pub mod validation;

pub use router::{AppState, auth_router, clients_router, create_router, reminders_router};
