mod models;
mod status;

pub use models::*;
pub use status::{ClientStatus, ContactType};
