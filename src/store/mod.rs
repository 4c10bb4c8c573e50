mod query;
mod schema;
mod sqlite;

pub use query::{ClientQuery, DEFAULT_LIMIT, DEFAULT_PAGE, Page};
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Every client, contact, and reminder operation takes the acting
/// owner's id and filters by `(id, owner_id)` jointly. A record under
/// a different owner is reported as absent, never as forbidden.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    // API token operations
    fn create_token(&self, token: &ApiToken) -> Result<()>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<ApiToken>>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    // Client operations
    fn create_client(&self, client: &Client) -> Result<()>;
    fn get_client(&self, owner_id: &str, id: &str) -> Result<Option<Client>>;
    fn list_clients(&self, owner_id: &str, query: &ClientQuery) -> Result<Page<Client>>;
    fn list_all_clients(&self, owner_id: &str) -> Result<Vec<Client>>;
    fn update_client(&self, client: &Client) -> Result<()>;
    fn delete_client(&self, owner_id: &str, id: &str) -> Result<bool>;

    // Contact operations (append-only; removed via the client cascade)
    fn create_contact(&self, contact: &Contact) -> Result<()>;
    fn list_client_contacts(&self, client_id: &str) -> Result<Vec<Contact>>;

    // Reminder operations
    fn create_reminder(&self, reminder: &Reminder) -> Result<()>;
    fn get_reminder(&self, owner_id: &str, id: &str) -> Result<Option<Reminder>>;
    fn list_reminders(&self, owner_id: &str, pending_only: bool) -> Result<Vec<Reminder>>;
    fn update_reminder(&self, reminder: &Reminder) -> Result<()>;
    fn delete_reminder(&self, owner_id: &str, id: &str) -> Result<bool>;

    fn close(&self) -> Result<()>;
}
