use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::Store;
use super::query::{ClientQuery, Page};
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::from_connection(Connection::open(db_path)?)
    }

    /// Opens a private in-memory database. Useful for tests and
    /// embedded library use.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        // SQLite's built-in lower() folds ASCII only; search needs the
        // full Unicode fold so "MÜLLER" matches a stored "müller".
        conn.create_scalar_function(
            "lower_fold",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| Ok(ctx.get::<String>(0)?.to_lowercase()),
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn conversion_failure(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, message.into())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    let status: String = row.get(5)?;
    Ok(Client {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        status: status
            .parse()
            .map_err(|_| conversion_failure(5, format!("invalid client status '{status}'")))?,
        notes: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    let contact_type: String = row.get(4)?;
    Ok(Contact {
        id: row.get(0)?,
        client_id: row.get(1)?,
        owner_id: row.get(2)?,
        date: parse_datetime(&row.get::<_, String>(3)?),
        contact_type: contact_type
            .parse()
            .map_err(|_| conversion_failure(4, format!("invalid contact type '{contact_type}'")))?,
        note: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn reminder_from_row(row: &Row<'_>) -> rusqlite::Result<Reminder> {
    Ok(Reminder {
        id: row.get(0)?,
        client_id: row.get(1)?,
        owner_id: row.get(2)?,
        due_date: parse_datetime(&row.get::<_, String>(3)?),
        message: row.get(4)?,
        done: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

const CLIENT_COLUMNS: &str = "id, owner_id, name, phone, email, status, notes, created_at, updated_at";
const CONTACT_COLUMNS: &str = "id, client_id, owner_id, date, type, note, created_at, updated_at";
const REMINDER_COLUMNS: &str =
    "id, client_id, owner_id, due_date, message, done, created_at, updated_at";

/// Builds the WHERE clause and parameters shared by the count and the
/// fetch of a client listing, so both run against the same selection.
fn compose_client_selection(owner_id: &str, query: &ClientQuery) -> (String, Vec<Value>) {
    let mut clause = String::from("owner_id = ?1");
    let mut params: Vec<Value> = vec![owner_id.to_string().into()];

    if let Some(status) = query.status() {
        params.push(status.to_string().into());
        clause.push_str(&format!(" AND status = ?{}", params.len()));
    }

    if let Some(term) = query.term() {
        params.push(term.to_lowercase().into());
        let n = params.len();
        clause.push_str(&format!(
            " AND (instr(lower_fold(name), ?{n}) > 0 \
             OR instr(lower_fold(coalesce(phone, '')), ?{n}) > 0 \
             OR instr(lower_fold(coalesce(email, '')), ?{n}) > 0)"
        ));
    }

    (clause, params)
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.name,
                user.email,
                user.password_hash,
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, email, password_hash, created_at, updated_at
             FROM users WHERE id = ?1",
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, email, password_hash, created_at, updated_at
             FROM users WHERE email = ?1",
            params![email],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    // API token operations

    fn create_token(&self, token: &ApiToken) -> Result<()> {
        self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.user_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
                token.last_used_at.as_ref().map(format_datetime),
            ],
        )?;
        Ok(())
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<ApiToken>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at
             FROM tokens WHERE token_lookup = ?1",
            params![lookup],
            |row| {
                Ok(ApiToken {
                    id: row.get(0)?,
                    token_hash: row.get(1)?,
                    token_lookup: row.get(2)?,
                    user_id: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    expires_at: row.get::<_, Option<String>>(5)?.map(|s| parse_datetime(&s)),
                    last_used_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Client operations

    fn create_client(&self, client: &Client) -> Result<()> {
        self.conn().execute(
            "INSERT INTO clients (id, owner_id, name, phone, email, status, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                client.id,
                client.owner_id,
                client.name,
                client.phone,
                client.email,
                client.status.as_str(),
                client.notes,
                format_datetime(&client.created_at),
                format_datetime(&client.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_client(&self, owner_id: &str, id: &str) -> Result<Option<Client>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1 AND owner_id = ?2"),
            params![id, owner_id],
            client_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_clients(&self, owner_id: &str, query: &ClientQuery) -> Result<Page<Client>> {
        query.validate()?;

        let (clause, mut values) = compose_client_selection(owner_id, query);
        let conn = self.conn();

        // Count before pagination; the window below sees the same filter.
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM clients WHERE {clause}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let limit_param = values.len() + 1;
        let offset_param = values.len() + 2;
        values.push(query.limit.into());
        values.push(query.offset().into());

        let mut stmt = conn.prepare(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE {clause}
             ORDER BY updated_at DESC, id DESC LIMIT ?{limit_param} OFFSET ?{offset_param}"
        ))?;
        let rows = stmt.query_map(params_from_iter(values.iter()), client_from_row)?;
        let items = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total, query))
    }

    fn list_all_clients(&self, owner_id: &str) -> Result<Vec<Client>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE owner_id = ?1 ORDER BY updated_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![owner_id], client_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_client(&self, client: &Client) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE clients SET name = ?1, phone = ?2, email = ?3, status = ?4, notes = ?5, updated_at = ?6
             WHERE id = ?7 AND owner_id = ?8",
            params![
                client.name,
                client.phone,
                client.email,
                client.status.as_str(),
                client.notes,
                format_datetime(&client.updated_at),
                client.id,
                client.owner_id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_client(&self, owner_id: &str, id: &str) -> Result<bool> {
        // Contacts referencing the client go with it (ON DELETE CASCADE);
        // reminders keep their client_id and stay behind.
        let rows = self.conn().execute(
            "DELETE FROM clients WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(rows > 0)
    }

    // Contact operations

    fn create_contact(&self, contact: &Contact) -> Result<()> {
        self.conn().execute(
            "INSERT INTO contacts (id, client_id, owner_id, date, type, note, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                contact.id,
                contact.client_id,
                contact.owner_id,
                format_datetime(&contact.date),
                contact.contact_type.as_str(),
                contact.note,
                format_datetime(&contact.created_at),
                format_datetime(&contact.updated_at),
            ],
        )?;
        Ok(())
    }

    fn list_client_contacts(&self, client_id: &str) -> Result<Vec<Contact>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE client_id = ?1 ORDER BY date DESC, created_at DESC"
        ))?;
        let rows = stmt.query_map(params![client_id], contact_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Reminder operations

    fn create_reminder(&self, reminder: &Reminder) -> Result<()> {
        self.conn().execute(
            "INSERT INTO reminders (id, client_id, owner_id, due_date, message, done, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                reminder.id,
                reminder.client_id,
                reminder.owner_id,
                format_datetime(&reminder.due_date),
                reminder.message,
                reminder.done,
                format_datetime(&reminder.created_at),
                format_datetime(&reminder.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_reminder(&self, owner_id: &str, id: &str) -> Result<Option<Reminder>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?1 AND owner_id = ?2"),
            params![id, owner_id],
            reminder_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_reminders(&self, owner_id: &str, pending_only: bool) -> Result<Vec<Reminder>> {
        let conn = self.conn();
        let sql = if pending_only {
            format!(
                "SELECT {REMINDER_COLUMNS} FROM reminders
                 WHERE owner_id = ?1 AND done = 0 ORDER BY due_date ASC"
            )
        } else {
            format!(
                "SELECT {REMINDER_COLUMNS} FROM reminders
                 WHERE owner_id = ?1 ORDER BY due_date ASC"
            )
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![owner_id], reminder_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_reminder(&self, reminder: &Reminder) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE reminders SET client_id = ?1, due_date = ?2, message = ?3, done = ?4, updated_at = ?5
             WHERE id = ?6 AND owner_id = ?7",
            params![
                reminder.client_id,
                format_datetime(&reminder.due_date),
                reminder.message,
                reminder.done,
                format_datetime(&reminder.updated_at),
                reminder.id,
                reminder.owner_id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_reminder(&self, owner_id: &str, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM reminders WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(rows > 0)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
