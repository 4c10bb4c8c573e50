use csv::Writer;

use crate::error::Result;
use crate::types::Client;

/// Column order is a compatibility surface; consumers of the exported
/// file rely on these exact headers.
const EXPORT_COLUMNS: [&str; 7] = [
    "id",
    "name",
    "phone",
    "email",
    "status",
    "createdAt",
    "updatedAt",
];

/// Renders a full client snapshot as RFC 4180 CSV with a header row.
/// All-or-nothing: any serialization failure aborts the whole export.
pub fn clients_to_csv(clients: &[Client]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());

    writer.write_record(EXPORT_COLUMNS)?;

    for client in clients {
        writer.write_record([
            client.id.as_str(),
            client.name.as_str(),
            client.phone.as_deref().unwrap_or(""),
            client.email.as_deref().unwrap_or(""),
            client.status.as_str(),
            &client.created_at.to_rfc3339(),
            &client.updated_at.to_rfc3339(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| crate::error::Error::Config(format!("failed to flush csv: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| crate::error::Error::Config(format!("export produced invalid utf-8: {e}")))
}
