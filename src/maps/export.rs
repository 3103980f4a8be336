use super::MapKind;
use crate::db::Database;
use crate::Result;
use std::io::Write;

/// Write every `kind` record to `out`, one line each, in name order
///
/// Returns the number of lines written.
pub fn export<W: Write>(db: &Database, kind: MapKind, out: &mut W) -> Result<usize> {
    let lines = match kind {
        MapKind::Access => db.access().export()?,
        MapKind::Transport => db.transports().export()?,
        MapKind::Domain => db.domains().export()?,
        MapKind::Address => db.addresses().export()?,
        MapKind::Mailbox => db.mailboxes().export()?,
        MapKind::VirtualAlias | MapKind::LocalAlias => match kind.alias_kind() {
            Some(alias_kind) => db.aliases().export(alias_kind)?,
            None => Vec::new(),
        },
    };

    for line in &lines {
        writeln!(out, "{}", line)?;
    }
    tracing::debug!(kind = %kind, records = lines.len(), "Map exported");
    Ok(lines.len())
}
