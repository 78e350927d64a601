//! redb table definitions.

use redb::TableDefinition;

/// Hosts keyed by host id. Value: JSON `Host`.
pub const HOSTS: TableDefinition<&str, &[u8]> = TableDefinition::new("hosts");

/// Action records keyed by their monotonically increasing id. Value: JSON `ActionRecord`.
pub const ACTIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("actions");

/// Index of pending actions.
///
/// Key: 16-byte composite `[created_at_ms: u64 BE | id: u64 BE]`, value: id.
/// Big-endian encoding makes byte order equal (creation time, id) order, so
/// the first entry is always the next action to claim.
pub const PENDING_ACTIONS: TableDefinition<&[u8], u64> = TableDefinition::new("pending_actions");
