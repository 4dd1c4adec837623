// Persistence for credentials and the manager/client hierarchy.

pub mod in_memory;
pub mod sqlite_credential_store;
pub mod sqlite_hierarchy_store;
pub mod sqlite_pool;

pub use in_memory::{InMemoryCredentialStore, InMemoryHierarchyStore};
pub use sqlite_credential_store::SqliteCredentialStore;
pub use sqlite_hierarchy_store::SqliteHierarchyStore;
pub use sqlite_pool::connect_sqlite;
