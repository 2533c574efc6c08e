// testdeck-store-sqlite/src/lib.rs
// ============================================================================
// Module: Testdeck SQLite Store Library
// Description: Durable SQLite-backed implementation of the core interfaces.
// Purpose: Persist identities, ACL rows, and domain entities.
// Dependencies: testdeck-core, rusqlite
// ============================================================================

//! ## Overview
//! `testdeck-store-sqlite` implements the Testdeck storage interfaces over a
//! single `SQLite` database: the credential cache, the user directory, the
//! access-control store, the quota source, and the thin domain-entity
//! persistence. One shared connection is guarded by a mutex; multi-statement
//! operations run in explicit transactions.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod acl;
mod domain;
mod identity;
mod quota;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
