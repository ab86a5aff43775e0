// crates/capmesh-store-sqlite/src/lib.rs
// ============================================================================
// Module: Capmesh SQLite Store
// Description: Durable store backends over SQLite WAL.
// Purpose: Persist registry, namespace, and forward state across restarts.
// Dependencies: capmesh-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! One SQLite database backs all three Capmesh store contracts: registered
//! service targets, namespace pool slots, and forward references. Records
//! are stored as canonical JSON payload columns with the natural key as the
//! primary key, matching the access pattern the routing core needs: point
//! lookups and full loads. Reads fail closed on undecodable payloads.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

pub use store::SqliteStore;
