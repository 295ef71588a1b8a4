//! SQLite-backed store of cache generations.
//!
//! This module provides the persistent key→response mapping the worker
//! builds on, using SQLite with async access via tokio-rusqlite:
//!
//! - Named generations with unique names (idempotent open)
//! - Entries keyed by request identity (method + URL), replaced on write
//! - Whole-generation deletion with cascading entries
//! - Automatic schema migrations

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use generations::Generation;
