//! SQLite backend for the hemobank blood store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Every approval and adjustment
//! executes inside a single SQLite transaction with a conditional status
//! UPDATE, so concurrent attempts on the same record resolve to exactly one
//! winner.

mod encode;
mod schema;
mod store;

pub use store::SqliteStore;

#[cfg(test)]
mod tests;
