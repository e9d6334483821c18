//! Core domain types for the hemobank blood-donation coordinator.
//!
//! This crate defines the entities (users, donations, requests, stock, the
//! audit log), the [`store::BloodStore`] trait implemented by storage
//! backends, and the shared error taxonomy. It has no I/O of its own.

pub mod blood;
pub mod donation;
pub mod error;
pub mod inventory;
pub mod request;
pub mod store;
pub mod user;

pub use error::{Error, Result};
