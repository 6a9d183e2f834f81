//! Core types and session logic for the Roster school console.
//!
//! This crate is deliberately free of terminal and database dependencies.
//! It holds the capability registry and permission gate, the student
//! aggregate with its nested collections, the in-memory aggregate store, and
//! the selection/modal orchestrator that keeps list, detail and edit views in
//! step with the store.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod capability;
pub mod editors;
pub mod entry;
pub mod error;
pub mod gate;
pub mod nav;
pub mod orchestrator;
pub mod settings;
pub mod store;
pub mod student;

pub use error::{Error, Result};
