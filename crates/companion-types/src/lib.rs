//! Shared type definitions for the Companion simulation.
//!
//! This crate is the single source of truth for everything that crosses
//! the wire between the server and its observers. Types flow downstream
//! to `TypeScript` via `ts-rs` for the mobile client.
//!
//! # Modules
//!
//! - [`enums`] -- Action kinds and vital names
//! - [`structs`] -- The public creature snapshot
//! - [`messages`] -- Inbound action requests and outbound error payloads

pub mod enums;
pub mod messages;
pub mod structs;

pub use enums::{ActionKind, Vital};
pub use messages::{ActionRequest, ErrorCode, ErrorPayload};
pub use structs::CreatureSnapshot;
