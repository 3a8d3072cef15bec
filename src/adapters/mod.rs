//! Infrastructure adapters. Implement outbound ports.
//!
//! Identity and document store backends, terminal UI. Map errors to DomainError.

pub mod firebase;
pub mod memory;
pub mod password;
pub mod persistence;
pub mod ui;
