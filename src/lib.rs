//! fit-together: FitTogether fitness community client with Hexagonal Architecture.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
