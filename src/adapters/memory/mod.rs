//! In-process backend: identity provider and document store held in memory.

pub mod identity;
pub mod store;

pub use identity::MemoryIdentityProvider;
pub use store::MemoryDocumentStore;
