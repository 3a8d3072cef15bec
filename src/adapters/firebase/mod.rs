//! Managed backend: Firebase Identity Toolkit + Cloud Firestore over REST.

pub mod auth;
pub mod codec;
pub mod firestore;

pub use auth::FirebaseAuthAdapter;
pub use firestore::FirestoreAdapter;
