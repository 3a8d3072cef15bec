//! Local persistence: libsql backend and the session file.

pub mod session_file;
pub mod sqlite_backend;

pub use session_file::SessionFile;
pub use sqlite_backend::SqliteBackend;
