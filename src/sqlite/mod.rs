// SQLite driver built on rusqlite.
//
// - connection: Connection/Statement implementations
// - params: Value -> rusqlite value conversion for binding
// - query: row extraction into buffered cursors

pub mod connection;
pub mod params;
pub mod query;

pub use connection::SqliteConnection;
pub use params::to_sqlite_value;
pub use query::{build_cursor, extract_value};
