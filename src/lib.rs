//! Named-parameter SQL and declarative entity mapping over a plain database driver.
//!
//! - write SQL with `:name` parameters and bind them from a map, an entity, a
//!   serializable value, or explicit [`NbParams`](extract::NbParams)
//! - read results as typed entities, generic [`Row`](results::Row)s, or maps
//! - insert, update, load, and delete entities by naming convention
//!
//! ```rust
//! use nimble_sql::prelude::*;
//!
//! #[derive(Debug, Default, Entity)]
//! #[nimble(table = "person")]
//! struct Person {
//!     #[nimble(id(generated))]
//!     id: Option<i64>,
//!     first_name: String,
//! }
//!
//! # fn main() -> Result<(), NimbleError> {
//! let nimble = Nimble::new();
//! let mut conn = nimble.open_sqlite_in_memory()?;
//! conn.execute_batch("create table person (id integer primary key, first_name text)")?;
//!
//! let mut tyrion = Person { id: None, first_name: "Tyrion".into() };
//! conn.insert(&mut tyrion)?;
//! assert_eq!(tyrion.id, Some(1));
//!
//! let loaded: Option<Person> = conn.load::<Person>(1_i64)?;
//! assert_eq!(loaded.map(|p| p.first_name), Some("Tyrion".to_string()));
//! # Ok(())
//! # }
//! ```

extern crate self as nimble_sql;

pub mod connection;
pub mod conversion;
pub mod driver;
pub mod error;
pub mod extract;
pub mod meta;
pub mod nimble;
pub mod prelude;
pub mod query_builder;
pub mod results;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod translation;
pub mod types;

pub use connection::NbConnection;
pub use error::{ErrorKind, NimbleError};
pub use nimble::{Nimble, NimbleBuilder, NimbleOptions};
pub use types::{SqlType, Value, ValueType};

#[cfg(feature = "derive")]
pub use nimble_sql_derive::{Entity, SqlEnum};
