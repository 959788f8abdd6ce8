//! Convenient imports for common functionality.
//!
//! This module re-exports the types most callers need: the context and
//! connection, parameter sources, result shapes, the value model, and errors.

pub use crate::connection::NbConnection;
pub use crate::conversion::{ConverterRegistry, ConverterRegistryBuilder};
pub use crate::driver::{BufferedCursor, Connection, Cursor, Statement};
pub use crate::error::{ErrorKind, NimbleError};
pub use crate::extract::{NbParams, ParamSource, ValueMap};
pub use crate::meta::{Accessible, Entity, EntityMeta, Member, MetadataResolver};
pub use crate::nimble::{Nimble, NimbleBuilder, NimbleOptions};
pub use crate::query_builder::NbQuery;
pub use crate::results::{
    ExecuteOutcome, GenericRowMapper, MapMapper, Row, RowMap, RowMapper, TypedRecordMapper,
};
pub use crate::translation::PlaceholderStyle;
pub use crate::types::{EnumType, SqlEnum, SqlType, Value, ValueType};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnection;

#[cfg(feature = "derive")]
pub use nimble_sql_derive::{Entity, SqlEnum};
