//! Declarative entity metadata.
//!
//! An entity describes itself through a static [`EntityMeta`]: its fields, and the
//! accessor/mutator methods that read and write them. Tags (table, column, id,
//! ignore) sit on those members. Everything else in this module resolves names
//! against that description:
//!
//! - [`enumerator`]: the ordered finder chain with consume/stop signals
//! - [`finders`]: the individual strategies (by name, by column tag, by id tag)
//! - [`resolver`]: table/column/identifier resolution, memoized per type

pub mod enumerator;
pub mod finders;
pub mod resolver;

use std::any::TypeId;

use crate::error::NimbleError;
use crate::types::{Value, ValueType};

pub use enumerator::{MemberFinder, MemberSet, Step};
pub use resolver::{
    ColumnBinding, ColumnMap, EntityDescriptor, IdentifierBinding, KeyGeneration, MetadataResolver,
};

/// Prefix of accessor names: `get_` + member name.
pub const GETTER_PREFIX: &str = "get_";
/// Prefix of mutator names: `set_` + member name.
pub const SETTER_PREFIX: &str = "set_";

/// Accessor name for a member (`first_name` -> `get_first_name`).
#[must_use]
pub fn getter_name(member: &str) -> String {
    format!("{GETTER_PREFIX}{member}")
}

/// Mutator name for a member (`first_name` -> `set_first_name`).
#[must_use]
pub fn setter_name(member: &str) -> String {
    format!("{SETTER_PREFIX}{member}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Getter,
    Setter,
}

/// Identifier tag. `generated` marks keys produced by the database on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdTag {
    pub generated: bool,
}

/// A field or method of an entity, with its declarative tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub name: &'static str,
    pub kind: MemberKind,
    /// Field type, accessor return type, or mutator parameter type
    pub value_type: ValueType,
    pub column: Option<&'static str>,
    pub id: Option<IdTag>,
    pub ignore: bool,
}

impl Member {
    const fn new(name: &'static str, kind: MemberKind, value_type: ValueType) -> Self {
        Self {
            name,
            kind,
            value_type,
            column: None,
            id: None,
            ignore: false,
        }
    }

    #[must_use]
    pub const fn field(name: &'static str, value_type: ValueType) -> Self {
        Self::new(name, MemberKind::Field, value_type)
    }

    #[must_use]
    pub const fn getter(name: &'static str, value_type: ValueType) -> Self {
        Self::new(name, MemberKind::Getter, value_type)
    }

    #[must_use]
    pub const fn setter(name: &'static str, value_type: ValueType) -> Self {
        Self::new(name, MemberKind::Setter, value_type)
    }

    #[must_use]
    pub const fn with_column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    #[must_use]
    pub const fn with_id(mut self) -> Self {
        self.id = Some(IdTag { generated: false });
        self
    }

    #[must_use]
    pub const fn with_generated_id(mut self) -> Self {
        self.id = Some(IdTag { generated: true });
        self
    }

    #[must_use]
    pub const fn with_ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// The declared column name, if one was declared and is non-empty.
    #[must_use]
    pub fn column_tag(&self) -> Option<&'static str> {
        self.column.filter(|c| !c.is_empty())
    }

    #[must_use]
    pub fn is_generated_id(&self) -> bool {
        self.id.is_some_and(|id| id.generated)
    }

    /// For accessors and mutators, the member name with the prefix removed.
    #[must_use]
    pub fn synthesized_name(&self) -> Option<&'static str> {
        let prefix = match self.kind {
            MemberKind::Getter => GETTER_PREFIX,
            MemberKind::Setter => SETTER_PREFIX,
            MemberKind::Field => return None,
        };
        self.name.strip_prefix(prefix).filter(|rest| !rest.is_empty())
    }
}

/// Static description of an entity type.
#[derive(Debug)]
pub struct EntityMeta {
    /// Bare type name, the default table name
    pub type_name: &'static str,
    pub table: Option<&'static str>,
    pub fields: &'static [Member],
    pub methods: &'static [Member],
}

impl EntityMeta {
    /// Declared table name if non-empty, else the bare type name.
    #[must_use]
    pub fn table_name(&self) -> &'static str {
        self.table
            .filter(|t| !t.is_empty())
            .unwrap_or(self.type_name)
    }

    /// Error for an accessor or mutator this type does not have.
    #[must_use]
    pub fn unknown_member(&self, member: &str) -> NimbleError {
        NimbleError::metadata(self.type_name, format!("no member named {member}"))
    }
}

/// Dynamic access to an entity's accessors and mutators by name.
///
/// This is what parameter extraction and identifier application operate on; it
/// is object-safe so any entity can be passed as `&dyn Accessible`.
pub trait Accessible: 'static {
    fn entity_meta(&self) -> &'static EntityMeta;

    /// Invoke the named accessor. `None` if no such accessor exists.
    fn get(&self, accessor: &str) -> Option<Value>;

    /// Invoke the named mutator with an already coerced value.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::MetadataError` for an unknown mutator, or
    /// `NimbleError::ConversionError` if the value doesn't fit the parameter type.
    fn set(&mut self, mutator: &str, value: Value) -> Result<(), NimbleError>;

    /// Identity of the concrete type, used to memoize its descriptor.
    fn entity_type_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}

/// An entity that can also be created empty and described without an instance.
pub trait Entity: Accessible + Default {
    fn meta() -> &'static EntityMeta;
}
