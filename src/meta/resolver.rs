use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use indexmap::IndexMap;
use tracing::trace;

use super::enumerator::MemberSet;
use super::finders::{FieldById, FieldByName, GetterById, MethodByName};
use super::{Accessible, Entity, EntityMeta, Member, MemberKind, getter_name, setter_name};
use crate::conversion::ConverterRegistry;
use crate::error::NimbleError;
use crate::types::Value;

/// Column name to value, in accessor declaration order.
pub type ColumnMap = IndexMap<String, Value>;

static GLOBAL: LazyLock<MetadataResolver> = LazyLock::new(MetadataResolver::new);

/// A writable column and the accessor that supplies its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    pub column: String,
    pub getter: &'static str,
}

/// The identifier column and the accessor that supplies its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierBinding {
    pub column: String,
    pub getter: &'static str,
}

/// Where an inserted row's identifier value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGeneration {
    /// Tagged `id(generated)`: the database assigns it.
    Generated,
    /// Untagged member named `id`: a database key fills it while it is null.
    WhenNull,
    /// Tagged `id`: the caller supplies it and it is never overwritten.
    Supplied,
}

impl KeyGeneration {
    fn of(member: &Member) -> Self {
        match member.id {
            Some(tag) if tag.generated => KeyGeneration::Generated,
            Some(_) => KeyGeneration::Supplied,
            None => KeyGeneration::WhenNull,
        }
    }
}

/// Everything the resolver derives from a type's metadata.
///
/// Failed lookups are kept as `None` and only reported when an operation needs them,
/// so a type without an identifier can still be inserted.
#[derive(Debug)]
pub struct EntityDescriptor {
    pub type_name: &'static str,
    pub table: &'static str,
    pub columns: Vec<ColumnBinding>,
    pub identifier: Option<IdentifierBinding>,
    pub identifier_member: Option<&'static str>,
    pub key_generation: KeyGeneration,
    pub identifier_setter: Option<&'static Member>,
}

fn getters(meta: &'static EntityMeta) -> impl Iterator<Item = &'static Member> {
    meta.methods
        .iter()
        .filter(|m| m.kind == MemberKind::Getter && m.synthesized_name().is_some())
}

/// Field by name, ignored fields included.
fn find_field(meta: &'static EntityMeta, name: &str, ignore_case: bool) -> Option<&'static Member> {
    let mut finder = if ignore_case {
        FieldByName::ignoring_case(name)
    } else {
        FieldByName::exact(name)
    };
    MemberSet::including_ignored(meta.fields).enumerate(&mut [&mut finder]);
    finder.matched.map(|i| &meta.fields[i])
}

fn resolve_columns(meta: &'static EntityMeta) -> Vec<ColumnBinding> {
    let mut fields = MemberSet::including_ignored(meta.fields);
    let mut columns = Vec::new();

    for getter in getters(meta) {
        if getter.ignore || getter.is_generated_id() {
            continue;
        }
        let Some(name) = getter.synthesized_name() else {
            continue;
        };

        let mut finder = FieldByName::exact(name);
        fields.enumerate(&mut [&mut finder]);
        let mut column = None;
        if let Some(index) = finder.matched {
            fields.claim(index);
            let field = fields.get(index);
            if field.ignore || field.is_generated_id() {
                continue;
            }
            column = field.column_tag();
        }

        let column = column.or(getter.column_tag()).unwrap_or(name);
        columns.push(ColumnBinding {
            column: column.to_string(),
            getter: getter.name,
        });
    }
    columns
}

fn resolve_identifier(meta: &'static EntityMeta) -> Option<IdentifierBinding> {
    let mut fallback = None;
    for getter in getters(meta) {
        let Some(name) = getter.synthesized_name() else {
            continue;
        };
        let field = find_field(meta, name, true);
        let tagged = getter.id.is_some() || field.is_some_and(|f| f.id.is_some());
        if tagged {
            return Some(identifier_binding(getter, field, name));
        }
        if fallback.is_none() && name == "id" {
            fallback = Some(identifier_binding(getter, field, name));
        }
    }
    fallback
}

fn identifier_binding(
    getter: &'static Member,
    field: Option<&'static Member>,
    name: &'static str,
) -> IdentifierBinding {
    let column = field
        .and_then(Member::column_tag)
        .or(getter.column_tag())
        .unwrap_or(name);
    IdentifierBinding {
        column: column.to_string(),
        getter: getter.name,
    }
}

fn resolve_identifier_member(meta: &'static EntityMeta) -> Option<(&'static str, KeyGeneration)> {
    let mut by_id = FieldById::default();
    let mut by_name = FieldByName::ignoring_case("id");
    MemberSet::new(meta.fields).enumerate(&mut [&mut by_id, &mut by_name]);
    if let Some(index) = by_id.matched.or(by_name.matched) {
        let field = &meta.fields[index];
        return Some((field.name, KeyGeneration::of(field)));
    }

    let mut finder = GetterById::default();
    MemberSet::new(meta.methods).enumerate(&mut [&mut finder]);
    let getter = &meta.methods[finder.matched?];
    let name = getter.synthesized_name()?;
    let member = find_field(meta, name, true).map_or(name, |field| field.name);
    Some((member, KeyGeneration::of(getter)))
}

fn resolve_setter(meta: &'static EntityMeta, member: &str) -> Option<&'static Member> {
    let mut finder = MethodByName::new(&setter_name(member), MemberKind::Setter);
    MemberSet::new(meta.methods).enumerate(&mut [&mut finder]);
    finder.matched.map(|i| &meta.methods[i])
}

impl EntityDescriptor {
    #[must_use]
    pub fn from_meta(meta: &'static EntityMeta) -> Self {
        let resolved = resolve_identifier_member(meta);
        let identifier_member = resolved.map(|(member, _)| member);
        Self {
            type_name: meta.type_name,
            table: meta.table_name(),
            columns: resolve_columns(meta),
            identifier: resolve_identifier(meta),
            identifier_member,
            key_generation: resolved.map_or(KeyGeneration::Supplied, |(_, key)| key),
            identifier_setter: identifier_member.and_then(|m| resolve_setter(meta, m)),
        }
    }

    /// # Errors
    ///
    /// Returns `NimbleError::MetadataError` if the type has no identifier accessor.
    pub fn identifier(&self) -> Result<&IdentifierBinding, NimbleError> {
        self.identifier
            .as_ref()
            .ok_or_else(|| NimbleError::metadata(self.type_name, "no identifier accessor"))
    }

    /// # Errors
    ///
    /// Returns `NimbleError::MetadataError` if no identifier member exists.
    pub fn identifier_member(&self) -> Result<&'static str, NimbleError> {
        self.identifier_member
            .ok_or_else(|| NimbleError::metadata(self.type_name, "no identifier member"))
    }

    /// Whether a key generated while inserting `obj` belongs on its identifier.
    #[must_use]
    pub fn takes_generated_key(&self, obj: &dyn Accessible) -> bool {
        let Some(member) = self.identifier_member else {
            return false;
        };
        match self.key_generation {
            KeyGeneration::Generated => true,
            KeyGeneration::Supplied => false,
            KeyGeneration::WhenNull => obj.get(&getter_name(member)).is_none_or(|v| v.is_null()),
        }
    }

    /// Values of every writable column of `obj`.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::MetadataError` if a listed accessor is not implemented.
    pub fn column_map(&self, obj: &dyn Accessible) -> Result<ColumnMap, NimbleError> {
        let mut map = ColumnMap::with_capacity(self.columns.len());
        for binding in &self.columns {
            let value = invoke(obj, binding.getter)?;
            map.insert(binding.column.clone(), value);
        }
        Ok(map)
    }

    /// Single-entry map of identifier column to identifier value.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::MetadataError` if the type has no identifier accessor.
    pub fn identifier_column_map(&self, obj: &dyn Accessible) -> Result<ColumnMap, NimbleError> {
        let binding = self.identifier()?;
        let mut map = ColumnMap::with_capacity(1);
        map.insert(binding.column.clone(), invoke(obj, binding.getter)?);
        Ok(map)
    }

    /// Store a raw key (typically a generated one) through the identifier's mutator.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::MetadataError` if there is no identifier member or no
    /// mutator for it, and `NimbleError::ConversionError` if the key can't be
    /// converted to the mutator's parameter type.
    pub fn apply_identifier(
        &self,
        raw: Value,
        obj: &mut dyn Accessible,
        registry: &ConverterRegistry,
    ) -> Result<(), NimbleError> {
        let member = self.identifier_member()?;
        let setter = self.identifier_setter.ok_or_else(|| {
            NimbleError::metadata(self.type_name, format!("no mutator for identifier {member}"))
        })?;
        let value = registry.from_storage(raw, setter.value_type)?;
        obj.set(setter.name, value)
    }
}

fn invoke(obj: &dyn Accessible, getter: &str) -> Result<Value, NimbleError> {
    obj.get(getter)
        .ok_or_else(|| obj.entity_meta().unknown_member(getter))
}

/// Resolves and memoizes [`EntityDescriptor`]s per concrete type.
///
/// Metadata is static, so a descriptor computed once stays valid for the life of
/// the process. Readers share the lock; a miss computes the descriptor outside
/// the lock and keeps whichever copy was stored first.
#[derive(Debug, Default)]
pub struct MetadataResolver {
    cache: RwLock<HashMap<TypeId, Arc<EntityDescriptor>>>,
}

impl MetadataResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide resolver.
    #[must_use]
    pub fn global() -> &'static MetadataResolver {
        &GLOBAL
    }

    fn describe(&self, type_id: TypeId, meta: &'static EntityMeta) -> Arc<EntityDescriptor> {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(descriptor) = cache.get(&type_id) {
                return Arc::clone(descriptor);
            }
        }

        trace!(entity = meta.type_name, "resolving entity metadata");
        let descriptor = Arc::new(EntityDescriptor::from_meta(meta));
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(type_id).or_insert(descriptor))
    }

    #[must_use]
    pub fn descriptor<T: Entity>(&self) -> Arc<EntityDescriptor> {
        self.describe(TypeId::of::<T>(), T::meta())
    }

    #[must_use]
    pub fn descriptor_of(&self, obj: &dyn Accessible) -> Arc<EntityDescriptor> {
        self.describe(obj.entity_type_id(), obj.entity_meta())
    }

    /// Declared table name, else the bare type name.
    #[must_use]
    pub fn table_name<T: Entity>(&self) -> &'static str {
        self.descriptor::<T>().table
    }

    /// # Errors
    ///
    /// See [`EntityDescriptor::column_map`].
    pub fn column_map(&self, obj: &dyn Accessible) -> Result<ColumnMap, NimbleError> {
        self.descriptor_of(obj).column_map(obj)
    }

    /// # Errors
    ///
    /// See [`EntityDescriptor::identifier_column_map`].
    pub fn identifier_column_map(&self, obj: &dyn Accessible) -> Result<ColumnMap, NimbleError> {
        self.descriptor_of(obj).identifier_column_map(obj)
    }

    /// Name of the member a generated key is written back to.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::MetadataError` if none is found.
    pub fn identifier_member<T: Entity>(&self) -> Result<&'static str, NimbleError> {
        self.descriptor::<T>().identifier_member()
    }

    /// # Errors
    ///
    /// See [`EntityDescriptor::apply_identifier`].
    pub fn apply_identifier(
        &self,
        raw: Value,
        obj: &mut dyn Accessible,
        registry: &ConverterRegistry,
    ) -> Result<(), NimbleError> {
        self.descriptor_of(&*obj).apply_identifier(raw, obj, registry)
    }

    /// Column holding the identifier, as used by `load` and `delete_by_id`.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::MetadataError` if the type has no identifier accessor.
    pub fn identifier_column<T: Entity>(&self) -> Result<String, NimbleError> {
        Ok(self.descriptor::<T>().identifier()?.column.clone())
    }

    /// Number of types resolved so far.
    #[must_use]
    pub fn cached_types(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
