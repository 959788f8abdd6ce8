use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;

use super::row::{Row, index_cache};
use crate::conversion::ConverterRegistry;
use crate::driver::Cursor;
use crate::error::NimbleError;
use crate::meta::finders::{FieldByColumn, FieldByName, GetterByColumn, MethodByName};
use crate::meta::{Entity, EntityMeta, Member, MemberKind, MemberSet, setter_name};
use crate::types::Value;

/// Column name to raw value for one row.
pub type RowMap = IndexMap<String, Value>;

/// Turns the current row of a cursor into a value.
///
/// Mappers may keep per-query state (column names, resolution plans) computed from
/// the first row, so one mapper instance should serve a single query.
pub trait RowMapper {
    type Output;

    /// # Errors
    ///
    /// Returns an error if the row can't be read or mapped.
    fn create(&mut self, cursor: &dyn Cursor) -> Result<Self::Output, NimbleError>;
}

/// Drain `cursor` through `mapper`.
///
/// # Errors
///
/// Propagates the first cursor or mapping error.
pub fn map_rows<M: RowMapper>(
    mapper: &mut M,
    cursor: &mut dyn Cursor,
) -> Result<Vec<M::Output>, NimbleError> {
    let mut out = Vec::new();
    while cursor.next()? {
        out.push(mapper.create(cursor)?);
    }
    Ok(out)
}

fn column_names(cursor: &dyn Cursor) -> Result<Vec<String>, NimbleError> {
    (0..cursor.column_count())
        .map(|i| cursor.column_name(i).map(str::to_string))
        .collect()
}

fn row_values(cursor: &dyn Cursor) -> Result<Vec<Value>, NimbleError> {
    (0..cursor.column_count()).map(|i| cursor.value(i)).collect()
}

/// Maps each row to column name -> raw value. A repeated column name keeps the last value.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapMapper;

impl RowMapper for MapMapper {
    type Output = RowMap;

    fn create(&mut self, cursor: &dyn Cursor) -> Result<RowMap, NimbleError> {
        let mut map = RowMap::with_capacity(cursor.column_count());
        for i in 0..cursor.column_count() {
            map.insert(cursor.column_name(i)?.to_string(), cursor.value(i)?);
        }
        Ok(map)
    }
}

/// Maps each row to a [`Row`]; column names are read once, from the first row.
#[derive(Debug)]
pub struct GenericRowMapper {
    registry: Arc<ConverterRegistry>,
    columns: Option<(Arc<Vec<String>>, Arc<HashMap<String, usize>>)>,
}

impl GenericRowMapper {
    #[must_use]
    pub fn new(registry: Arc<ConverterRegistry>) -> Self {
        Self {
            registry,
            columns: None,
        }
    }
}

impl RowMapper for GenericRowMapper {
    type Output = Row;

    fn create(&mut self, cursor: &dyn Cursor) -> Result<Row, NimbleError> {
        let (names, cache) = match &self.columns {
            Some(columns) => columns.clone(),
            None => {
                let names = Arc::new(column_names(cursor)?);
                let cache = index_cache(&names);
                self.columns = Some((Arc::clone(&names), Arc::clone(&cache)));
                (names, cache)
            }
        };
        Row::with_cache(names, cache, row_values(cursor)?, Arc::clone(&self.registry))
    }
}

/// Builds a `T` per row by calling the mutator each column resolves to.
///
/// The column-to-mutator plan is resolved on the first row and reused.
pub struct TypedRecordMapper<T> {
    registry: Arc<ConverterRegistry>,
    plan: Option<Vec<(String, &'static Member)>>,
    _record: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for TypedRecordMapper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedRecordMapper")
            .field("type", &std::any::type_name::<T>())
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

impl<T: Entity> TypedRecordMapper<T> {
    #[must_use]
    pub fn new(registry: Arc<ConverterRegistry>) -> Self {
        Self {
            registry,
            plan: None,
            _record: PhantomData,
        }
    }
}

/// Resolve the mutator for every column.
///
/// Per column, in order: field tagged with that column, field named like the
/// column, accessor tagged with that column (through the field it reads).
/// A field claimed by its column tag is not offered to later columns.
///
/// # Errors
///
/// Returns `NimbleError::MappingError` naming the first column with no target.
pub fn resolve_setters(
    meta: &'static EntityMeta,
    columns: &[String],
) -> Result<Vec<&'static Member>, NimbleError> {
    let mut fields = MemberSet::new(meta.fields);
    let mut getters = MemberSet::new(meta.methods);
    let mut setters = Vec::with_capacity(columns.len());

    for column in columns {
        let mut by_column = FieldByColumn::new(column);
        let mut by_name = FieldByName::ignoring_case(column);
        fields.enumerate(&mut [&mut by_column, &mut by_name]);

        let member = match by_column.matched.or(by_name.matched) {
            Some(index) => Some(fields.get(index).name),
            None => {
                let mut getter = GetterByColumn::new(column);
                getters.enumerate(&mut [&mut getter]);
                getter
                    .matched
                    .and_then(|index| getters.get(index).synthesized_name())
                    .map(|name| {
                        let mut field = FieldByName::ignoring_case(name);
                        fields.enumerate(&mut [&mut field]);
                        field.matched.map_or(name, |index| fields.get(index).name)
                    })
            }
        };

        let member = member.ok_or_else(|| {
            NimbleError::mapping(column, meta.type_name, "no member maps to this column")
        })?;
        let mut setter = MethodByName::new(&setter_name(member), MemberKind::Setter);
        MemberSet::new(meta.methods).enumerate(&mut [&mut setter]);
        let index = setter.matched.ok_or_else(|| {
            NimbleError::mapping(column, meta.type_name, format!("no mutator for {member}"))
        })?;
        setters.push(&meta.methods[index]);
    }
    Ok(setters)
}

impl<T: Entity> RowMapper for TypedRecordMapper<T> {
    type Output = T;

    fn create(&mut self, cursor: &dyn Cursor) -> Result<T, NimbleError> {
        let meta = T::meta();
        if self.plan.is_none() {
            let columns = column_names(cursor)?;
            let setters = resolve_setters(meta, &columns)?;
            self.plan = Some(columns.into_iter().zip(setters).collect());
        }
        let plan = self.plan.as_deref().unwrap_or_default();

        let mut record = T::default();
        for (i, (column, setter)) in plan.iter().enumerate() {
            let raw = cursor.value(i)?;
            self.registry
                .from_storage(raw, setter.value_type)
                .and_then(|value| record.set(setter.name, value))
                .map_err(|e| NimbleError::mapping(column, meta.type_name, e.to_string()))?;
        }
        Ok(record)
    }
}
