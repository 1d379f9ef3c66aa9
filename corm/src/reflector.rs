//! # Reflector Module
//!
//! Turns the metadata an [`Entity`] declares into a validated, immutable
//! [`ResolvedMapping`]. Resolved mappings are cached process-wide, keyed by
//! type, and shared behind an `Arc`.

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{
    any::{type_name, TypeId},
    collections::{HashMap, HashSet},
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    connection::Row,
    error::MappingError,
    model::{ColumnMapping, Entity, TableMapping},
    value::Value,
};

// ============================================================================
// Resolved Mapping
// ============================================================================

/// The validated mapping of one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMapping {
    entity: &'static str,
    table: TableMapping,
    columns: Vec<ColumnMapping>,
    settable: Vec<bool>,
    primary_key: Vec<usize>,
}

impl ResolvedMapping {
    /// Rust type name of the entity, for error messages.
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn table(&self) -> &TableMapping {
        &self.table
    }

    pub fn table_name(&self) -> &'static str {
        self.table.table_name
    }

    /// Every column, in declaration order.
    pub fn columns(&self) -> &[ColumnMapping] {
        &self.columns
    }

    pub fn column(&self, column_name: &str) -> Option<&ColumnMapping> {
        self.columns.iter().find(|column| column.column_name == column_name)
    }

    /// Primary key columns in declaration order; empty when none is declared.
    pub fn primary_key_columns(&self) -> Vec<&ColumnMapping> {
        self.primary_key.iter().map(|&index| &self.columns[index]).collect()
    }

    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Like [`primary_key_columns`](Self::primary_key_columns), but fails for
    /// keyed operations on an entity without a key.
    pub fn require_primary_key(&self) -> Result<Vec<&ColumnMapping>, MappingError> {
        if self.primary_key.is_empty() {
            return Err(MappingError::NoPrimaryKey { entity: self.entity });
        }
        Ok(self.primary_key_columns())
    }

    /// Whether the column's property has a setter (i.e. is not derived).
    pub fn is_settable(&self, column: &ColumnMapping) -> bool {
        self.columns
            .iter()
            .position(|candidate| candidate.column_name == column.column_name)
            .is_some_and(|index| self.settable[index])
    }

    /// Columns written by INSERT: not read-only, not derived, and not a
    /// database-generated key.
    pub fn insertable_columns(&self) -> impl Iterator<Item = &ColumnMapping> {
        self.columns
            .iter()
            .zip(&self.settable)
            .filter(|(column, settable)| **settable && !column.is_read_only && !column.is_generated_key())
            .map(|(column, _)| column)
    }

    /// Columns assigned by UPDATE: not read-only, not derived, not part of the key.
    pub fn updatable_columns(&self) -> impl Iterator<Item = &ColumnMapping> {
        self.columns
            .iter()
            .zip(&self.settable)
            .filter(|(column, settable)| **settable && !column.is_read_only && !column.is_primary_key)
            .map(|(column, _)| column)
    }

    /// Columns for a listing. With `show_all == false` only listed columns are
    /// kept, plus the primary key so rows stay identifiable.
    pub fn listing_columns(&self, show_all: bool) -> impl Iterator<Item = &ColumnMapping> {
        self.columns
            .iter()
            .filter(move |column| show_all || column.show_in_listing || column.is_primary_key)
    }
}

// ============================================================================
// Resolution
// ============================================================================

static MAPPINGS: LazyLock<RwLock<HashMap<TypeId, Arc<ResolvedMapping>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Resolves and caches the mapping of `T`.
///
/// Concurrent first uses may both reflect the type; the first insert wins and
/// both callers receive the same entry. Failures are not cached.
pub fn resolve<T: Entity>() -> Result<Arc<ResolvedMapping>, MappingError> {
    let key = TypeId::of::<T>();

    if let Some(mapping) = MAPPINGS.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
        return Ok(Arc::clone(mapping));
    }

    let resolved = Arc::new(reflect::<T>()?);
    let mut cache = MAPPINGS.write().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(cache.entry(key).or_insert(resolved)))
}

/// Validates the metadata of `T` without touching the cache.
pub fn reflect<T: Entity>() -> Result<ResolvedMapping, MappingError> {
    let entity = type_name::<T>();

    let table = T::table_mapping().ok_or(MappingError::MissingTable { entity })?;
    if table.table_name.trim().is_empty() {
        return Err(MappingError::EmptyTableName { entity });
    }

    let columns = T::columns();
    if columns.is_empty() {
        return Err(MappingError::NoColumns { entity });
    }

    let mut seen = HashSet::with_capacity(columns.len());
    let mut properties = HashSet::with_capacity(columns.len());
    for column in &columns {
        if !seen.insert(column.column_name) {
            return Err(MappingError::DuplicateColumn { entity, column: column.column_name.to_string() });
        }
        if !properties.insert(column.property) {
            return Err(MappingError::DuplicateProperty { entity, property: column.property.to_string() });
        }
    }

    let mut settable = vec![false; columns.len()];
    for setter in T::setters() {
        let Some(index) = columns.iter().position(|column| column.property == setter.property) else {
            return Err(MappingError::SetterWithoutGetter { entity, property: setter.property.to_string() });
        };

        let getter = &columns[index];
        if getter.column_name != setter.column_name {
            return Err(MappingError::AccessorMismatch {
                entity,
                property: setter.property.to_string(),
                getter: getter.column_name.to_string(),
                setter: setter.column_name.to_string(),
            });
        }
        if settable[index] {
            return Err(MappingError::DuplicateProperty { entity, property: setter.property.to_string() });
        }
        settable[index] = true;
    }

    let primary_key = columns
        .iter()
        .enumerate()
        .filter(|(_, column)| column.is_primary_key)
        .map(|(index, _)| index)
        .collect();

    Ok(ResolvedMapping { entity, table, columns, settable, primary_key })
}

// ============================================================================
// Value Access
// ============================================================================

/// Reads the current value of a column's property through its getter.
pub fn extract_value<T: Entity>(entity: &T, column: &ColumnMapping) -> Result<Value, MappingError> {
    entity.get_value(column.property).ok_or_else(|| MappingError::Inaccessible {
        entity: type_name::<T>(),
        property: column.property.to_string(),
    })
}

/// Writes a value into a column's property through its setter.
pub fn apply_value<T: Entity>(entity: &mut T, column: &ColumnMapping, value: Value) -> Result<(), MappingError> {
    entity.set_value(column.property, value)
}

/// Copies every settable column present in `row` into `entity`.
pub fn materialize<T: Entity>(mapping: &ResolvedMapping, entity: &mut T, row: &Row) -> Result<(), MappingError> {
    for column in mapping.columns.iter().filter(|column| mapping.is_settable(column)) {
        if let Some(value) = row.get(column.column_name) {
            apply_value(entity, column, value.clone())?;
        }
    }
    Ok(())
}
