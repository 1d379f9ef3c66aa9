//! # Model Module
//!
//! Declarative metadata describing how an entity maps to a table and how each
//! of its properties maps to a column. Nothing here validates; consistency is
//! checked by the reflector when a mapping is resolved.

use crate::{
    error::MappingError,
    value::{PropertyType, Value},
};

/// Class-level metadata: the target table of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMapping {
    /// Name of the table in the database.
    pub table_name: &'static str,
    /// Human readable title (UI only).
    pub title: &'static str,
    /// Longer description (UI only).
    pub description: &'static str,
}

impl TableMapping {
    pub const fn new(table_name: &'static str) -> Self {
        Self { table_name, title: "", description: "" }
    }
}

/// Ordering applied to a column when listing every row of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    None,
    Ascending,
    Descending,
}

/// A lookup reference to a column of another table. Not enforced by corm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
}

/// Metadata attached to the read accessor (getter) of a property.
///
/// Usually generated by `#[derive(Entity)]`. The `const` builder methods exist
/// for entities that implement [`Entity`] by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    /// Name of the Rust property the getter reads.
    pub property: &'static str,
    /// Name of the column in the table.
    pub column_name: &'static str,
    pub property_type: PropertyType,
    pub is_primary_key: bool,
    /// Value is produced by the database; only honoured on primary keys.
    pub is_auto_generated: bool,
    /// Column is never written by INSERT or UPDATE.
    pub is_read_only: bool,
    /// Column appears in listing grids (UI only, drives `select(.., false)`).
    pub show_in_listing: bool,
    /// Caption shown next to the column (UI only).
    pub label: &'static str,
    pub sort: SortOrder,
    pub foreign_key: Option<ForeignKey>,
}

impl ColumnMapping {
    pub const fn new(property: &'static str, column_name: &'static str, property_type: PropertyType) -> Self {
        Self {
            property,
            column_name,
            property_type,
            is_primary_key: false,
            is_auto_generated: false,
            is_read_only: false,
            show_in_listing: false,
            label: "",
            sort: SortOrder::None,
            foreign_key: None,
        }
    }

    pub const fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub const fn auto_generated(mut self) -> Self {
        self.is_auto_generated = true;
        self
    }

    pub const fn read_only(mut self) -> Self {
        self.is_read_only = true;
        self
    }

    pub const fn listed(mut self) -> Self {
        self.show_in_listing = true;
        self
    }

    pub const fn label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub const fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub const fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.foreign_key = Some(ForeignKey { table, column });
        self
    }

    /// True for a primary key whose value the database generates.
    pub fn is_generated_key(&self) -> bool {
        self.is_primary_key && self.is_auto_generated
    }
}

/// Metadata attached to the write accessor (setter) of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetterMapping {
    pub property: &'static str,
    pub column_name: &'static str,
}

impl SetterMapping {
    pub const fn new(property: &'static str, column_name: &'static str) -> Self {
        Self { property, column_name }
    }
}

/// The core trait describing a persistable type.
///
/// This trait is typically implemented via `#[derive(Entity)]`.
///
/// # Example
///
/// ```rust,ignore
/// use corm::Entity;
///
/// #[derive(Entity, Default)]
/// #[corm(table = "travel")]
/// struct Travel {
///     #[corm(primary_key, auto_generated)]
///     id: Option<i32>,
///     name: String,
/// }
/// ```
pub trait Entity: Send + Sync + 'static {
    /// The class-level mapping, `None` when the type carries no table metadata.
    fn table_mapping() -> Option<TableMapping>;

    /// Getter-side metadata, in declaration order.
    fn columns() -> Vec<ColumnMapping>;

    /// Setter-side metadata. A property listed in `columns` but not here is a
    /// read-only derived column.
    fn setters() -> Vec<SetterMapping>;

    /// Reads a property. `None` when the property has no getter.
    fn get_value(&self, property: &str) -> Option<Value>;

    /// Writes a property.
    fn set_value(&mut self, property: &str, value: Value) -> Result<(), MappingError>;
}
