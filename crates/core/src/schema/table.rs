//! Table schema definition.

use super::column::Column;
use crate::error::{Error, Result};
use crate::row::{ColumnId, INDEX_FIELD, ROW_PATH_FIELD};
use crate::types::DataType;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// The ordered name → type mapping of a table, plus its optional primary key.
#[derive(Clone, Debug)]
pub struct TableSchema {
    /// Table name.
    name: String,
    /// Column definitions, base columns first, computed columns in registration order.
    columns: Vec<Column>,
    /// Primary key column.
    primary_key: Option<ColumnId>,
}

impl TableSchema {
    /// Creates a new schema with the given name and columns and no primary key.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.with_index(i))
            .collect();
        Self {
            name: name.into(),
            columns,
            primary_key: None,
        }
    }

    /// Returns the table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the columns.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a column by position.
    #[inline]
    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id)
    }

    /// Gets a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Gets a column index by name.
    pub fn get_column_index(&self, name: &str) -> Option<ColumnId> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Resolves a column name, failing with a schema error.
    pub fn resolve(&self, name: &str) -> Result<&Column> {
        self.get_column(name)
            .ok_or_else(|| Error::column_not_found(&self.name, name))
    }

    /// Returns the primary key column if defined.
    pub fn primary_key(&self) -> Option<&Column> {
        self.primary_key.and_then(|id| self.columns.get(id))
    }

    /// Returns the column names in schema order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// Appends a column, returning its position.
    pub fn add_column(&mut self, column: Column) -> Result<ColumnId> {
        check_naming_rules(column.name())?;
        if self.get_column(column.name()).is_some() {
            return Err(Error::duplicate_column(&self.name, column.name()));
        }
        let id = self.columns.len();
        self.columns.push(column.with_index(id));
        Ok(id)
    }

    /// Removes the last column. The primary key is never removed.
    pub fn pop_column(&mut self) -> Option<Column> {
        if self.primary_key.is_some() && self.primary_key == self.columns.len().checked_sub(1) {
            return None;
        }
        self.columns.pop()
    }
}

/// Validates a column name.
///
/// Any non-empty name is accepted (`int+float` and `yes/no` are valid
/// column names) except the reserved record fields.
fn check_naming_rules(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_schema("Name cannot be empty"));
    }
    if name == INDEX_FIELD || name == ROW_PATH_FIELD {
        return Err(Error::invalid_schema(format!("Name is reserved: {}", name)));
    }
    Ok(())
}

/// Builder for creating table schemas.
pub struct SchemaBuilder {
    name: String,
    columns: Vec<Column>,
    primary_key: Option<String>,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: None,
        }
    }

    /// Adds a column to the table.
    pub fn add_column(mut self, name: impl Into<String>, data_type: DataType) -> Result<Self> {
        let name = name.into();
        check_naming_rules(&name)?;
        if self.columns.iter().any(|c| c.name() == name) {
            return Err(Error::duplicate_column(&self.name, name));
        }
        self.columns.push(Column::new(name, data_type));
        Ok(self)
    }

    /// Sets the primary key column.
    pub fn add_primary_key(mut self, column: &str) -> Result<Self> {
        if !self.columns.iter().any(|c| c.name() == column) {
            return Err(Error::column_not_found(&self.name, column));
        }
        self.primary_key = Some(column.into());
        Ok(self)
    }

    /// Builds the table schema.
    pub fn build(self) -> Result<TableSchema> {
        if self.columns.is_empty() {
            return Err(Error::invalid_schema(format!(
                "Table {} has no columns",
                self.name
            )));
        }
        let primary_key = self.primary_key;
        let mut schema = TableSchema::new(self.name, self.columns);
        schema.primary_key = primary_key.and_then(|name| schema.get_column_index(&name));
        Ok(schema)
    }
}
