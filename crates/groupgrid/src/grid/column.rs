//! Grid columns and their order.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::PropertyPath;

/// Decides which schema properties the current user may see.
///
/// Columns bound to a property the user cannot view stay in the
/// [`ColumnSet`] but are left out of [`ColumnSet::visible_columns`].
pub trait AccessManager: Send + Sync {
    fn can_view(&self, path: &PropertyPath) -> bool;
}

impl<F> AccessManager for F
where
    F: Fn(&PropertyPath) -> bool + Send + Sync,
{
    fn can_view(&self, path: &PropertyPath) -> bool {
        self(path)
    }
}

/// Grants every property.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessManager for AllowAll {
    fn can_view(&self, _path: &PropertyPath) -> bool {
        true
    }
}

/// A grid column, bound to a schema property or generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    key: String,
    property: Option<PropertyPath>,
    header: String,
    sortable: bool,
}

impl Column {
    /// A sortable column showing `path`, headed by the property name.
    pub fn property(key: impl Into<String>, path: PropertyPath) -> Self {
        let header = path
            .segments()
            .last()
            .map(|name| caption(name))
            .unwrap_or_default();
        Self {
            key: key.into(),
            property: Some(path),
            header,
            sortable: true,
        }
    }

    /// A column whose values come from a generated property of the same key.
    pub fn generated(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            property: None,
            header: header.into(),
            sortable: false,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn property_path(&self) -> Option<&PropertyPath> {
        self.property.as_ref()
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable && self.property.is_some()
    }

    pub fn is_generated(&self) -> bool {
        self.property.is_none()
    }
}

/// "hireDate" -> "Hire date"
fn caption(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// All columns of a grid, in display order.
pub struct ColumnSet {
    columns: Vec<Column>,
    access: Arc<dyn AccessManager>,
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnSet {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            access: Arc::new(AllowAll),
        }
    }

    pub fn set_access_manager(&mut self, access: Arc<dyn AccessManager>) {
        self.access = access;
    }

    /// Appends `column`; keys are unique.
    pub fn add(&mut self, column: Column) -> Result<()> {
        if self.column(column.key()).is_some() {
            return Err(Error::DuplicateColumn {
                key: column.key().to_string(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Column> {
        let index = self.index_of(key)?;
        Some(self.columns.remove(index))
    }

    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.key() == key)
    }

    pub fn column_by_property(&self, path: &PropertyPath) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.property_path() == Some(path))
    }

    /// All columns, including hidden ones.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn is_visible(&self, column: &Column) -> bool {
        column
            .property_path()
            .is_none_or(|path| self.access.can_view(path))
    }

    /// Columns the access manager lets the user see, in display order.
    pub fn visible_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|column| self.is_visible(column))
            .collect()
    }

    /// Moves column `key` to `index` among all columns.
    pub fn set_column_position(&mut self, key: &str, index: usize) -> Result<()> {
        if index >= self.columns.len() {
            return Err(Error::ColumnIndexOutOfRange {
                index,
                max: self.columns.len().saturating_sub(1),
            });
        }
        let from = self.index_of(key).ok_or_else(|| Error::unknown_column(key))?;
        let column = self.columns.remove(from);
        self.columns.insert(index, column);
        Ok(())
    }

    /// Applies a reorder of the visible columns.
    ///
    /// `visible` lists the visible column keys in their new order; hidden
    /// columns go back to the positions they had.
    pub fn restore_columns_order(&mut self, visible: &[&str]) {
        let mut ordered: Vec<Column> = visible
            .iter()
            .filter_map(|key| self.column(key).cloned())
            .collect();

        for (index, column) in self.columns.iter().enumerate() {
            if !ordered.iter().any(|c| c.key() == column.key()) {
                ordered.insert(index.min(ordered.len()), column.clone());
            }
        }
        self.columns = ordered;
    }

    pub fn keys(&self) -> Vec<&str> {
        self.columns.iter().map(Column::key).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.key() == key)
    }
}

impl fmt::Debug for ColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSet")
            .field("columns", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MetaClass, MetaProperty, Metadata, ValueType};

    fn column_set() -> ColumnSet {
        let mut metadata = Metadata::new();
        metadata.register(
            MetaClass::new("Employee")
                .with_property(MetaProperty::new("name", ValueType::String))
                .with_property(MetaProperty::new("salary", ValueType::Int))
                .with_property(MetaProperty::new("hireDate", ValueType::Date)),
        );
        let mut columns = ColumnSet::new();
        for (key, path) in [("name", "name"), ("salary", "salary"), ("hired", "hireDate")] {
            let path = metadata.resolve_path("Employee", path).unwrap();
            columns.add(Column::property(key, path)).unwrap();
        }
        columns.add(Column::generated("size", "Size")).unwrap();
        columns
    }

    #[test]
    fn test_headers_and_duplicates() {
        let mut columns = column_set();
        assert_eq!(columns.column("hired").unwrap().header(), "Hire date");
        assert!(columns.column("size").unwrap().is_generated());
        assert!(!columns.column("size").unwrap().is_sortable());
        assert!(matches!(
            columns.add(Column::generated("size", "Again")),
            Err(Error::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn test_set_column_position() {
        let mut columns = column_set();
        columns.set_column_position("size", 0).unwrap();
        assert_eq!(columns.keys(), vec!["size", "name", "salary", "hired"]);

        let err = columns.set_column_position("name", 4).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Index '4' is out of range. Available indexes to move column: from 0 to 3 including bounds"
        );
        assert!(matches!(
            columns.set_column_position("nope", 1),
            Err(Error::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_hidden_columns_keep_their_position() {
        let mut columns = column_set();
        columns.set_access_manager(Arc::new(|path: &PropertyPath| path.to_string() != "salary"));

        let visible: Vec<_> = columns.visible_columns().iter().map(|c| c.key().to_string()).collect();
        assert_eq!(visible, vec!["name", "hired", "size"]);

        columns.restore_columns_order(&["size", "hired", "name"]);
        assert_eq!(columns.keys(), vec!["size", "salary", "hired", "name"]);
    }
}
