//! The grouping data grid.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use groupgrid_core::logging::targets;
use parking_lot::RwLock;

use crate::aggregation::{AggregationInfo, AggregationOverlay, AggregationPosition, AggregationRow};
use crate::config::GroupGridConfig;
use crate::error::{Error, Result};
use crate::group::{
    EmptyGroupQuery, GroupIdentity, GroupProperty, GroupPropertyValueProvider, GroupQuery,
    GroupingEngine, GroupingPropertyContext,
};
use crate::hierarchy::{
    GroupDataCommunicator, GroupRowCallback, GroupRowFactory, HierarchicalGroupAdapter,
};
use crate::model::{Entity, EntityFactory, ItemSource, Metadata, PropertyPath, SortOrder, Value};

use super::column::{AccessManager, Column, ColumnSet};

struct GridBinding<T: Entity> {
    engine: Arc<GroupingEngine<T>>,
    adapter: Arc<HierarchicalGroupAdapter<T>>,
    communicator: Arc<GroupDataCommunicator<T>>,
}

/// A data grid that groups its rows.
///
/// The grid owns its columns, the aggregation settings and the generated
/// property providers. Binding items with [`set_items`](Self::set_items)
/// builds a fresh grouping engine, hierarchical adapter and data
/// communicator for them; [`unbind`](Self::unbind) drops all three.
///
/// # Example
///
/// ```ignore
/// let grid = GroupDataGrid::new(metadata);
/// grid.add_property_column("dept", "Employee", "department.name")?;
/// grid.add_generated_column("size", "Size", |ctx| {
///     if ctx.item.headcount > 10 { "large".into() } else { "small".into() }
/// })?;
/// grid.set_items(source)?;
/// grid.group_by_columns(&["dept", "size"])?;
/// ```
pub struct GroupDataGrid<T: Entity> {
    metadata: Arc<Metadata>,
    config: GroupGridConfig,
    columns: RwLock<ColumnSet>,
    providers: RwLock<HashMap<String, GroupPropertyValueProvider<T>>>,
    entity_factory: Option<Arc<dyn EntityFactory<T>>>,
    group_row_callback: Option<GroupRowCallback<T>>,
    binding: RwLock<Option<GridBinding<T>>>,
    overlay: Arc<AggregationOverlay<T>>,
}

impl<T: Entity> GroupDataGrid<T> {
    /// Creates an unbound grid with default settings.
    pub fn new(metadata: impl Into<Arc<Metadata>>) -> Self {
        Self::with_config(metadata, GroupGridConfig::default())
    }

    /// Creates an unbound grid with `config`.
    pub fn with_config(metadata: impl Into<Arc<Metadata>>, config: GroupGridConfig) -> Self {
        let overlay = AggregationOverlay::new();
        overlay.set_aggregatable(config.aggregatable);
        overlay.set_aggregation_position(config.aggregation_position);

        Self {
            metadata: metadata.into(),
            config,
            columns: RwLock::new(ColumnSet::new()),
            providers: RwLock::new(HashMap::new()),
            entity_factory: None,
            group_row_callback: None,
            binding: RwLock::new(None),
            overlay,
        }
    }

    /// Enables schema-driven construction of group rows.
    pub fn with_entity_factory(mut self, factory: Arc<dyn EntityFactory<T>>) -> Self {
        self.entity_factory = Some(factory);
        self
    }

    /// Builds group rows with `callback`.
    pub fn with_group_row_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&GroupIdentity) -> Option<T> + Send + Sync + 'static,
    {
        self.group_row_callback = Some(Arc::new(callback));
        self
    }

    pub fn metadata(&self) -> &Arc<Metadata> {
        &self.metadata
    }

    pub fn config(&self) -> &GroupGridConfig {
        &self.config
    }

    pub fn set_access_manager(&self, access: Arc<dyn AccessManager>) {
        self.columns.write().set_access_manager(access);
    }

    // =========================================================================
    // Columns
    // =========================================================================

    pub fn add_column(&self, column: Column) -> Result<()> {
        self.columns.write().add(column)
    }

    /// Adds a column for `path` of class `class`.
    pub fn add_property_column(&self, key: impl Into<String>, class: &str, path: &str) -> Result<()> {
        let path = self.metadata.resolve_path(class, path)?;
        self.add_column(Column::property(key, path))
    }

    /// Adds a column whose values are computed by `provider`.
    ///
    /// The provider also serves grouping by this column.
    pub fn add_generated_column<F>(
        &self,
        key: impl Into<String>,
        header: impl Into<String>,
        provider: F,
    ) -> Result<()>
    where
        F: Fn(&GroupingPropertyContext<'_, T>) -> Value + Send + Sync + 'static,
    {
        let key = key.into();
        self.columns.write().add(Column::generated(key.clone(), header))?;

        let provider: GroupPropertyValueProvider<T> = Arc::new(provider);
        if let Some(engine) = self.engine() {
            register_provider(&engine, &key, provider.clone());
        }
        self.providers.write().insert(key, provider);
        Ok(())
    }

    /// Removes a column together with its aggregation and provider.
    pub fn remove_column(&self, key: &str) -> Option<Column> {
        let column = self.columns.write().remove(key)?;
        self.overlay.remove_aggregation_info(key);
        if self.providers.write().remove(key).is_some()
            && let Some(engine) = self.engine()
        {
            engine.remove_group_property_value_provider(key);
        }
        Some(column)
    }

    pub fn column(&self, key: &str) -> Option<Column> {
        self.columns.read().column(key).cloned()
    }

    /// All columns, including those hidden by the access manager.
    pub fn columns(&self) -> Vec<Column> {
        self.columns.read().columns().to_vec()
    }

    pub fn visible_columns(&self) -> Vec<Column> {
        self.columns
            .read()
            .visible_columns()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn set_column_position(&self, key: &str, index: usize) -> Result<()> {
        self.columns.write().set_column_position(key, index)
    }

    /// Applies a client-side reorder of the visible columns.
    pub fn restore_columns_order(&self, visible: &[&str]) {
        self.columns.write().restore_columns_order(visible);
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Binds `source`, replacing any bound items.
    ///
    /// Grouping configured through [`GroupGridConfig::group_by`] is applied
    /// to the new items. Configured keys are resolved before anything is
    /// replaced, so an unknown key leaves the grid as it was.
    #[tracing::instrument(skip_all, target = "groupgrid::grid", level = "debug")]
    pub fn set_items(&self, source: Arc<dyn ItemSource<T>>) -> Result<()> {
        let keys: Vec<&str> = self.config.group_by.iter().map(String::as_str).collect();
        let initial_grouping = self.column_group_properties(&keys)?;

        self.unbind();

        let engine = GroupingEngine::new(source);
        for (name, provider) in self.providers.read().iter() {
            register_provider(&engine, name, provider.clone());
        }

        let mut factory = GroupRowFactory::new();
        if let Some(entity_factory) = &self.entity_factory {
            factory = factory.with_entity_factory(entity_factory.clone());
        }
        if let Some(callback) = &self.group_row_callback {
            factory = factory.with_shared_callback(callback.clone());
        }

        let adapter = HierarchicalGroupAdapter::new(engine.clone(), factory);
        let communicator =
            GroupDataCommunicator::with_settings(adapter.clone(), self.config.communicator_settings());
        self.overlay.bind(&engine);

        *self.binding.write() = Some(GridBinding {
            engine: engine.clone(),
            adapter,
            communicator,
        });
        tracing::debug!(target: targets::GRID, "items bound");

        if !initial_grouping.is_empty()
            && let Err(err) = engine.group_by(initial_grouping)
        {
            self.unbind();
            return Err(err);
        }
        Ok(())
    }

    /// Drops the bound items and everything derived from them.
    pub fn unbind(&self) {
        if self.binding.write().take().is_some() {
            self.overlay.unbind();
            tracing::debug!(target: targets::GRID, "items unbound");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.read().is_some()
    }

    pub fn items(&self) -> Option<Arc<dyn ItemSource<T>>> {
        self.engine().map(|engine| engine.source().clone())
    }

    pub fn engine(&self) -> Option<Arc<GroupingEngine<T>>> {
        self.binding.read().as_ref().map(|b| b.engine.clone())
    }

    pub fn adapter(&self) -> Option<Arc<HierarchicalGroupAdapter<T>>> {
        self.binding.read().as_ref().map(|b| b.adapter.clone())
    }

    pub fn communicator(&self) -> Option<Arc<GroupDataCommunicator<T>>> {
        self.binding.read().as_ref().map(|b| b.communicator.clone())
    }

    /// The group queries of the bound items; empty answers when unbound.
    pub fn group_query(&self) -> Arc<dyn GroupQuery<T>> {
        if let Some(adapter) = self.adapter() {
            return adapter;
        }
        Arc::new(EmptyGroupQuery::new())
    }

    // =========================================================================
    // Grouping and sorting
    // =========================================================================

    /// Groups by the columns `keys`, outermost first.
    ///
    /// Columns hidden by the access manager are skipped.
    pub fn group_by_columns(&self, keys: &[&str]) -> Result<()> {
        let properties = self.column_group_properties(keys)?;
        self.group_by(properties)
    }

    fn column_group_properties(&self, keys: &[&str]) -> Result<Vec<GroupProperty>> {
        let columns = self.columns.read();
        let mut properties = Vec::with_capacity(keys.len());
        for key in keys {
            let column = columns.column(key).ok_or_else(|| Error::unknown_column(*key))?;
            if !columns.is_visible(column) {
                tracing::debug!(target: targets::GRID, column = key, "hidden column skipped from grouping");
                continue;
            }
            properties.push(match column.property_path() {
                Some(path) => GroupProperty::SchemaPath(path.clone()),
                None => GroupProperty::generated(column.key()),
            });
        }
        Ok(properties)
    }

    pub fn group_by(&self, properties: Vec<GroupProperty>) -> Result<()> {
        let engine = self.engine().ok_or(Error::ItemsNotBound)?;
        engine.group_by(properties)
    }

    pub fn ungroup(&self) -> Result<()> {
        self.group_by(Vec::new())
    }

    pub fn group_properties(&self) -> Vec<GroupProperty> {
        self.group_query().group_properties()
    }

    /// Sorts the items by column `key`.
    ///
    /// Columns that are not sortable leave the order unchanged.
    pub fn sort(&self, key: &str, ascending: bool) -> Result<()> {
        let column = self.column(key).ok_or_else(|| Error::unknown_column(key))?;
        let engine = self.engine().ok_or(Error::ItemsNotBound)?;
        let Some(path) = column.property_path().filter(|_| column.is_sortable()) else {
            tracing::debug!(target: targets::GRID, column = key, "column is not sortable");
            return Ok(());
        };
        engine.sort(vec![SortOrder {
            path: path.clone(),
            ascending,
        }]);
        Ok(())
    }

    /// Forgets the sort order.
    pub fn reset_sort(&self) -> Result<()> {
        let engine = self.engine().ok_or(Error::ItemsNotBound)?;
        engine.sort(Vec::new());
        Ok(())
    }

    // =========================================================================
    // Aggregation
    // =========================================================================

    pub fn aggregation(&self) -> &Arc<AggregationOverlay<T>> {
        &self.overlay
    }

    pub fn is_aggregatable(&self) -> bool {
        self.overlay.is_aggregatable()
    }

    pub fn set_aggregatable(&self, aggregatable: bool) {
        self.overlay.set_aggregatable(aggregatable);
    }

    pub fn aggregation_position(&self) -> AggregationPosition {
        self.overlay.aggregation_position()
    }

    pub fn set_aggregation_position(&self, position: AggregationPosition) {
        self.overlay.set_aggregation_position(position);
    }

    /// Registers the aggregation of column `key`.
    ///
    /// An info without a property aggregates the column's property.
    pub fn add_aggregation_info(&self, key: &str, info: AggregationInfo) -> Result<()> {
        let column = self.column(key).ok_or_else(|| Error::unknown_column(key))?;
        let info = match (info.property(), column.property_path()) {
            (None, Some(path)) => info.with_property(path.clone()),
            _ => info,
        };
        self.overlay.add_aggregation_info(key, info)
    }

    pub fn remove_aggregation_info(&self, key: &str) -> Option<AggregationInfo> {
        self.overlay.remove_aggregation_info(key)
    }

    pub fn aggregation_results(&self) -> Result<Vec<(String, Value)>> {
        self.overlay.aggregation_results()
    }

    pub fn aggregate(&self) -> Result<Vec<(String, String)>> {
        self.overlay.aggregate()
    }

    pub fn aggregation_row(&self) -> Option<AggregationRow> {
        self.overlay.aggregation_row()
    }

    // =========================================================================
    // Presentation
    // =========================================================================

    /// Display text of `row` in column `key`; empty for group rows.
    pub fn cell_text(&self, row: &T, key: &str) -> Result<String> {
        let column = self.column(key).ok_or_else(|| Error::unknown_column(key))?;
        if self.adapter().is_some_and(|adapter| adapter.is_group_row(row)) {
            return Ok(String::new());
        }

        let value = match column.property_path() {
            Some(path) => path.value_of(row),
            None => match self.providers.read().get(key) {
                Some(provider) => provider(&GroupingPropertyContext {
                    item: row,
                    property: key,
                }),
                None => Value::None,
            },
        };
        Ok(self.metadata.format(&value))
    }

    /// Caption of a group row: `"<header>: <value> (<count>)"`.
    pub fn group_row_caption(&self, row: &T) -> Option<String> {
        let adapter = self.adapter()?;
        let group = adapter.group_by_row(row)?;
        let header = self.group_header(group.property());
        let count = adapter.group_items_count(&group);
        Some(format!(
            "{header}: {} ({count})",
            self.metadata.format(group.value())
        ))
    }

    fn group_header(&self, property: &GroupProperty) -> String {
        let columns = self.columns.read();
        let column = match property {
            GroupProperty::SchemaPath(path) => columns.column_by_property(path),
            GroupProperty::Generated(name) => columns.column(name),
        };
        column
            .map(|column| column.header().to_string())
            .unwrap_or_else(|| property.to_string())
    }

    /// Column showing `path`, if any.
    pub fn column_by_property(&self, path: &PropertyPath) -> Option<Column> {
        self.columns.read().column_by_property(path).cloned()
    }
}

fn register_provider<T: Entity>(
    engine: &GroupingEngine<T>,
    name: &str,
    provider: GroupPropertyValueProvider<T>,
) {
    engine.add_group_property_value_provider(name, move |ctx| provider(ctx));
}

impl<T: Entity> fmt::Debug for GroupDataGrid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupDataGrid")
            .field("config", &self.config)
            .field("columns", &*self.columns.read())
            .field("bound", &self.is_bound())
            .field("aggregation", &self.overlay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemList, MetaClass, MetaProperty, PropertyAccess, ValueType};
    use std::sync::atomic::{AtomicU32, Ordering};

    static NEXT_ROW: AtomicU32 = AtomicU32::new(90_000);

    #[derive(Debug, Clone)]
    struct Employee {
        id: u32,
        name: &'static str,
        dept: &'static str,
        active: bool,
    }

    impl PropertyAccess for Employee {
        fn property_value(&self, name: &str) -> Value {
            match name {
                "name" => Value::from(self.name),
                "dept" => Value::from(self.dept),
                "active" => Value::Bool(self.active),
                _ => Value::None,
            }
        }
    }

    impl Entity for Employee {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }

        fn blank(&self) -> Option<Self> {
            Some(Employee {
                id: NEXT_ROW.fetch_add(1, Ordering::SeqCst),
                name: "",
                dept: "",
                active: false,
            })
        }
    }

    fn metadata() -> Metadata {
        let mut metadata = Metadata::new();
        metadata.register(
            MetaClass::new("Employee")
                .with_property(MetaProperty::new("name", ValueType::String))
                .with_property(MetaProperty::new("dept", ValueType::String))
                .with_property(MetaProperty::new("active", ValueType::Bool)),
        );
        metadata
    }

    fn grid() -> GroupDataGrid<Employee> {
        let grid: GroupDataGrid<Employee> = GroupDataGrid::new(metadata());
        grid.add_property_column("name", "Employee", "name").unwrap();
        grid.add_property_column("dept", "Employee", "dept").unwrap();
        grid.add_property_column("active", "Employee", "active").unwrap();
        grid.add_generated_column("initial", "Initial", |ctx| {
            Value::from(ctx.item.name.chars().next().map(String::from))
        })
        .unwrap();
        grid
    }

    fn items() -> Arc<ItemList<Employee>> {
        Arc::new(ItemList::new(vec![
            Employee { id: 1, name: "Ann", dept: "Eng", active: true },
            Employee { id: 2, name: "Bob", dept: "Eng", active: false },
            Employee { id: 3, name: "Abe", dept: "Sales", active: true },
        ]))
    }

    #[test]
    fn test_unbound_grid() {
        let grid = grid();
        assert!(!grid.is_bound());
        assert!(matches!(grid.group_by_columns(&["dept"]), Err(Error::ItemsNotBound)));
        assert!(!grid.group_query().has_groups());
    }

    #[test]
    fn test_group_by_columns() {
        let grid = grid();
        grid.set_items(items()).unwrap();

        grid.group_by_columns(&["dept", "initial"]).unwrap();
        let properties = grid.group_properties();
        assert!(matches!(properties[0], GroupProperty::SchemaPath(_)));
        assert_eq!(properties[1], GroupProperty::generated("initial"));

        let query = grid.group_query();
        let eng = query.root_groups()[0].clone();
        assert_eq!(query.children(&eng).len(), 2);

        assert!(matches!(
            grid.group_by_columns(&["missing"]),
            Err(Error::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_hidden_columns_are_not_grouped() {
        let grid = grid();
        grid.set_access_manager(Arc::new(|path: &PropertyPath| path.to_string() != "dept"));
        grid.set_items(items()).unwrap();

        grid.group_by_columns(&["dept", "initial"]).unwrap();
        assert_eq!(grid.group_properties(), vec![GroupProperty::generated("initial")]);
        assert_eq!(grid.visible_columns().len(), 3);
    }

    #[test]
    fn test_cell_text_and_caption() {
        let grid = grid();
        let list = items();
        grid.set_items(list.clone()).unwrap();
        grid.group_by_columns(&["dept"]).unwrap();

        let ann = list.item(&1).unwrap();
        assert_eq!(grid.cell_text(&ann, "name").unwrap(), "Ann");
        assert_eq!(grid.cell_text(&ann, "active").unwrap(), "Yes");
        assert_eq!(grid.cell_text(&ann, "initial").unwrap(), "A");

        let adapter = grid.adapter().unwrap();
        let group_row = adapter.row_by_group(&adapter.root_groups()[0]).unwrap();
        assert_eq!(grid.cell_text(&group_row, "name").unwrap(), "");
        assert_eq!(grid.group_row_caption(&group_row).unwrap(), "Dept: Eng (2)");
        assert!(grid.group_row_caption(&ann).is_none());
    }

    #[test]
    fn test_sort_and_reset() {
        let grid = grid();
        let list = items();
        grid.set_items(list.clone()).unwrap();

        grid.sort("name", true).unwrap();
        let names: Vec<_> = list.items().iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Abe", "Ann", "Bob"]);

        grid.sort("initial", false).unwrap();
        grid.reset_sort().unwrap();
        assert!(grid.engine().unwrap().sort_orders().is_empty());
    }

    #[test]
    fn test_remove_column_drops_aggregation() {
        let grid = grid();
        grid.set_items(items()).unwrap();
        grid.set_aggregatable(true);
        grid.add_aggregation_info("name", AggregationInfo::new(crate::aggregation::AggregationType::Count))
            .unwrap();
        assert_eq!(grid.aggregate().unwrap(), vec![("name".to_string(), "3".to_string())]);

        grid.remove_column("name").unwrap();
        assert!(grid.aggregate().unwrap().is_empty());
        assert!(grid.remove_aggregation_info("name").is_none());
    }

    #[test]
    fn test_config_group_by_applied_on_bind() {
        let config = GroupGridConfig {
            group_by: vec!["dept".into()],
            aggregatable: true,
            ..GroupGridConfig::default()
        };
        let grid = GroupDataGrid::with_config(metadata(), config);
        grid.add_property_column("dept", "Employee", "dept").unwrap();
        assert!(grid.is_aggregatable());

        grid.set_items(items()).unwrap();
        assert_eq!(grid.group_query().root_groups().len(), 2);

        grid.unbind();
        assert!(grid.adapter().is_none());
        assert!(matches!(grid.aggregation_results(), Err(Error::ItemsNotBound)));
    }
}
