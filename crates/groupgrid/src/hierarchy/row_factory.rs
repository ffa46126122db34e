//! Construction of synthetic group rows.
//!
//! The tree-fetch protocol deals in rows of the grid's item type, so every
//! group node needs a placeholder item. `GroupRowFactory` decides once how to
//! make them:
//!
//! 1. a caller-supplied callback, when one is set;
//! 2. schema-driven construction of the item source's class;
//! 3. schema-driven construction of the grouping property's owning class;
//! 4. [`Entity::blank`] of an item already in the group.
//!
//! Steps 2 and 3 need an [`EntityFactory`].

use std::fmt;
use std::sync::Arc;

use crate::group::GroupIdentity;
use crate::model::{Entity, EntityFactory, MetaClass};

/// Builds a placeholder row for a group.
pub type GroupRowCallback<T> = Arc<dyn Fn(&GroupIdentity) -> Option<T> + Send + Sync>;

enum Strategy<T> {
    Schema(Arc<MetaClass>),
    Blank(T),
}

/// Resolves and applies the group row construction strategy.
pub struct GroupRowFactory<T: Entity> {
    entity_factory: Option<Arc<dyn EntityFactory<T>>>,
    callback: Option<GroupRowCallback<T>>,
    strategy: Option<Strategy<T>>,
}

impl<T: Entity> Default for GroupRowFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> GroupRowFactory<T> {
    /// A factory that relies on [`Entity::blank`] only.
    pub fn new() -> Self {
        Self {
            entity_factory: None,
            callback: None,
            strategy: None,
        }
    }

    /// Enables schema-driven construction.
    pub fn with_entity_factory(mut self, factory: Arc<dyn EntityFactory<T>>) -> Self {
        self.entity_factory = Some(factory);
        self
    }

    /// Uses `callback` for every group row.
    pub fn with_callback<F>(self, callback: F) -> Self
    where
        F: Fn(&GroupIdentity) -> Option<T> + Send + Sync + 'static,
    {
        self.with_shared_callback(Arc::new(callback))
    }

    pub fn with_shared_callback(mut self, callback: GroupRowCallback<T>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Creates a row for `group`.
    ///
    /// `source_class` is the item source's schema class and `known_item` an
    /// item belonging to the group. The strategy is kept once one resolves.
    pub fn create(
        &mut self,
        group: &GroupIdentity,
        source_class: Option<&Arc<MetaClass>>,
        known_item: Option<&T>,
    ) -> Option<T> {
        if let Some(callback) = &self.callback {
            return callback(group);
        }

        if self.strategy.is_none() {
            self.strategy = self.resolve(group, source_class, known_item);
        }

        match self.strategy.as_ref()? {
            Strategy::Schema(class) => self
                .entity_factory
                .as_ref()
                .and_then(|factory| factory.create(class)),
            Strategy::Blank(template) => template.blank(),
        }
    }

    fn resolve(
        &self,
        group: &GroupIdentity,
        source_class: Option<&Arc<MetaClass>>,
        known_item: Option<&T>,
    ) -> Option<Strategy<T>> {
        if self.entity_factory.is_some() {
            if let Some(class) = source_class {
                return Some(Strategy::Schema(class.clone()));
            }
            if let Some(path) = group.property().as_path() {
                return Some(Strategy::Schema(path.owner().clone()));
            }
        }
        known_item.map(|item| Strategy::Blank(item.clone()))
    }
}

impl<T: Entity> fmt::Debug for GroupRowFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = match &self.strategy {
            None => "unresolved",
            Some(Strategy::Schema(_)) => "schema",
            Some(Strategy::Blank(_)) => "blank",
        };
        f.debug_struct("GroupRowFactory")
            .field("entity_factory", &self.entity_factory.is_some())
            .field("callback", &self.callback.is_some())
            .field("strategy", &strategy)
            .finish()
    }
}
