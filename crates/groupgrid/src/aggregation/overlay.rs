//! Column aggregation over the grouped items.
//!
//! `AggregationOverlay` observes a [`GroupingEngine`] and keeps an
//! [`AggregationRow`] up to date: it is recomputed after every group change
//! and every item set change, before the change is served to readers.
//! Aggregations always cover all items of the source; per-group results are
//! available on request through [`AggregationOverlay::group_aggregation_results`].

use std::fmt;
use std::sync::{Arc, Weak};

use groupgrid_core::logging::{span_names, targets};
use groupgrid_core::{ConnectionGuard, PerfSpan, Signal};
use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};
use crate::group::{GroupIdentity, GroupQuery, GroupingEngine};
use crate::model::{Entity, ItemSetChange, Value};

use super::info::{AggregationInfo, AggregationPosition, AggregationType};
use super::strategies::Aggregations;

/// One rendered aggregation cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationCell {
    pub column_key: String,
    pub text: String,
    /// Tooltip, from [`AggregationInfo::cell_title`].
    pub title: Option<String>,
}

/// The rendered aggregation header or footer row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationRow {
    pub position: AggregationPosition,
    pub cells: Vec<AggregationCell>,
}

struct OverlayState {
    aggregatable: bool,
    position: AggregationPosition,
    infos: Vec<(String, AggregationInfo)>,
}

/// The bound engine; dropping it disconnects the overlay.
struct Binding<T: Entity> {
    engine: Arc<GroupingEngine<T>>,
    _group_changed: ConnectionGuard<u64>,
    _item_set_changed: ConnectionGuard<ItemSetChange<T>>,
}

/// Per-column aggregations and the row that displays them.
pub struct AggregationOverlay<T: Entity> {
    aggregations: RwLock<Aggregations>,
    state: RwLock<OverlayState>,
    binding: Mutex<Option<Binding<T>>>,
    row: RwLock<Option<AggregationRow>>,
    row_changed: Signal<AggregationRow>,
    this: Weak<Self>,
}

impl<T: Entity> AggregationOverlay<T> {
    /// Creates a disabled, unbound overlay.
    pub fn new() -> Arc<Self> {
        Self::with_aggregations(Aggregations::default())
    }

    /// Creates an overlay checking columns against `aggregations`.
    pub fn with_aggregations(aggregations: Aggregations) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            aggregations: RwLock::new(aggregations),
            state: RwLock::new(OverlayState {
                aggregatable: false,
                position: AggregationPosition::default(),
                infos: Vec::new(),
            }),
            binding: Mutex::new(None),
            row: RwLock::new(None),
            row_changed: Signal::new(),
            this: this.clone(),
        })
    }

    /// Observes `engine`, replacing any previous binding.
    pub fn bind(&self, engine: &Arc<GroupingEngine<T>>) {
        self.unbind_silently();

        let group_changed = engine
            .signals()
            .group_changed
            .connect_weak_scoped(&self.this, |overlay: &Self, _| overlay.update_aggregation_row());
        let item_set_changed = engine
            .signals()
            .item_set_changed
            .connect_weak_scoped(&self.this, |overlay: &Self, _| overlay.update_aggregation_row());

        *self.binding.lock() = Some(Binding {
            engine: engine.clone(),
            _group_changed: group_changed,
            _item_set_changed: item_set_changed,
        });
        self.update_aggregation_row();
    }

    /// Stops observing the bound engine and clears the row.
    pub fn unbind(&self) {
        self.unbind_silently();
        *self.row.write() = None;
    }

    fn unbind_silently(&self) {
        let binding = self.binding.lock().take();
        drop(binding);
    }

    pub fn is_bound(&self) -> bool {
        self.binding.lock().is_some()
    }

    /// Emitted after the aggregation row was recomputed.
    pub fn row_changed(&self) -> &Signal<AggregationRow> {
        &self.row_changed
    }

    pub fn is_aggregatable(&self) -> bool {
        self.state.read().aggregatable
    }

    pub fn set_aggregatable(&self, aggregatable: bool) {
        self.state.write().aggregatable = aggregatable;
        self.update_aggregation_row();
    }

    pub fn aggregation_position(&self) -> AggregationPosition {
        self.state.read().position
    }

    pub fn set_aggregation_position(&self, position: AggregationPosition) {
        self.state.write().position = position;
        self.update_aggregation_row();
    }

    /// Replaces the built-in aggregation registry.
    pub fn set_aggregations(&self, aggregations: Aggregations) {
        *self.aggregations.write() = aggregations;
    }

    /// Registers the aggregation of `column`.
    ///
    /// Compatibility with the column's value type is checked when results are
    /// computed, not here.
    pub fn add_aggregation_info(&self, column: impl Into<String>, info: AggregationInfo) -> Result<()> {
        let column = column.into();
        {
            let mut state = self.state.write();
            if state.infos.iter().any(|(key, _)| *key == column) {
                return Err(Error::duplicate_aggregation(column));
            }
            state.infos.push((column, info));
        }
        self.update_aggregation_row();
        Ok(())
    }

    /// Unregisters the aggregation of `column`, returning it.
    pub fn remove_aggregation_info(&self, column: &str) -> Option<AggregationInfo> {
        let removed = {
            let mut state = self.state.write();
            let position = state.infos.iter().position(|(key, _)| key == column)?;
            state.infos.remove(position).1
        };
        self.update_aggregation_row();
        Some(removed)
    }

    pub fn aggregation_info(&self, column: &str) -> Option<AggregationInfo> {
        self.state
            .read()
            .infos
            .iter()
            .find(|(key, _)| key == column)
            .map(|(_, info)| info.clone())
    }

    /// Columns with a registered aggregation, in registration order.
    pub fn aggregated_columns(&self) -> Vec<String> {
        self.state.read().infos.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Aggregates every registered column over all items of the source.
    ///
    /// Results are in registration order.
    pub fn aggregation_results(&self) -> Result<Vec<(String, Value)>> {
        let engine = self.checked_engine()?;
        let items = engine.source().items();
        self.aggregate_items(&items)
    }

    /// Aggregates every registered column over the items of `group`.
    pub fn group_aggregation_results(&self, group: &GroupIdentity) -> Result<Vec<(String, Value)>> {
        let engine = self.checked_engine()?;
        let items = engine.group_items(group);
        self.aggregate_items(&items)
    }

    /// Aggregates every registered column and formats the results.
    pub fn aggregate(&self) -> Result<Vec<(String, String)>> {
        let results = self.aggregation_results()?;
        let state = self.state.read();
        Ok(results
            .into_iter()
            .map(|(column, value)| {
                let text = state
                    .infos
                    .iter()
                    .find(|(key, _)| *key == column)
                    .map(|(_, info)| info.format(&value))
                    .unwrap_or_else(|| value.to_string());
                (column, text)
            })
            .collect())
    }

    /// The last rendered aggregation row.
    pub fn aggregation_row(&self) -> Option<AggregationRow> {
        self.row.read().clone()
    }

    /// Recomputes the aggregation row.
    ///
    /// Without aggregation enabled, bound items or registered columns the row
    /// is cleared. A failed computation is logged and keeps the previous row.
    pub fn update_aggregation_row(&self) {
        let ready = {
            let state = self.state.read();
            state.aggregatable && !state.infos.is_empty()
        } && self.is_bound();
        if !ready {
            *self.row.write() = None;
            return;
        }

        let texts = match self.aggregate() {
            Ok(texts) => texts,
            Err(err) => {
                tracing::error!(target: targets::AGGREGATION, error = %err, "unable to update aggregation row");
                return;
            }
        };

        let row = {
            let state = self.state.read();
            AggregationRow {
                position: state.position,
                cells: texts
                    .into_iter()
                    .map(|(column_key, text)| {
                        let title = state
                            .infos
                            .iter()
                            .find(|(key, _)| *key == column_key)
                            .and_then(|(_, info)| info.cell_title().map(str::to_string));
                        AggregationCell {
                            column_key,
                            text,
                            title,
                        }
                    })
                    .collect(),
            }
        };

        tracing::debug!(target: targets::AGGREGATION, cells = row.cells.len(), "aggregation row updated");
        *self.row.write() = Some(row.clone());
        self.row_changed.emit(row);
    }

    fn checked_engine(&self) -> Result<Arc<GroupingEngine<T>>> {
        if !self.is_aggregatable() {
            return Err(Error::AggregationDisabled);
        }
        self.binding
            .lock()
            .as_ref()
            .map(|binding| binding.engine.clone())
            .ok_or(Error::ItemsNotBound)
    }

    fn aggregate_items(&self, items: &[T]) -> Result<Vec<(String, Value)>> {
        let _span = PerfSpan::new(span_names::AGGREGATE);
        let state = self.state.read();
        let aggregations = self.aggregations.read();

        state
            .infos
            .iter()
            .map(|(column, info)| {
                aggregate_column(&aggregations, column, info, items).map(|value| (column.clone(), value))
            })
            .collect()
    }
}

fn aggregate_column<T: Entity>(
    aggregations: &Aggregations,
    column: &str,
    info: &AggregationInfo,
    items: &[T],
) -> Result<Value> {
    let values = |info: &AggregationInfo| -> Vec<Value> {
        match info.property() {
            Some(path) => items.iter().map(|item| path.value_of(item)).collect(),
            None => vec![Value::None; items.len()],
        }
    };

    if info.aggregation_type() == AggregationType::Custom {
        let strategy = info
            .strategy()
            .ok_or_else(|| Error::MissingAggregationStrategy {
                column: column.to_string(),
            })?;
        return Ok(strategy.aggregate(&values(info)));
    }

    let path = info.property().ok_or_else(|| Error::AggregationWithoutProperty {
        column: column.to_string(),
    })?;
    let value_type = path.value_type();
    if !aggregations.supports(value_type, info.aggregation_type()) {
        return Err(Error::unsupported_aggregation(
            column,
            value_type,
            info.aggregation_type(),
        ));
    }

    Ok(Aggregations::compute(
        info.aggregation_type(),
        value_type,
        &values(info),
    ))
}

impl<T: Entity> fmt::Debug for AggregationOverlay<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("AggregationOverlay")
            .field("aggregatable", &state.aggregatable)
            .field("position", &state.position)
            .field("columns", &state.infos.len())
            .field("bound", &self.is_bound())
            .finish()
    }
}
