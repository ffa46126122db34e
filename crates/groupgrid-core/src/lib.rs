//! Core primitives for groupgrid.
//!
//! This crate provides the building blocks the grouping data grid is wired
//! together with:
//!
//! - **Signal/Slot System**: Type-safe, synchronous change notification
//! - **Property System**: Settings with change detection
//! - **Logging**: Tracing targets, performance spans and tree debug output
//!
//! # Signal/Slot Example
//!
//! ```
//! use groupgrid_core::Signal;
//!
//! let group_changed = Signal::<()>::new();
//! let conn_id = group_changed.connect(|_| println!("groups rebuilt"));
//! group_changed.emit(());
//! group_changed.disconnect(conn_id);
//! ```
//!
//! # Property Example
//!
//! ```
//! use groupgrid_core::{Property, Signal};
//!
//! struct Overlay {
//!     aggregatable: Property<bool>,
//!     aggregatable_changed: Signal<bool>,
//! }
//!
//! impl Overlay {
//!     fn set_aggregatable(&self, value: bool) {
//!         if self.aggregatable.set(value) {
//!             self.aggregatable_changed.emit(value);
//!         }
//!     }
//! }
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use logging::{PerfSpan, TreeDebug, TreeFormatOptions, TreeSource, TreeStyle};
pub use property::Property;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
