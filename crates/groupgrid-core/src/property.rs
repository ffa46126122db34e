//! A shared value that knows when a write changes it.
//!
//! Owners pair a [`Property`] with a [`Signal`](crate::Signal) and emit only
//! when [`Property::set`] reports a change:
//!
//! ```
//! use groupgrid_core::{Property, Signal};
//!
//! let state = Property::new("active");
//! let state_changed = Signal::<&'static str>::new();
//!
//! for next in ["active", "inactive"] {
//!     if state.set(next) {
//!         state_changed.emit(next);
//!     }
//! }
//! assert_eq!(state.get(), "inactive");
//! ```

use std::fmt;

use parking_lot::RwLock;

pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    pub fn get(&self) -> T {
        self.value.read().clone()
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Stores `value`; `true` if it differs from the current one.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current == value {
            return false;
        }
        *current = value;
        true
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value.read(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_changes_only() {
        let page_size = Property::new(50usize);
        assert!(!page_size.set(50));
        assert!(page_size.set(100));
        assert_eq!(page_size.get(), 100);
    }

    #[test]
    fn test_default_and_debug() {
        let grouped: Property<Vec<String>> = Property::default();
        assert!(grouped.get().is_empty());
        assert!(grouped.set(vec!["dept".to_string()]));
        assert_eq!(format!("{grouped:?}"), r#"["dept"]"#);
    }
}
