//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use groupgrid::model::{
    Entity, ItemList, MetaClass, MetaProperty, Metadata, PropertyAccess, PropertyPath, Value,
    ValueType,
};

static NEXT_GROUP_ROW: AtomicU32 = AtomicU32::new(1_000_000);

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: u32,
    pub dept: String,
    pub team: String,
    pub headcount: i64,
}

impl Employee {
    pub fn new(id: u32, dept: &str, team: &str, headcount: i64) -> Self {
        Self {
            id,
            dept: dept.to_string(),
            team: team.to_string(),
            headcount,
        }
    }
}

impl PropertyAccess for Employee {
    fn property_value(&self, name: &str) -> Value {
        match name {
            "dept" => Value::from(self.dept.as_str()),
            "team" => Value::from(self.team.as_str()),
            "headcount" => Value::Int(self.headcount),
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
        Some(Employee::new(
            NEXT_GROUP_ROW.fetch_add(1, Ordering::SeqCst),
            "",
            "",
            0,
        ))
    }
}

pub fn metadata() -> Metadata {
    let mut metadata = Metadata::new();
    metadata.register(
        MetaClass::new("Employee")
            .with_property(MetaProperty::new("dept", ValueType::String))
            .with_property(MetaProperty::new("team", ValueType::String))
            .with_property(MetaProperty::new("headcount", ValueType::Int)),
    );
    metadata
}

pub fn path(name: &str) -> PropertyPath {
    metadata()
        .resolve_path("Employee", name)
        .expect("fixture path resolves")
}

/// Routes the crate's tracing output to the test harness.
///
/// Set `RUST_LOG=groupgrid=trace` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The three employees of the dept/team scenario.
pub fn scenario_items() -> Arc<ItemList<Employee>> {
    init_tracing();
    let metadata = metadata();
    let class = metadata.class("Employee").expect("fixture class");
    Arc::new(
        ItemList::new(vec![
            Employee::new(1, "Eng", "A", 12),
            Employee::new(2, "Eng", "B", 4),
            Employee::new(3, "Sales", "A", 30),
        ])
        .with_meta_class(class),
    )
}
