//! Identity of one node of the group tree.

use std::fmt;
use std::sync::Arc;

use crate::model::Value;

use super::property::GroupProperty;

/// Ordered (property, value) pairs from the outermost grouping level down to
/// the level of this node.
///
/// Equality and hashing cover the whole sequence, order included, so grouping
/// by `[A, B]` and by `[B, A]` never yields equal identities. An identity is
/// never empty; [`property`](Self::property) and [`value`](Self::value)
/// describe its last pair. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupIdentity {
    pairs: Arc<[(GroupProperty, Value)]>,
}

impl GroupIdentity {
    /// A top-level identity.
    pub fn root(property: GroupProperty, value: Value) -> Self {
        Self {
            pairs: Arc::from(vec![(property, value)]),
        }
    }

    /// Builds an identity from its pairs; `None` if `pairs` is empty.
    pub fn from_pairs(pairs: Vec<(GroupProperty, Value)>) -> Option<Self> {
        if pairs.is_empty() {
            None
        } else {
            Some(Self {
                pairs: pairs.into(),
            })
        }
    }

    /// The identity one level deeper, extending this one with a pair.
    pub fn child(&self, property: GroupProperty, value: Value) -> Self {
        let mut pairs = self.pairs.to_vec();
        pairs.push((property, value));
        Self {
            pairs: pairs.into(),
        }
    }

    /// All pairs, outermost first.
    pub fn pairs(&self) -> &[(GroupProperty, Value)] {
        &self.pairs
    }

    fn last(&self) -> &(GroupProperty, Value) {
        &self.pairs[self.pairs.len() - 1]
    }

    /// The property this node groups by.
    pub fn property(&self) -> &GroupProperty {
        &self.last().0
    }

    /// The value this node groups by.
    pub fn value(&self) -> &Value {
        &self.last().1
    }

    /// The value recorded for `property` at any level of this identity.
    pub fn value_of(&self, property: &GroupProperty) -> Option<&Value> {
        self.pairs
            .iter()
            .find(|(candidate, _)| candidate == property)
            .map(|(_, value)| value)
    }

    /// Nesting depth, 0 for top-level groups.
    pub fn depth(&self) -> usize {
        self.pairs.len() - 1
    }

    /// The identity of the enclosing group, or `None` at the top level.
    pub fn parent_identity(&self) -> Option<Self> {
        Self::from_pairs(self.pairs[..self.pairs.len() - 1].to_vec())
    }
}

impl fmt::Display for GroupIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (property, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "[{property}:{value}]")?;
        }
        f.write_str("}")
    }
}
