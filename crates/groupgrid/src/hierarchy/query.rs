//! Paged queries of the tree-fetch protocol.

/// A paged request for a flat list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Query {
    /// Number of rows to skip.
    pub offset: usize,
    /// Maximum number of rows to return (`None` for all).
    pub limit: Option<usize>,
}

impl Query {
    /// A query for everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// A query for `limit` rows starting at `offset`.
    pub fn range(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }

    /// Applies this query's offset and limit to `rows`.
    pub fn page<T>(&self, rows: Vec<T>) -> Vec<T> {
        let rows = rows.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => rows.take(limit).collect(),
            None => rows.collect(),
        }
    }
}

/// A paged request for the children of one row.
#[derive(Debug, Clone)]
pub struct HierarchicalQuery<T> {
    /// The row whose children are requested, or `None` for the top level.
    pub parent: Option<T>,
    /// Offset and limit within the children.
    pub page: Query,
}

impl<T> HierarchicalQuery<T> {
    /// All top-level rows.
    pub fn roots() -> Self {
        Self {
            parent: None,
            page: Query::all(),
        }
    }

    /// All children of `parent`.
    pub fn children_of(parent: T) -> Self {
        Self {
            parent: Some(parent),
            page: Query::all(),
        }
    }

    /// Restricts the query to a page.
    pub fn with_page(mut self, page: Query) -> Self {
        self.page = page;
        self
    }
}
