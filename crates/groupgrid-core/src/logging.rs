//! Logging and debugging facilities for groupgrid.
//!
//! This module provides:
//! - Target and span names for the `tracing` instrumentation of every subsystem
//! - A generic text renderer for trees ([`TreeDebug`] over any [`TreeSource`])
//! - Performance tracing hooks for profiling ([`PerfSpan`])
//!
//! # Tracing Integration
//!
//! groupgrid uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("groupgrid::grouping=debug,groupgrid::hierarchy=warn")
//!     .init();
//! ```
//!
//! # Debug Visualization
//!
//! ```
//! use groupgrid_core::logging::{TreeDebug, TreeFormatOptions, TreeSource, TreeStyle};
//!
//! struct Fixed;
//!
//! impl TreeSource for Fixed {
//!     type Node = &'static str;
//!
//!     fn title(&self) -> String {
//!         "Departments".into()
//!     }
//!     fn roots(&self) -> Vec<Self::Node> {
//!         vec!["Eng", "Sales"]
//!     }
//!     fn children(&self, node: &Self::Node) -> Vec<Self::Node> {
//!         if *node == "Eng" { vec!["A", "B"] } else { Vec::new() }
//!     }
//!     fn label(&self, node: &Self::Node) -> String {
//!         node.to_string()
//!     }
//! }
//!
//! let debug = TreeDebug::with_options(TreeFormatOptions {
//!     style: TreeStyle::Ascii,
//!     ..TreeFormatOptions::minimal()
//! });
//! let text = debug.format(&Fixed);
//! assert!(text.contains("+-- A"));
//! ```

use std::fmt::Write as FmtWrite;

/// Span names used throughout groupgrid for tracing.
///
/// These constants can be used to filter traces for specific operations.
pub mod span_names {
    /// Full regroup pass over the item source.
    pub const REGROUP: &str = "groupgrid::regroup";
    /// Rebuild of the synthetic group row maps.
    pub const GROUP_ROWS: &str = "groupgrid::group_rows";
    /// Aggregation over all leaf items.
    pub const AGGREGATE: &str = "groupgrid::aggregate";
    /// Serving one client range request.
    pub const RANGE_REQUEST: &str = "groupgrid::range_request";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core primitives target.
    pub const CORE: &str = "groupgrid_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "groupgrid_core::signal";
    /// Item source and schema model target.
    pub const MODEL: &str = "groupgrid::model";
    /// Grouping engine target.
    pub const GROUPING: &str = "groupgrid::grouping";
    /// Hierarchical adapter and data communicator target.
    pub const HIERARCHY: &str = "groupgrid::hierarchy";
    /// Aggregation overlay target.
    pub const AGGREGATION: &str = "groupgrid::aggregation";
    /// Grid facade and column registry target.
    pub const GRID: &str = "groupgrid::grid";
    /// Performance spans target.
    pub const PERF: &str = "groupgrid::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact dash-prefixed representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node ids.
    pub show_ids: bool,
    /// Whether to show node kinds.
    pub show_kinds: bool,
    /// Whether to list the leaf entries attached to each node.
    pub show_leaves: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_kinds: true,
            show_leaves: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_leaves: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_kinds: false,
            show_leaves: false,
            ..Default::default()
        }
    }
}

/// A tree that can be rendered by [`TreeDebug`].
pub trait TreeSource {
    /// Handle for one node of the tree.
    type Node;

    /// Heading printed above the tree.
    fn title(&self) -> String;

    /// Top-level nodes in display order.
    fn roots(&self) -> Vec<Self::Node>;

    /// Direct children of `node` in display order.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Main text for `node`.
    fn label(&self, node: &Self::Node) -> String;

    /// Short identifier shown when `show_ids` is set.
    fn node_id(&self, _node: &Self::Node) -> Option<String> {
        None
    }

    /// Kind shown when `show_kinds` is set.
    fn node_kind(&self, _node: &Self::Node) -> Option<String> {
        None
    }

    /// Leaf entries listed under `node` when `show_leaves` is set.
    fn leaves(&self, _node: &Self::Node) -> Vec<String> {
        Vec::new()
    }
}

/// Renders a [`TreeSource`] as indented text.
#[derive(Debug, Clone, Default)]
pub struct TreeDebug {
    options: TreeFormatOptions,
}

impl TreeDebug {
    /// Create a renderer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Render the whole tree.
    pub fn format<S: TreeSource>(&self, source: &S) -> String {
        let roots = source.roots();
        let mut output = format!("{} ({} roots):\n", source.title(), roots.len());

        if roots.is_empty() {
            output.push_str("  (empty)\n");
            return output;
        }

        let count = roots.len();
        for (i, root) in roots.iter().enumerate() {
            self.format_node_into(source, root, 0, i + 1 == count, &mut output);
        }
        output
    }

    fn format_node_into<S: TreeSource>(
        &self,
        source: &S,
        node: &S::Node,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(&source.label(node));

        if self.options.show_ids
            && let Some(id) = source.node_id(node)
        {
            let _ = write!(output, " [{id}]");
        }
        if self.options.show_kinds
            && let Some(kind) = source.node_kind(node)
        {
            let _ = write!(output, " ({kind})");
        }
        output.push('\n');

        if self.options.show_leaves {
            let leaf_prefix = self.build_leaf_prefix(depth);
            for leaf in source.leaves(node) {
                let _ = writeln!(output, "{leaf_prefix}  .{leaf}");
            }
        }

        let children = source.children(node);
        let count = children.len();
        for (i, child) in children.iter().enumerate() {
            self.format_node_into(source, child, depth + 1, i + 1 == count, output);
        }
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }

    fn build_leaf_prefix(&self, depth: usize) -> String {
        let branch = match self.options.style {
            TreeStyle::Ascii => "|",
            TreeStyle::Unicode => "\u{2502}",
            TreeStyle::Compact => "",
        };

        let mut prefix = String::new();
        for _ in 0..depth {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "groupgrid::perf", "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}
