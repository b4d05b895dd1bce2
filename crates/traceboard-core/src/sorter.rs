//! Client-side ranking of top traces
//!
//! Sorting is stable: traces with equal keys keep the order the service
//! returned them in. [`TopTracesView`] holds the table state (sort field,
//! direction, expanded or not) and always sorts the full result set before
//! truncating to the visible rows.
//!
//! # Examples
//!
//! ```
//! use traceboard_core::sorter::{SortDirection, SortField, TopTracesView};
//!
//! let mut view = TopTracesView::new(Vec::new());
//! assert_eq!(view.field(), SortField::TotalTokens);
//! assert_eq!(view.direction(), SortDirection::Desc);
//!
//! view.toggle_sort(SortField::TotalTokens);
//! assert_eq!(view.direction(), SortDirection::Asc);
//! ```

use crate::analytics_types::TraceStat;
use crate::query::TopTracesMetric;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Rows shown before the table is expanded
pub const DEFAULT_DISPLAY_LIMIT: usize = 10;

/// Sortable column of the top-traces table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    TotalTokens,
    TotalCost,
    DurationMs,
}

impl SortField {
    fn compare(&self, a: &TraceStat, b: &TraceStat) -> Ordering {
        match self {
            Self::TotalTokens => a.total_tokens.cmp(&b.total_tokens),
            Self::TotalCost => a.total_cost.total_cmp(&b.total_cost),
            Self::DurationMs => a.duration_ms.total_cmp(&b.duration_ms),
        }
    }
}

impl From<SortField> for TopTracesMetric {
    fn from(field: SortField) -> Self {
        match field {
            SortField::TotalTokens => TopTracesMetric::Tokens,
            SortField::TotalCost => TopTracesMetric::Cost,
            SortField::DurationMs => TopTracesMetric::Duration,
        }
    }
}

impl From<TopTracesMetric> for SortField {
    fn from(metric: TopTracesMetric) -> Self {
        match metric {
            TopTracesMetric::Tokens => SortField::TotalTokens,
            TopTracesMetric::Cost => SortField::TotalCost,
            TopTracesMetric::Duration => SortField::DurationMs,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TotalTokens => write!(f, "total_tokens"),
            Self::TotalCost => write!(f, "total_cost"),
            Self::DurationMs => write!(f, "duration_ms"),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Stable sort of `traces` by `field`
///
/// Equal keys keep their input order in both directions.
pub fn sort_top_traces(
    traces: &[TraceStat],
    field: SortField,
    direction: SortDirection,
) -> Vec<TraceStat> {
    let mut sorted = traces.to_vec();
    // slice::sort_by is stable; reversing the comparator keeps ties in place
    match direction {
        SortDirection::Asc => sorted.sort_by(|a, b| field.compare(a, b)),
        SortDirection::Desc => sorted.sort_by(|a, b| field.compare(b, a)),
    }
    sorted
}

/// Sort and expansion state of the top-traces table
#[derive(Debug, Clone)]
pub struct TopTracesView {
    traces: Vec<TraceStat>,
    field: SortField,
    direction: SortDirection,
    show_all: bool,
    display_limit: usize,
}

impl TopTracesView {
    /// View over the server-ordered `traces`, tokens descending, collapsed
    pub fn new(traces: Vec<TraceStat>) -> Self {
        Self {
            traces,
            field: SortField::default(),
            direction: SortDirection::default(),
            show_all: false,
            display_limit: DEFAULT_DISPLAY_LIMIT,
        }
    }

    pub fn with_display_limit(mut self, limit: usize) -> Self {
        self.display_limit = limit;
        self
    }

    /// Start with an explicit sort
    pub fn with_sort(mut self, field: SortField, direction: SortDirection) -> Self {
        self.field = field;
        self.direction = direction;
        self
    }

    /// Replace the data, keeping the sort state
    pub fn set_traces(&mut self, traces: Vec<TraceStat>) {
        self.traces = traces;
    }

    pub fn field(&self) -> SortField {
        self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn is_expanded(&self) -> bool {
        self.show_all
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Whether an expand toggle is meaningful
    pub fn can_expand(&self) -> bool {
        self.traces.len() > self.display_limit
    }

    /// Column header click
    ///
    /// The current field flips direction; a new field starts descending.
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Desc;
        }
    }

    pub fn toggle_expanded(&mut self) {
        self.show_all = !self.show_all;
    }

    /// Every trace in the current order
    pub fn sorted(&self) -> Vec<TraceStat> {
        sort_top_traces(&self.traces, self.field, self.direction)
    }

    /// Rows to display: the sorted set, truncated unless expanded
    pub fn visible(&self) -> Vec<TraceStat> {
        let mut rows = self.sorted();
        if !self.show_all {
            rows.truncate(self.display_limit);
        }
        rows
    }
}
