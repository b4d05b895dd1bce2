//! Filter state for analytics queries
//!
//! [`FilterState`] is an immutable value object: every transition consumes
//! the current state and returns the next one, so the controller that owns
//! it can compare old and new values to decide whether a refetch is needed.
//!
//! # Examples
//!
//! ```
//! use traceboard_core::filters::FilterState;
//! use traceboard_core::types::{ProjectId, TimeRange};
//!
//! let filter = FilterState::new()
//!     .with_time_range(TimeRange::Last7d)
//!     .toggle_project(ProjectId::new("p1"));
//!
//! assert_eq!(filter.time_range(), TimeRange::Last7d);
//! assert!(filter.has_active_filters());
//! ```

use crate::error::{Result, TraceboardError};
use crate::types::{Granularity, ProjectId, TimeRange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Current query scope of the dashboard
///
/// Custom bounds only exist while the time range is [`TimeRange::Custom`].
/// An empty project selection means "all projects".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    time_range: TimeRange,
    custom_start: Option<DateTime<Utc>>,
    custom_end: Option<DateTime<Utc>>,
    selected_projects: BTreeSet<ProjectId>,
}

impl FilterState {
    /// All time, no custom bounds, every project
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    pub fn custom_start(&self) -> Option<DateTime<Utc>> {
        self.custom_start
    }

    pub fn custom_end(&self) -> Option<DateTime<Utc>> {
        self.custom_end
    }

    /// Selected projects in a stable (sorted) order
    pub fn selected_projects(&self) -> &BTreeSet<ProjectId> {
        &self.selected_projects
    }

    /// Replace the time range
    ///
    /// Leaving `Custom` drops both custom bounds so they cannot silently
    /// come back when `Custom` is selected again.
    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = range;
        if range != TimeRange::Custom {
            self.custom_start = None;
            self.custom_end = None;
        }
        self
    }

    /// Set the custom bounds
    ///
    /// Either bound may be absent while the user is still picking dates.
    ///
    /// # Errors
    ///
    /// - [`TraceboardError::InvalidRange`] when both bounds are set and
    ///   `start > end`
    /// - [`TraceboardError::InvalidArgument`] when the time range is not
    ///   `Custom`
    pub fn with_custom_range(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        if self.time_range != TimeRange::Custom {
            return Err(TraceboardError::InvalidArgument(format!(
                "custom bounds require time range 'custom' (current: '{}')",
                self.time_range
            )));
        }

        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(TraceboardError::InvalidRange { start, end });
        }

        self.custom_start = start;
        self.custom_end = end;
        Ok(self)
    }

    /// Add the project if absent, remove it if present
    pub fn toggle_project(mut self, id: ProjectId) -> Self {
        if !self.selected_projects.remove(&id) {
            self.selected_projects.insert(id);
        }
        self
    }

    /// Replace the whole project selection
    pub fn with_projects(mut self, ids: impl IntoIterator<Item = ProjectId>) -> Self {
        self.selected_projects = ids.into_iter().collect();
        self
    }

    /// Reset to all time, no bounds, every project
    pub fn clear(self) -> Self {
        Self::default()
    }

    /// True when anything narrows the default scope
    pub fn has_active_filters(&self) -> bool {
        self.time_range != TimeRange::AllTime
            || !self.selected_projects.is_empty()
            || self.custom_start.is_some()
            || self.custom_end.is_some()
    }

    /// True when the service can answer a query for this state
    ///
    /// A custom range needs both bounds before it can be sent.
    pub fn is_queryable(&self) -> bool {
        self.time_range != TimeRange::Custom
            || (self.custom_start.is_some() && self.custom_end.is_some())
    }

    /// Concrete `(start, end)` window this filter covers at `now`
    ///
    /// `None` on either side means unbounded.
    pub fn resolved_bounds(
        &self,
        now: DateTime<Utc>,
    ) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self.time_range {
            TimeRange::Custom => (self.custom_start, self.custom_end),
            TimeRange::AllTime => (None, None),
            range => match range.rolling_window() {
                Some(window) => (Some(now - window), Some(now)),
                None => (None, None),
            },
        }
    }

    /// Trend granularity the service is expected to pick for this scope
    pub fn expected_granularity(&self) -> Granularity {
        match self.time_range {
            TimeRange::Last24h => Granularity::Hour,
            TimeRange::Last7d | TimeRange::Last30d | TimeRange::AllTime => Granularity::Day,
            TimeRange::Custom => match (self.custom_start, self.custom_end) {
                (Some(start), Some(end)) => {
                    let days = (end - start).num_days();
                    if days <= 2 {
                        Granularity::Hour
                    } else if days <= 90 {
                        Granularity::Day
                    } else {
                        Granularity::Week
                    }
                }
                _ => Granularity::Day,
            },
        }
    }
}

/// A single user edit to the filter
///
/// The controller receives edits rather than whole states so that every
/// transition goes through the validated [`FilterState`] methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    TimeRange(TimeRange),
    CustomRange {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
    ToggleProject(ProjectId),
    Projects(Vec<ProjectId>),
    Clear,
}

impl FilterChange {
    /// Apply this edit to `current`, producing the next state
    pub fn apply(self, current: &FilterState) -> Result<FilterState> {
        let next = current.clone();
        let next = match self {
            Self::TimeRange(range) => next.with_time_range(range),
            Self::CustomRange { start, end } => next.with_custom_range(start, end)?,
            Self::ToggleProject(id) => next.toggle_project(id),
            Self::Projects(ids) => next.with_projects(ids),
            Self::Clear => next.clear(),
        };
        debug!(?next, "Applied filter change");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_leaving_custom_clears_bounds() {
        let filter = FilterState::new()
            .with_time_range(TimeRange::Custom)
            .with_custom_range(Some(day(1)), Some(day(10)))
            .unwrap()
            .with_time_range(TimeRange::Last7d);

        assert_eq!(filter.custom_start(), None);
        assert_eq!(filter.custom_end(), None);

        // Returning to custom must not resurrect the old bounds
        let filter = filter.with_time_range(TimeRange::Custom);
        assert_eq!(filter.custom_start(), None);
        assert!(!filter.is_queryable());
    }

    #[test]
    fn test_reversed_custom_range_is_rejected() {
        let result = FilterState::new()
            .with_time_range(TimeRange::Custom)
            .with_custom_range(Some(day(10)), Some(day(1)));

        match result {
            Err(TraceboardError::InvalidRange { start, end }) => {
                assert_eq!(start, day(10));
                assert_eq!(end, day(1));
            }
            other => panic!("expected InvalidRange, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_range_requires_custom_time_range() {
        let result = FilterState::new().with_custom_range(Some(day(1)), Some(day(2)));
        assert!(matches!(result, Err(TraceboardError::InvalidArgument(_))));
    }

    #[test]
    fn test_partial_custom_range_is_not_queryable() {
        let filter = FilterState::new()
            .with_time_range(TimeRange::Custom)
            .with_custom_range(Some(day(1)), None)
            .unwrap();
        assert!(!filter.is_queryable());

        let filter = filter.with_custom_range(Some(day(1)), Some(day(1))).unwrap();
        assert!(filter.is_queryable());
    }

    #[test]
    fn test_toggle_project_is_symmetric() {
        let p1 = ProjectId::new("p1");
        let filter = FilterState::new().toggle_project(p1.clone());
        assert!(filter.selected_projects().contains(&p1));

        let filter = filter.toggle_project(p1.clone());
        assert!(filter.selected_projects().is_empty());
        assert_eq!(filter, FilterState::new());
    }

    #[test]
    fn test_clear_resets_everything() {
        let filter = FilterState::new()
            .with_time_range(TimeRange::Custom)
            .with_custom_range(Some(day(1)), Some(day(2)))
            .unwrap()
            .toggle_project(ProjectId::new("p1"))
            .clear();

        assert_eq!(filter, FilterState::new());
        assert_eq!(filter.time_range(), TimeRange::AllTime);
        assert!(!filter.has_active_filters());
    }

    #[test]
    fn test_resolved_bounds() {
        let now = day(20);
        let filter = FilterState::new().with_time_range(TimeRange::Last7d);
        assert_eq!(filter.resolved_bounds(now), (Some(day(13)), Some(now)));

        assert_eq!(FilterState::new().resolved_bounds(now), (None, None));
    }

    #[test]
    fn test_expected_granularity_for_custom_spans() {
        let base = FilterState::new().with_time_range(TimeRange::Custom);
        let short = base.clone().with_custom_range(Some(day(1)), Some(day(2))).unwrap();
        let medium = base.clone().with_custom_range(Some(day(1)), Some(day(30))).unwrap();
        let long = base
            .with_custom_range(
                Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
                Some(day(1)),
            )
            .unwrap();

        assert_eq!(short.expected_granularity(), Granularity::Hour);
        assert_eq!(medium.expected_granularity(), Granularity::Day);
        assert_eq!(long.expected_granularity(), Granularity::Week);
    }

    #[test]
    fn test_filter_change_apply() {
        let filter = FilterChange::TimeRange(TimeRange::Custom)
            .apply(&FilterState::new())
            .unwrap();
        let filter = FilterChange::CustomRange {
            start: Some(day(1)),
            end: Some(day(3)),
        }
        .apply(&filter)
        .unwrap();
        assert_eq!(filter.custom_end(), Some(day(3)));

        let err = FilterChange::CustomRange {
            start: Some(day(3)),
            end: Some(day(1)),
        }
        .apply(&filter)
        .unwrap_err();
        assert!(matches!(err, TraceboardError::InvalidRange { .. }));

        let filter = FilterChange::Projects(vec![ProjectId::new("b"), ProjectId::new("a")])
            .apply(&filter)
            .unwrap();
        let ids: Vec<_> = filter.selected_projects().iter().map(|p| p.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
