//! Derived views over the state
//!
//! Nothing here is stored; every view is recomputed from [`PlatformState`]
//! after a mutation.

use crate::journey::preview;
use crate::schema::field_summary;
use crate::segment::rule_summary;
use crate::state::PlatformState;
use crate::types::{JourneyRecord, Profile};
use crate::value::{cell_string, display_string};
use chrono::{DateTime, Local};

/// Entity counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuickStats {
    /// Number of schemas
    pub schemas: usize,
    /// Number of profiles
    pub profiles: usize,
    /// Number of segments
    pub segments: usize,
}

impl QuickStats {
    /// Count entities in `state`
    #[must_use]
    pub fn from_state(state: &PlatformState) -> Self {
        Self {
            schemas: state.schemas.len(),
            profiles: state.profiles.len(),
            segments: state.segments.len(),
        }
    }
}

impl std::fmt::Display for QuickStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Schemas: {}", self.schemas)?;
        writeln!(f, "Profiles: {}", self.profiles)?;
        write!(f, "Segments: {}", self.segments)
    }
}

/// Header plus rows of text cells
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Column titles
    pub header: Vec<String>,
    /// Row cells, each as long as `header`
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Check if the table has no rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as aligned plain text, `empty` when there are no rows
    #[must_use]
    pub fn render(&self, empty: &str) -> String {
        if self.rows.is_empty() {
            return empty.to_string();
        }

        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{c:<w$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = vec![line(&self.header)];
        out.extend(self.rows.iter().map(|r| line(r)));
        out.join("\n")
    }
}

/// Schemas: name, field summaries
#[must_use]
pub fn schema_table(state: &PlatformState) -> Table {
    Table {
        header: vec!["Name".into(), "Fields".into()],
        rows: state
            .schemas
            .list()
            .iter()
            .map(|s| {
                let fields = s.fields.iter().map(field_summary).collect::<Vec<_>>().join(", ");
                vec![s.name.clone(), fields]
            })
            .collect(),
    }
}

/// Profiles, with the first profile's keys as columns
///
/// Profiles from other schemas show empty cells for keys they lack.
#[must_use]
pub fn profile_table(profiles: &[Profile]) -> Table {
    let Some(first) = profiles.first() else {
        return Table::default();
    };
    let header: Vec<String> = first.keys().map(str::to_string).collect();
    let rows = profiles
        .iter()
        .map(|p| header.iter().map(|k| cell_string(p.get(k))).collect())
        .collect();
    Table { header, rows }
}

/// Segments: name, rule
#[must_use]
pub fn segment_table(state: &PlatformState) -> Table {
    Table {
        header: vec!["#".into(), "Name".into(), "Rule".into()],
        rows: state
            .segments
            .list()
            .iter()
            .enumerate()
            .map(|(i, s)| vec![i.to_string(), s.name.clone(), rule_summary(s)])
            .collect(),
    }
}

/// Journey log: local start time, preview
#[must_use]
pub fn journey_table(journeys: &[JourneyRecord]) -> Table {
    Table {
        header: vec!["Started".into(), "Profile".into()],
        rows: journeys
            .iter()
            .map(|j| vec![format_started_at(j.started_at), j.profile_preview.clone()])
            .collect(),
    }
}

/// Epoch milliseconds as local date-time text
#[must_use]
pub fn format_started_at(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis).map_or_else(
        || millis.to_string(),
        |utc| {
            utc.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        },
    )
}

/// Label offered when choosing a profile for a journey
#[must_use]
pub fn profile_label(index: usize, profile: &Profile) -> String {
    let label = preview(profile);
    if label.is_empty() {
        format!("Profile {index}")
    } else {
        label
    }
}

/// Profiles with any value containing `query`, ignoring case
#[must_use]
pub fn search_profiles<'a>(profiles: &'a [Profile], query: &str) -> Vec<&'a Profile> {
    let needle = query.to_lowercase();
    profiles
        .iter()
        .filter(|p| {
            p.values()
                .any(|v| display_string(v).to_lowercase().contains(&needle))
        })
        .collect()
}
