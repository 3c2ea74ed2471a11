//! Segment rules
//!
//! A segment is one `(field, value)` equality rule. Membership is never
//! materialised; [`matches`] is evaluated against a single profile when a
//! journey starts.

use crate::error::{PlatformError, PlatformResult};
use crate::types::{Profile, Segment};
use crate::value::loose_eq_text;
use serde::{Deserialize, Serialize};

/// Whether `profile` satisfies `segment`
///
/// Loose equality between `profile[segment.field]` and `segment.value`: text
/// compares exactly, numbers and booleans compare numerically after converting
/// the rule text, and a missing or null field never matches.
#[must_use]
pub fn matches(profile: &Profile, segment: &Segment) -> bool {
    loose_eq_text(profile.get(&segment.field), &segment.value)
}

/// Ordered list of segments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentRules {
    segments: Vec<Segment>,
}

impl SegmentRules {
    /// Create empty list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing list
    #[inline]
    #[must_use]
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Append a segment after trimming its parts
    ///
    /// # Errors
    /// [`PlatformError::SegmentFieldsRequired`] if name, field or value is blank.
    pub fn create(&mut self, name: &str, field: &str, value: &str) -> PlatformResult<&Segment> {
        let (name, field, value) = (name.trim(), field.trim(), value.trim());
        if name.is_empty() || field.is_empty() || value.is_empty() {
            return Err(PlatformError::SegmentFieldsRequired);
        }

        self.segments.push(Segment::new(name, field, value));
        let idx = self.segments.len() - 1;
        Ok(&self.segments[idx])
    }

    /// Remove the segment at `index`
    ///
    /// # Errors
    /// [`PlatformError::SegmentNotFound`] if `index` is out of range.
    pub fn delete(&mut self, index: usize) -> PlatformResult<Segment> {
        if index >= self.segments.len() {
            return Err(PlatformError::SegmentNotFound {
                index,
                available: self.segments.len(),
            });
        }
        Ok(self.segments.remove(index))
    }

    /// Segment at `index`
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// All segments
    #[inline]
    #[must_use]
    pub fn list(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if there are no segments
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// `field = value` rendering of a rule
#[must_use]
pub fn rule_summary(segment: &Segment) -> String {
    format!("{} = {}", segment.field, segment.value)
}
