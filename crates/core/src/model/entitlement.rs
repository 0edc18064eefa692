use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::ids::CourseId;

/// Set of courses the current user has purchased.
///
/// Grows only through [`Entitlement::grant`]; there is no refund path.
/// Serializes as a plain sequence of course id strings. Order is not
/// significant and duplicates collapse on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entitlement {
    purchased: BTreeSet<CourseId>,
}

impl Entitlement {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from persisted course ids.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = CourseId>) -> Self {
        Self {
            purchased: ids.into_iter().collect(),
        }
    }

    /// Adds `course_id` to the purchased set.
    ///
    /// Returns `true` if the course was not purchased before.
    pub fn grant(&mut self, course_id: CourseId) -> bool {
        self.purchased.insert(course_id)
    }

    #[must_use]
    pub fn contains(&self, course_id: &CourseId) -> bool {
        self.purchased.contains(course_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.purchased.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.purchased.is_empty()
    }
}
