//! Read-only catalog seam consumed by the entitlement store.

use std::collections::HashMap;

use thiserror::Error;

use crate::model::{Course, CourseId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("course {0} appears more than once in the catalog")]
    DuplicateCourse(CourseId),
}

/// Resident, read-only view of the course catalog.
pub trait Catalog {
    fn get_course(&self, id: &CourseId) -> Option<&Course>;

    /// All courses in catalog order.
    fn list_courses(&self) -> &[Course];
}

/// In-memory catalog loaded once before the store is constructed.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    courses: Vec<Course>,
    index: HashMap<CourseId, usize>,
}

impl CatalogSnapshot {
    /// Build a snapshot preserving the given order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateCourse` if two courses share an id.
    pub fn new(courses: Vec<Course>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(courses.len());
        for (pos, course) in courses.iter().enumerate() {
            if index.insert(course.id().clone(), pos).is_some() {
                return Err(CatalogError::DuplicateCourse(course.id().clone()));
            }
        }
        Ok(Self { courses, index })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl Catalog for CatalogSnapshot {
    fn get_course(&self, id: &CourseId) -> Option<&Course> {
        self.index.get(id).map(|&pos| &self.courses[pos])
    }

    fn list_courses(&self) -> &[Course] {
        &self.courses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Price;

    fn course(id: &str) -> Course {
        Course::new(CourseId::new(id), format!("Course {id}"), "Staff", Price::default(), vec![])
            .unwrap()
    }

    #[test]
    fn lookup_and_order() {
        let catalog = CatalogSnapshot::new(vec![course("b"), course("a")]).unwrap();
        let ids: Vec<_> = catalog.list_courses().iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(catalog.get_course(&CourseId::new("a")).unwrap().title(), "Course a");
        assert!(catalog.get_course(&CourseId::new("zzz")).is_none());
    }

    #[test]
    fn rejects_duplicates() {
        let err = CatalogSnapshot::new(vec![course("a"), course("a")]).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateCourse(CourseId::new("a")));
    }
}
