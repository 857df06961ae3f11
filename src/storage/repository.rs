//! Storage contract consumed by the lifecycle engine

use crate::domain::{ObjectKind, ObjectStatus, Priority, TrellisObject};
use crate::error::Result;

/// Filters for [`Repository::get_objects`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectQuery {
    /// Include done and wont-do objects
    pub include_closed: bool,

    /// Restrict to the subtree rooted at this id
    pub scope: Option<String>,

    pub kind: Option<ObjectKind>,
    pub status: Option<ObjectStatus>,
    pub priority: Option<Priority>,
}

impl ObjectQuery {
    /// Every object, closed ones included
    pub fn everything() -> Self {
        Self {
            include_closed: true,
            ..Self::default()
        }
    }

    pub fn include_closed(mut self, include_closed: bool) -> Self {
        self.include_closed = include_closed;
        self
    }

    pub fn scope(mut self, scope: Option<&str>) -> Self {
        self.scope = scope.map(str::to_string);
        self
    }

    pub fn kind(mut self, kind: ObjectKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn status(mut self, status: ObjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Applies the object-level filters (everything except scope)
    pub fn accepts(&self, object: &TrellisObject) -> bool {
        (self.include_closed || !object.is_closed())
            && self.kind.map_or(true, |k| object.kind == k)
            && self.status.map_or(true, |s| object.status == s)
            && self.priority.map_or(true, |p| object.priority == p)
    }
}

/// Persistence operations the engine is built on.
///
/// Implementations re-read their backing store on every call; nothing is
/// cached between calls.
pub trait Repository {
    /// Loads a single object, or None if no object has this id
    fn get_object_by_id(&self, id: &str) -> Result<Option<TrellisObject>>;

    /// Lists objects matching the query, in a deterministic order
    fn get_objects(&self, query: &ObjectQuery) -> Result<Vec<TrellisObject>>;

    /// Writes an object at its canonical location
    fn save_object(&self, object: &TrellisObject) -> Result<()>;

    /// Deletes an object. Without `force`, refuses when a non-closed object
    /// still lists it as a prerequisite.
    fn delete_object(&self, id: &str, force: bool) -> Result<TrellisObject>;

    /// Lists the direct children of an object
    fn get_children_of(&self, parent_id: &str, include_closed: bool) -> Result<Vec<TrellisObject>> {
        let query = ObjectQuery::default()
            .include_closed(include_closed)
            .scope(Some(parent_id));
        Ok(self
            .get_objects(&query)?
            .into_iter()
            .filter(|o| o.parent.as_deref() == Some(parent_id))
            .collect())
    }
}

impl<R: Repository + ?Sized> Repository for &R {
    fn get_object_by_id(&self, id: &str) -> Result<Option<TrellisObject>> {
        (**self).get_object_by_id(id)
    }

    fn get_objects(&self, query: &ObjectQuery) -> Result<Vec<TrellisObject>> {
        (**self).get_objects(query)
    }

    fn save_object(&self, object: &TrellisObject) -> Result<()> {
        (**self).save_object(object)
    }

    fn delete_object(&self, id: &str, force: bool) -> Result<TrellisObject> {
        (**self).delete_object(id, force)
    }

    fn get_children_of(&self, parent_id: &str, include_closed: bool) -> Result<Vec<TrellisObject>> {
        (**self).get_children_of(parent_id, include_closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_skips_closed() {
        let open = TrellisObject::new("T-a", "A").unwrap();
        let done = TrellisObject::new("T-b", "B")
            .unwrap()
            .with_status(ObjectStatus::Done);

        let query = ObjectQuery::default();
        assert!(query.accepts(&open));
        assert!(!query.accepts(&done));
        assert!(ObjectQuery::everything().accepts(&done));
    }

    #[test]
    fn query_filters_combine() {
        let task = TrellisObject::new("T-a", "A")
            .unwrap()
            .with_priority(Priority::High);

        assert!(ObjectQuery::default().kind(ObjectKind::Task).accepts(&task));
        assert!(!ObjectQuery::default().kind(ObjectKind::Feature).accepts(&task));
        assert!(ObjectQuery::default()
            .priority(Priority::High)
            .status(ObjectStatus::Open)
            .accepts(&task));
        assert!(!ObjectQuery::default().priority(Priority::Low).accepts(&task));
    }
}
