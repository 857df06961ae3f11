//! In-memory repository double for engine tests

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use super::prerequisites::is_required_for_other_objects;
use crate::domain::TrellisObject;
use crate::error::{Result, TrellisError};
use crate::storage::{ObjectQuery, Repository};

/// Keeps objects in a map and records every save
#[derive(Default)]
pub struct MemoryRepository {
    objects: RefCell<BTreeMap<String, TrellisObject>>,
    saves: RefCell<Vec<String>>,
    failing: RefCell<HashSet<String>>,
}

impl MemoryRepository {
    pub fn with(objects: impl IntoIterator<Item = TrellisObject>) -> Self {
        let repo = Self::default();
        for object in objects {
            repo.objects.borrow_mut().insert(object.id.clone(), object);
        }
        repo
    }

    /// Ids passed to `save_object`, in call order
    pub fn saved_ids(&self) -> Vec<String> {
        self.saves.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.borrow().len()
    }

    /// Makes every later save of this id fail
    pub fn fail_saves_of(&self, id: &str) {
        self.failing.borrow_mut().insert(id.to_string());
    }

    pub fn get(&self, id: &str) -> TrellisObject {
        self.objects.borrow()[id].clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.borrow().contains_key(id)
    }

    fn in_scope(&self, object: &TrellisObject, scope: &str) -> bool {
        let objects = self.objects.borrow();
        let mut visited = HashSet::new();
        let mut current = Some(object.id.clone());

        while let Some(id) = current {
            if id == scope {
                return true;
            }
            if !visited.insert(id.clone()) {
                return false;
            }
            current = objects.get(&id).and_then(|o| o.parent.clone());
        }
        false
    }
}

impl Repository for MemoryRepository {
    fn get_object_by_id(&self, id: &str) -> Result<Option<TrellisObject>> {
        Ok(self.objects.borrow().get(id).cloned())
    }

    fn get_objects(&self, query: &ObjectQuery) -> Result<Vec<TrellisObject>> {
        let all: Vec<TrellisObject> = self.objects.borrow().values().cloned().collect();
        Ok(all
            .into_iter()
            .filter(|o| query.accepts(o))
            .filter(|o| query.scope.as_deref().map_or(true, |s| self.in_scope(o, s)))
            .collect())
    }

    fn save_object(&self, object: &TrellisObject) -> Result<()> {
        self.saves.borrow_mut().push(object.id.clone());
        if self.failing.borrow().contains(&object.id) {
            return Err(TrellisError::io(
                &object.id,
                std::io::Error::new(std::io::ErrorKind::Other, "simulated write failure"),
            ));
        }
        self.objects
            .borrow_mut()
            .insert(object.id.clone(), object.clone());
        Ok(())
    }

    fn delete_object(&self, id: &str, force: bool) -> Result<TrellisObject> {
        let object = self
            .get_object_by_id(id)?
            .ok_or_else(|| TrellisError::NotFound(id.to_string()))?;

        if !force && is_required_for_other_objects(self, &object)? {
            return Err(TrellisError::Dependency(format!("{} is still required", id)));
        }

        let doomed: Vec<String> = if object.kind.owns_folder() {
            let all: Vec<TrellisObject> = self.objects.borrow().values().cloned().collect();
            all.iter()
                .filter(|o| self.in_scope(o, id))
                .map(|o| o.id.clone())
                .collect()
        } else {
            vec![id.to_string()]
        };

        let mut objects = self.objects.borrow_mut();
        for doomed_id in doomed {
            objects.remove(&doomed_id);
        }
        Ok(object)
    }
}
