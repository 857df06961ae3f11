//! Filesystem store
//!
//! Objects live as markdown files in a directory tree under `.trellis/`
//! whose layout encodes containment (see [`super::paths`]). There is no
//! index: every call re-scans the tree.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::markdown::{parse_document, render_document};
use super::paths::resolve_path;
use super::repository::{ObjectQuery, Repository};
use super::scanner::{scan_documents, ScanOptions};
use crate::domain::TrellisObject;
use crate::engine::is_required_for_other_objects;
use crate::error::{Result, TrellisError};

/// Name of the store directory inside a project
pub const STORE_DIR: &str = ".trellis";

/// Store for objects as markdown files
#[derive(Debug, Clone)]
pub struct LocalRepository {
    /// Store root containing `p/`, `f/` and `t/`
    root: PathBuf,
}

impl LocalRepository {
    /// Creates a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(STORE_DIR))
    }

    /// Returns the store root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads an object from a file
    fn read_from_file(&self, path: &Path) -> Result<TrellisObject> {
        let content = fs::read_to_string(path).map_err(|e| TrellisError::io(path, e))?;
        parse_document(&content)
    }

    /// Writes an object to a file atomically (temp file + rename)
    fn write_to_file(&self, path: &Path, object: &TrellisObject) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| TrellisError::io(dir, e))?;
        }

        let content = render_document(object)?;
        let temp_path = path.with_extension("md.tmp");

        fs::write(&temp_path, &content).map_err(|e| TrellisError::io(&temp_path, e))?;
        fs::rename(&temp_path, path).map_err(|e| TrellisError::io(path, e))?;

        Ok(())
    }

    /// Loads every document that passes `options`, skipping unparsable files
    pub fn load_documents(&self, options: &ScanOptions) -> Vec<(PathBuf, TrellisObject)> {
        scan_documents(&self.root, options)
            .into_iter()
            .filter_map(|path| match self.read_from_file(&path) {
                Ok(object) => Some((path, object)),
                Err(error) => {
                    tracing::warn!(path = %path.display(), error = %error, "skipping unreadable object file");
                    None
                }
            })
            .collect()
    }

    /// Finds files named after an id without parsing them
    fn files_named(&self, id: &str) -> Vec<PathBuf> {
        scan_documents(&self.root, &ScanOptions::all())
            .into_iter()
            .filter(|path| path.file_stem().is_some_and(|stem| stem == id))
            .collect()
    }

    /// Locates an object and its file by scanning and parsing the whole store
    pub fn locate(&self, id: &str) -> Option<(PathBuf, TrellisObject)> {
        self.load_documents(&ScanOptions::all())
            .into_iter()
            .find(|(_, object)| object.id == id)
    }

    /// Resolves the canonical path of an object
    pub fn path_of(&self, object: &TrellisObject) -> Result<PathBuf> {
        resolve_path(&self.root, object, |id| self.get_object_by_id(id))
    }
}

impl Repository for LocalRepository {
    fn get_object_by_id(&self, id: &str) -> Result<Option<TrellisObject>> {
        let mut found: Option<TrellisObject> = None;

        // A crash between write and stale-delete can leave two copies;
        // the most recently updated one wins.
        for path in self.files_named(id) {
            match self.read_from_file(&path) {
                Ok(object) if object.id == id => {
                    if found.as_ref().map_or(true, |f| object.updated > f.updated) {
                        found = Some(object);
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(path = %path.display(), error = %error, "skipping unreadable object file");
                }
            }
        }

        Ok(found)
    }

    fn get_objects(&self, query: &ObjectQuery) -> Result<Vec<TrellisObject>> {
        let options = ScanOptions {
            include_closed: query.include_closed,
            scope: query.scope.clone(),
        };

        // Same rule as lookup by id: of two copies, the newer one wins
        let mut objects: Vec<TrellisObject> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (_, object) in self.load_documents(&options) {
            match positions.get(&object.id) {
                Some(&at) => {
                    if object.updated > objects[at].updated {
                        objects[at] = object;
                    }
                }
                None => {
                    positions.insert(object.id.clone(), objects.len());
                    objects.push(object);
                }
            }
        }

        objects.retain(|object| query.accepts(object));
        Ok(objects)
    }

    fn save_object(&self, object: &TrellisObject) -> Result<()> {
        let path = self.path_of(object)?;
        let previous = self.files_named(&object.id);

        self.write_to_file(&path, object)?;

        for stale in previous.into_iter().filter(|p| p != &path) {
            tracing::debug!(id = %object.id, from = %stale.display(), to = %path.display(), "object moved");
            fs::remove_file(&stale).map_err(|e| TrellisError::io(&stale, e))?;
        }

        Ok(())
    }

    fn delete_object(&self, id: &str, force: bool) -> Result<TrellisObject> {
        let (path, object) = self
            .locate(id)
            .ok_or_else(|| TrellisError::NotFound(id.to_string()))?;

        if !force && is_required_for_other_objects(self, &object)? {
            return Err(TrellisError::Dependency(format!(
                "Cannot delete {}: it is a prerequisite of other open objects (use force to override)",
                id
            )));
        }

        fs::remove_file(&path).map_err(|e| TrellisError::io(&path, e))?;

        if object.kind.owns_folder() {
            if let Some(folder) = path.parent() {
                if let Err(error) = fs::remove_dir_all(folder) {
                    tracing::warn!(id = %id, path = %folder.display(), error = %error, "failed to remove containment folder");
                }
            }
        }

        tracing::debug!(id = %id, path = %path.display(), "deleted object");
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObjectStatus;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalRepository) {
        let dir = TempDir::new().unwrap();
        let repo = LocalRepository::for_project(dir.path());
        (dir, repo)
    }

    fn seed(repo: &LocalRepository) {
        let objects = [
            TrellisObject::new("P-web", "Web").unwrap(),
            TrellisObject::new("E-auth", "Auth").unwrap().with_parent("P-web"),
            TrellisObject::new("F-login", "Login").unwrap().with_parent("E-auth"),
            TrellisObject::new("T-form", "Form").unwrap().with_parent("F-login"),
        ];
        for object in &objects {
            repo.save_object(object).unwrap();
        }
    }

    #[test]
    fn read_empty_store() {
        let (_dir, repo) = store();
        assert!(repo.get_objects(&ObjectQuery::everything()).unwrap().is_empty());
        assert!(repo.get_object_by_id("T-a").unwrap().is_none());
    }

    #[test]
    fn save_writes_canonical_layout() {
        let (_dir, repo) = store();
        seed(&repo);

        let root = repo.root();
        assert!(root.join("p/P-web/P-web.md").is_file());
        assert!(root.join("p/P-web/e/E-auth/E-auth.md").is_file());
        assert!(root.join("p/P-web/e/E-auth/f/F-login/F-login.md").is_file());
        assert!(root.join("p/P-web/e/E-auth/f/F-login/t/open/T-form.md").is_file());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (_dir, repo) = store();
        let mut task = TrellisObject::new("T-solo", "Solo").unwrap();
        task.body = "Details\n".to_string();
        task.log.push("one\ntwo".to_string());
        repo.save_object(&task).unwrap();

        assert_eq!(repo.get_object_by_id("T-solo").unwrap(), Some(task));
    }

    #[test]
    fn closing_a_task_moves_its_file() {
        let (_dir, repo) = store();
        seed(&repo);

        let mut task = repo.get_object_by_id("T-form").unwrap().unwrap();
        task.set_status(ObjectStatus::Done);
        repo.save_object(&task).unwrap();

        let base = repo.root().join("p/P-web/e/E-auth/f/F-login/t");
        assert!(base.join("closed/T-form.md").is_file());
        assert!(!base.join("open/T-form.md").exists());

        task.set_status(ObjectStatus::Open);
        repo.save_object(&task).unwrap();
        assert!(base.join("open/T-form.md").is_file());
        assert!(!base.join("closed/T-form.md").exists());
    }

    #[test]
    fn atomic_write_no_temp_file_left() {
        let (_dir, repo) = store();
        let task = TrellisObject::new("T-solo", "Solo").unwrap();
        repo.save_object(&task).unwrap();

        let path = repo.path_of(&task).unwrap();
        assert!(path.is_file());
        assert!(!path.with_extension("md.tmp").exists());
    }

    #[test]
    fn save_with_broken_ancestry_fails() {
        let (_dir, repo) = store();
        let task = TrellisObject::new("T-a", "A").unwrap().with_parent("F-missing");

        let err = repo.save_object(&task).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn unparsable_files_are_skipped() {
        let (_dir, repo) = store();
        seed(&repo);
        let junk = repo.root().join("t/open/T-junk.md");
        fs::create_dir_all(junk.parent().unwrap()).unwrap();
        fs::write(&junk, "not a document").unwrap();

        let all = repo.get_objects(&ObjectQuery::everything()).unwrap();
        assert_eq!(all.len(), 4);
        assert!(repo.get_object_by_id("T-junk").unwrap().is_none());
    }

    #[test]
    fn leftover_copy_is_listed_once() {
        let (_dir, repo) = store();
        let old = TrellisObject::new("T-a", "Old title").unwrap();
        repo.save_object(&old).unwrap();

        // Simulate a crash after the move was written but before the old
        // file was removed
        let mut newer = old.clone().with_status(ObjectStatus::WontDo);
        newer.title = "New title".to_string();
        newer.updated = "2999-01-01T00:00:00.000Z".to_string();
        let closed = repo.root().join("t/closed/T-a.md");
        fs::create_dir_all(closed.parent().unwrap()).unwrap();
        fs::write(&closed, render_document(&newer).unwrap()).unwrap();

        let all = repo.get_objects(&ObjectQuery::everything()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "New title");
        assert_eq!(repo.get_object_by_id("T-a").unwrap(), Some(all[0].clone()));
    }

    #[test]
    fn query_scope_and_closed_filters() {
        let (_dir, repo) = store();
        seed(&repo);
        let done = TrellisObject::new("T-done", "Done")
            .unwrap()
            .with_parent("F-login")
            .with_status(ObjectStatus::Done);
        repo.save_object(&done).unwrap();
        repo.save_object(&TrellisObject::new("T-solo", "Solo").unwrap()).unwrap();

        let open_in_feature = repo
            .get_objects(&ObjectQuery::default().scope(Some("F-login")))
            .unwrap();
        let ids: Vec<_> = open_in_feature.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["F-login", "T-form"]);

        let all_in_feature = repo
            .get_objects(&ObjectQuery::everything().scope(Some("F-login")))
            .unwrap();
        assert_eq!(all_in_feature.len(), 3);
    }

    #[test]
    fn children_of_are_direct_only() {
        let (_dir, repo) = store();
        seed(&repo);

        let children = repo.get_children_of("E-auth", true).unwrap();
        let ids: Vec<_> = children.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["F-login"]);
    }

    #[test]
    fn delete_feature_removes_descendants() {
        let (_dir, repo) = store();
        seed(&repo);

        let deleted = repo.delete_object("F-login", false).unwrap();
        assert_eq!(deleted.id, "F-login");
        assert!(!repo.root().join("p/P-web/e/E-auth/f/F-login").exists());
        assert!(repo.get_object_by_id("T-form").unwrap().is_none());
        assert!(repo.get_object_by_id("E-auth").unwrap().is_some());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (_dir, repo) = store();
        let err = repo.delete_object("T-nope", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn delete_required_prerequisite_needs_force() {
        let (_dir, repo) = store();
        repo.save_object(&TrellisObject::new("T-a", "A").unwrap()).unwrap();
        let dependent = TrellisObject::new("T-b", "B")
            .unwrap()
            .with_prerequisites(["T-a"]);
        repo.save_object(&dependent).unwrap();

        let err = repo.delete_object("T-a", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dependency);
        assert!(repo.get_object_by_id("T-a").unwrap().is_some());

        repo.delete_object("T-a", true).unwrap();
        assert!(repo.get_object_by_id("T-a").unwrap().is_none());
    }
}
