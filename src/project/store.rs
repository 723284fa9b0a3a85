//! Project snapshot persistence: a save/load capability with a
//! file-per-project JSON backend.

use std::{fs, path::PathBuf};

use anyhow::Result;

use crate::config::Config;
use crate::project::Project;

/// Storage capability the editor injects. Which backend is active (local
/// disk here, a hosted document store elsewhere) is a configuration
/// concern outside this crate.
pub trait ProjectStore {
    fn load(&self, project_id: &str) -> Result<Option<Project>>;
    fn save(&self, project: &Project) -> Result<()>;
    fn list(&self) -> Result<Vec<Project>>;
    fn remove(&self, project_id: &str) -> Result<()>;
}

/// On-device backend: one JSON snapshot per project id.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn from_config(cfg: &Config) -> Self {
        Self::at(cfg.projects_path())
    }

    pub fn at(root: PathBuf) -> Self {
        let _ = fs::create_dir_all(&root);
        Self { root }
    }

    fn file_path(&self, project_id: &str) -> PathBuf {
        self.root.join(format!("{project_id}.json"))
    }
}

impl ProjectStore for DirStore {
    fn load(&self, project_id: &str) -> Result<Option<Project>> {
        let p = self.file_path(project_id);
        if !p.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(p)?;
        let project: Project = serde_json::from_str(&text)?;
        Ok(Some(project))
    }

    fn save(&self, project: &Project) -> Result<()> {
        let p = self.file_path(&project.id);
        fs::write(p, serde_json::to_string(project)?)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<Project>> {
        let mut projects = Vec::new();
        let Ok(read_dir) = fs::read_dir(&self.root) else {
            return Ok(projects);
        };
        for entry in read_dir.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Ok(text) = fs::read_to_string(&path) {
                    if let Ok(project) = serde_json::from_str::<Project>(&text) {
                        projects.push(project);
                    }
                }
            }
        }
        // Most recently touched first, matching the dashboard ordering.
        projects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(projects)
    }

    fn remove(&self, project_id: &str) -> Result<()> {
        let p = self.file_path(project_id);
        if p.exists() {
            fs::remove_file(p)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use tempfile::TempDir;

    fn test_store() -> (DirStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        (DirStore::at(tmp.path().join("projects")), tmp)
    }

    #[test]
    fn save_load_round_trip() {
        let (store, _tmp) = test_store();
        let project = Project::new("demo", Language::Python);
        store.save(&project).unwrap();

        let loaded = store.load(&project.id).unwrap().unwrap();
        assert_eq!(loaded.id, project.id);
        assert_eq!(loaded.name, "demo");
        assert_eq!(loaded.entry_file_id, project.entry_file_id);
        assert_eq!(loaded.files[0].content, project.files[0].content);
    }

    #[test]
    fn load_absent_is_none() {
        let (store, _tmp) = test_store();
        assert!(store.load("missing").unwrap().is_none());
    }

    #[test]
    fn list_skips_unreadable_entries() {
        let (store, _tmp) = test_store();
        store.save(&Project::new("a", Language::C)).unwrap();
        fs::write(store.root.join("junk.json"), "{not json").unwrap();
        let projects = store.list().unwrap();
        assert_eq!(projects.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let (store, _tmp) = test_store();
        let project = Project::new("demo", Language::C);
        store.save(&project).unwrap();
        store.remove(&project.id).unwrap();
        store.remove(&project.id).unwrap();
        assert!(store.load(&project.id).unwrap().is_none());
    }
}
