//! Project and file model: the in-memory tree the editor mutates and the
//! dispatcher snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::language::Language;

pub mod store;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectError {
    #[error("cannot delete the last file of a project")]
    LastFile,
    #[error("no file with id {0}")]
    NoSuchFile(String),
}

/// A single source file. Owned by its project; the dispatcher only ever
/// reads a snapshot of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: String,
    pub name: String,
    pub language: Language,
    pub content: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4().to_string(),
            language: Language::from_file_name(&name),
            name,
            content: content.into(),
        }
    }
}

/// A project: named, typed by a primary language, holding at least one
/// file, one of which is the entry file for execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub language: Language,
    pub files: Vec<SourceFile>,
    pub entry_file_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_modified: DateTime<Utc>,
}

impl Project {
    /// Create a project seeded with the language's starter template. The
    /// first template file becomes the entry file.
    pub fn new(name: impl Into<String>, language: Language) -> Self {
        let files = starter_files(language);
        let entry_file_id = files[0].id.clone();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            language,
            files,
            entry_file_id,
            last_modified: Utc::now(),
        }
    }

    pub fn file(&self, id: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn entry_file(&self) -> Option<&SourceFile> {
        self.file(&self.entry_file_id)
    }

    /// Add an empty file, detecting its language from the extension.
    /// Returns the new file's id.
    pub fn add_file(&mut self, name: impl Into<String>) -> String {
        let file = SourceFile::new(name, "");
        let id = file.id.clone();
        self.files.push(file);
        self.touch();
        id
    }

    /// Rename a file; the language is re-detected from the new name.
    pub fn rename_file(&mut self, id: &str, name: impl Into<String>) -> Result<(), ProjectError> {
        let name = name.into();
        let file = self
            .files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| ProjectError::NoSuchFile(id.to_string()))?;
        file.language = Language::from_file_name(&name);
        file.name = name;
        self.touch();
        Ok(())
    }

    /// Copy a file as `<stem>_copy.<ext>`, inserted right after the
    /// source file. Returns the new file's id.
    pub fn duplicate_file(&mut self, id: &str) -> Result<String, ProjectError> {
        let index = self
            .files
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| ProjectError::NoSuchFile(id.to_string()))?;
        let source = &self.files[index];
        let new_name = match source.name.rsplit_once('.') {
            Some((stem, ext)) => format!("{stem}_copy.{ext}"),
            None => format!("{}_copy", source.name),
        };
        let copy = SourceFile {
            id: Uuid::new_v4().to_string(),
            name: new_name,
            language: source.language,
            content: source.content.clone(),
        };
        let copy_id = copy.id.clone();
        self.files.insert(index + 1, copy);
        self.touch();
        Ok(copy_id)
    }

    /// Remove a file. Deleting the last file is rejected; deleting the
    /// entry file reselects the first remaining file so the entry id
    /// always references a present file.
    pub fn remove_file(&mut self, id: &str) -> Result<(), ProjectError> {
        if !self.files.iter().any(|f| f.id == id) {
            return Err(ProjectError::NoSuchFile(id.to_string()));
        }
        if self.files.len() <= 1 {
            return Err(ProjectError::LastFile);
        }
        self.files.retain(|f| f.id != id);
        if self.entry_file_id == id {
            self.entry_file_id = self.files[0].id.clone();
        }
        self.touch();
        Ok(())
    }

    pub fn set_entry(&mut self, id: &str) -> Result<(), ProjectError> {
        if !self.files.iter().any(|f| f.id == id) {
            return Err(ProjectError::NoSuchFile(id.to_string()));
        }
        self.entry_file_id = id.to_string();
        Ok(())
    }

    pub fn set_content(&mut self, id: &str, content: impl Into<String>) -> Result<(), ProjectError> {
        let file = self
            .files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| ProjectError::NoSuchFile(id.to_string()))?;
        file.content = content.into();
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

/// Read access to the text of a file as the editor currently sees it.
/// The UI implements this over its live buffers; a bare `Project`
/// implements it over its snapshot.
pub trait TextSource {
    fn current_text(&self, file_id: &str) -> Option<String>;
}

impl TextSource for Project {
    fn current_text(&self, file_id: &str) -> Option<String> {
        self.file(file_id).map(|f| f.content.clone())
    }
}

/// Starter files for a new project. Languages without a dedicated
/// template get one empty file so a project is never born file-less.
fn starter_files(language: Language) -> Vec<SourceFile> {
    let (name, content) = match language {
        Language::Javascript => (
            "main.js",
            "console.log(\"App Started\");\n\nconst sum = (a, b) => a + b;\nconsole.log(\"Result:\", sum(5, 10));",
        ),
        Language::Python => (
            "main.py",
            "print(\"Python App Running\")\n\ndef add(a, b):\n    return a + b\n\nprint(f\"Result: {add(10, 5)}\")",
        ),
        Language::Java => (
            "Main.java",
            "public class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello World\");\n    }\n}",
        ),
        Language::Cpp => (
            "main.cpp",
            "#include <iostream>\n\nint main() {\n    std::cout << \"Hello C++\" << std::endl;\n    return 0;\n}",
        ),
        Language::C => (
            "main.c",
            "#include <stdio.h>\n\nint main() {\n    printf(\"Hello C\\n\");\n    return 0;\n}",
        ),
        Language::Html => (
            "index.html",
            "<!DOCTYPE html>\n<html>\n<body>\n  <h1>Hello Web</h1>\n</body>\n</html>",
        ),
        Language::Sql => ("query.sql", "SELECT \"Hello SQL\" as message;"),
        _ => return vec![SourceFile::new(format!("main.{}", language.extension()), "")],
    };
    vec![SourceFile::new(name, content)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_project_always_has_an_entry_file() {
        for lang in [
            Language::Javascript,
            Language::Python,
            Language::Css,
            Language::Markdown,
            Language::Plaintext,
        ] {
            let project = Project::new("demo", lang);
            assert!(!project.files.is_empty(), "{lang} project born file-less");
            assert!(project.entry_file().is_some());
        }
    }

    #[test]
    fn last_file_deletion_is_rejected() {
        let mut project = Project::new("demo", Language::Javascript);
        let id = project.files[0].id.clone();
        assert_eq!(project.remove_file(&id), Err(ProjectError::LastFile));
        assert_eq!(project.files.len(), 1);
    }

    #[test]
    fn removing_the_entry_file_reselects_one() {
        let mut project = Project::new("demo", Language::Javascript);
        let first = project.files[0].id.clone();
        let second = project.add_file("utils.js");
        project.set_entry(&second).unwrap();
        project.remove_file(&second).unwrap();
        assert_eq!(project.entry_file_id, first);
        assert!(project.entry_file().is_some());
    }

    #[test]
    fn rename_redetects_language() {
        let mut project = Project::new("demo", Language::Javascript);
        let id = project.files[0].id.clone();
        project.rename_file(&id, "script.py").unwrap();
        let file = project.file(&id).unwrap();
        assert_eq!(file.language, Language::Python);
        assert_eq!(file.name, "script.py");
    }

    #[test]
    fn duplicate_lands_after_source_with_copy_suffix() {
        let mut project = Project::new("demo", Language::Javascript);
        let id = project.files[0].id.clone();
        let copy_id = project.duplicate_file(&id).unwrap();
        assert_eq!(project.files[1].id, copy_id);
        assert_eq!(project.files[1].name, "main_copy.js");
        assert_eq!(project.files[1].content, project.files[0].content);
    }

    #[test]
    fn set_entry_requires_a_present_file() {
        let mut project = Project::new("demo", Language::Javascript);
        assert!(matches!(
            project.set_entry("ghost"),
            Err(ProjectError::NoSuchFile(_))
        ));
    }

    #[test]
    fn snapshot_serializes_millis_timestamp() {
        let project = Project::new("demo", Language::Python);
        let json = serde_json::to_value(&project).unwrap();
        assert!(json["lastModified"].is_i64());
        assert_eq!(json["language"], "python");
        let back: Project = serde_json::from_value(json).unwrap();
        assert_eq!(back.files.len(), project.files.len());
    }

    #[test]
    fn current_text_reflects_edits() {
        let mut project = Project::new("demo", Language::Javascript);
        let id = project.files[0].id.clone();
        project.set_content(&id, "console.log(1)").unwrap();
        assert_eq!(
            project.current_text(&id).as_deref(),
            Some("console.log(1)")
        );
        assert!(project.current_text("ghost").is_none());
    }
}
