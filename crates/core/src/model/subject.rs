use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ChapterId, SubjectId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubjectError {
    #[error("subject name cannot be empty")]
    EmptyName,

    #[error("chapter {index} name cannot be empty")]
    EmptyChapterName { index: usize },
}

/// A subject as listed by `GET /subjects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Subject {
    #[must_use]
    pub fn chapter(&self, id: ChapterId) -> Option<&Chapter> {
        self.chapters.iter().find(|chapter| chapter.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Payload for `POST /subjects`.
///
/// The server creates the subject and its chapters in one call and assigns
/// every id itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSubject {
    name: String,
    description: String,
    chapters: Vec<NewChapter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewChapter {
    pub name: String,
    pub description: String,
}

impl NewChapter {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl NewSubject {
    /// # Errors
    ///
    /// Returns `SubjectError` if the subject or any chapter has a blank name.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        chapters: Vec<NewChapter>,
    ) -> Result<Self, SubjectError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(SubjectError::EmptyName);
        }
        if let Some(index) = chapters.iter().position(|c| c.name.trim().is_empty()) {
            return Err(SubjectError::EmptyChapterName { index });
        }
        Ok(Self {
            name,
            description: description.into(),
            chapters,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn chapters(&self) -> &[NewChapter] {
        &self.chapters
    }
}
