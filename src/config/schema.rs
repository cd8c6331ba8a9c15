use crate::edit::TextEdit;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub patches: Vec<PatchDefinition>,
}

impl PatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.patches.is_empty() {
            issues.push(ValidationIssue::EmptyPatchList);
        }

        let mut seen = HashSet::new();
        for patch in &self.patches {
            let patch_id = if patch.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: None,
                    field: "id",
                });
                None
            } else {
                if !seen.insert(patch.id.as_str()) {
                    issues.push(ValidationIssue::DuplicateId(patch.id.clone()));
                }
                Some(patch.id.clone())
            };

            if patch.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: patch_id.clone(),
                    field: "file",
                });
            }
            // Whitespace is a legitimate literal to search for; only empty is rejected
            if patch.search.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: patch_id.clone(),
                    field: "search",
                });
            } else if patch.search == patch.replace {
                issues.push(ValidationIssue::InvalidCombo {
                    patch_id,
                    message: "search and replace are identical".to_string(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Look up a patch by id.
    pub fn patch(&self, id: &str) -> Option<&PatchDefinition> {
        self.patches.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Resolve `file` entries against the workspace root and guard them
    #[serde(default)]
    pub workspace_relative: bool,
}

/// One literal replacement against one file.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PatchDefinition {
    pub id: String,
    pub file: String,
    pub search: String,
    #[serde(default)]
    pub replace: String,
    /// Confirmation printed after the patch is written
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PatchDefinition {
    pub fn edit(&self) -> TextEdit {
        TextEdit::new(self.search.as_str(), self.replace.as_str())
    }

    pub fn confirmation(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => format!("Patched {} ({})", self.file, self.id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyPatchList,
    MissingField {
        patch_id: Option<String>,
        field: &'static str,
    },
    DuplicateId(String),
    InvalidCombo {
        patch_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPatchList => write!(f, "patch config contains no patches"),
            ValidationIssue::MissingField { patch_id, field } => match patch_id {
                Some(id) => write!(f, "patch '{id}' missing required field '{field}'"),
                None => write!(f, "patch missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId(id) => write!(f, "patch id '{id}' is used more than once"),
            ValidationIssue::InvalidCombo { patch_id, message } => match patch_id {
                Some(id) => write!(f, "patch '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid patch configuration: {message}"),
            },
        }
    }
}
