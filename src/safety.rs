use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directory names that are never patched, wherever they appear in the workspace.
const FORBIDDEN_DIRS: &[&str] = &["node_modules", ".git"];

/// Workspace safety checks to keep patches inside the target application.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    /// Canonical path to workspace root
    workspace_root: PathBuf,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside workspace: {path} (workspace: {workspace})")]
    OutsideWorkspace { path: PathBuf, workspace: PathBuf },

    #[error("Path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: String },

    #[error("Failed to canonicalize {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceGuard {
    /// Create a new workspace guard with the given root.
    ///
    /// The workspace root is canonicalized so symlinked roots compare correctly.
    pub fn new(workspace_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = workspace_root.as_ref();
        let workspace_root = root
            .canonicalize()
            .map_err(|source| SafetyError::Canonicalize {
                path: root.to_path_buf(),
                source,
            })?;
        Ok(Self { workspace_root })
    }

    /// Check if a path is safe to patch.
    ///
    /// Relative paths resolve against the workspace root. Returns the
    /// canonical path. The file must already exist.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };

        // Resolves symlinks and .. components
        let canonical = absolute
            .canonicalize()
            .map_err(|source| SafetyError::Canonicalize {
                path: absolute.clone(),
                source,
            })?;

        if !canonical.starts_with(&self.workspace_root) {
            return Err(SafetyError::OutsideWorkspace {
                path: canonical,
                workspace: self.workspace_root.clone(),
            });
        }

        let relative = canonical
            .strip_prefix(&self.workspace_root)
            .unwrap_or(&canonical);
        for component in relative.components() {
            if let Component::Normal(name) = component {
                let forbidden = FORBIDDEN_DIRS
                    .iter()
                    .find(|dir| name == OsStr::new(**dir));
                if let Some(forbidden) = forbidden {
                    return Err(SafetyError::ForbiddenPath {
                        path: canonical.clone(),
                        forbidden: (*forbidden).to_string(),
                    });
                }
            }
        }

        Ok(canonical)
    }

    /// Get the workspace root.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }
}
