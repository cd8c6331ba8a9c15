//! Patch applicator - runs patch definitions against files on disk
//!
//! This module provides the [`Patcher`], which performs the single
//! read → substitute → write → report sequence for one file, and
//! [`apply_patches`] / [`check_patches`], which drive it over a config.

use crate::config::schema::{PatchConfig, PatchDefinition};
use crate::edit::{write_content, EditError, Substitution, TextEdit, WriteMode};
use crate::safety::{SafetyError, WorkspaceGuard};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Result of running a single patch
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchResult should be checked for no-match"]
pub enum PatchResult {
    /// Search text was found and replaced
    Applied { file: PathBuf, occurrences: usize },
    /// Every occurrence is already part of the replacement text
    AlreadyApplied { file: PathBuf },
    /// Search text is absent; content was left unchanged
    NoMatch { file: PathBuf },
}

impl PatchResult {
    fn from_substitution(file: &Path, substitution: &Substitution) -> Self {
        let file = file.to_path_buf();
        if substitution.changed() {
            PatchResult::Applied {
                file,
                occurrences: substitution.replaced,
            }
        } else if substitution.already_applied > 0 {
            PatchResult::AlreadyApplied { file }
        } else {
            PatchResult::NoMatch { file }
        }
    }

    pub fn file(&self) -> &Path {
        match self {
            PatchResult::Applied { file, .. }
            | PatchResult::AlreadyApplied { file }
            | PatchResult::NoMatch { file } => file,
        }
    }
}

impl fmt::Display for PatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchResult::Applied { file, occurrences } => {
                write!(
                    f,
                    "Applied patch to {} ({} occurrence{})",
                    file.display(),
                    occurrences,
                    if *occurrences == 1 { "" } else { "s" }
                )
            }
            PatchResult::AlreadyApplied { file } => {
                write!(f, "Already applied to {}", file.display())
            }
            PatchResult::NoMatch { file } => {
                write!(f, "Search text not found in {}", file.display())
            }
        }
    }
}

/// Errors during patch application
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: EditError,
    },

    #[error("search text not found in {}", .path.display())]
    NoMatch { path: PathBuf },

    #[error("failed to print confirmation: {0}")]
    Report(#[source] io::Error),

    #[error(transparent)]
    Safety(#[from] SafetyError),
}

/// Knobs for a patch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOptions {
    /// Compute results without touching the file or printing confirmations
    pub dry_run: bool,
    /// Treat a missing search text as an error instead of a silent no-op
    pub strict: bool,
    pub write_mode: WriteMode,
}

/// Everything a caller needs to describe one patch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub result: PatchResult,
    /// Content before substitution
    pub before: String,
    /// Content after substitution (what was, or would be, written)
    pub after: String,
    /// Whether the file on disk was rewritten
    pub written: bool,
}

/// Literal patch against one file.
#[derive(Debug, Clone)]
pub struct Patcher {
    file: PathBuf,
    edit: TextEdit,
    confirmation: String,
    options: PatchOptions,
}

impl Patcher {
    pub fn new(file: impl Into<PathBuf>, edit: TextEdit, confirmation: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            edit,
            confirmation: confirmation.into(),
            options: PatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn confirmation(&self) -> &str {
        &self.confirmation
    }

    /// Read the whole target file.
    pub fn read(&self) -> Result<String, PatchError> {
        let content = fs::read_to_string(&self.file).map_err(|source| PatchError::Read {
            path: self.file.clone(),
            source,
        })?;
        debug!(file = %self.file.display(), bytes = content.len(), "read target");
        Ok(content)
    }

    pub fn substitute(&self, content: &str) -> Substitution {
        self.edit.substitute(content)
    }

    /// Rewrite the target with `content`. No backup is taken.
    pub fn write(&self, content: &str) -> Result<(), PatchError> {
        write_content(&self.file, content.as_bytes(), self.options.write_mode).map_err(
            |source| PatchError::Write {
                path: self.file.clone(),
                source,
            },
        )?;
        debug!(file = %self.file.display(), bytes = content.len(), "wrote target");
        Ok(())
    }

    /// Emit the confirmation line.
    ///
    /// This does not look at the outcome: a no-match run still confirms
    /// unless `strict` stopped it earlier.
    pub fn report(&self, out: &mut dyn Write) -> Result<(), PatchError> {
        writeln!(out, "{}", self.confirmation).map_err(PatchError::Report)
    }

    /// Substitute over already-read content and classify the outcome.
    ///
    /// Fails only when `strict` is set and the search text is absent.
    pub fn evaluate(&self, before: String) -> Result<PatchReport, PatchError> {
        let substitution = self.substitute(&before);
        let result = PatchResult::from_substitution(&self.file, &substitution);

        match &result {
            PatchResult::Applied { occurrences, .. } => {
                info!(file = %self.file.display(), occurrences, "search text replaced");
            }
            PatchResult::AlreadyApplied { .. } => {
                info!(file = %self.file.display(), "patch already present");
            }
            PatchResult::NoMatch { .. } => {
                warn!(file = %self.file.display(), "search text not found; content left unchanged");
                if self.options.strict {
                    return Err(PatchError::NoMatch {
                        path: self.file.clone(),
                    });
                }
            }
        }

        Ok(PatchReport {
            result,
            before,
            after: substitution.content,
            written: false,
        })
    }

    /// Read, substitute and write. Does not report.
    pub fn apply(&self) -> Result<PatchReport, PatchError> {
        let before = self.read()?;
        let mut report = self.evaluate(before)?;
        if !self.options.dry_run {
            self.write(&report.after)?;
            report.written = true;
        }
        Ok(report)
    }

    /// The full one-shot sequence: read → substitute → write → report.
    pub fn run(&self, out: &mut dyn Write) -> Result<PatchReport, PatchError> {
        let report = self.apply()?;
        if report.written {
            self.report(out)?;
        }
        Ok(report)
    }
}

fn resolve_target(
    patch: &PatchDefinition,
    workspace_root: &Path,
    workspace_relative: bool,
) -> Result<PathBuf, PatchError> {
    if workspace_relative {
        let guard = WorkspaceGuard::new(workspace_root)?;
        Ok(guard.validate_path(&patch.file)?)
    } else {
        Ok(PathBuf::from(&patch.file))
    }
}

/// Apply a patch configuration to a workspace
///
/// Patches run in config order. Each one is a full read → substitute →
/// write → report cycle, so later patches on the same file see the output
/// of earlier ones. In dry-run mode that chaining happens in memory.
///
/// # Arguments
///
/// * `config` - The patch configuration to apply
/// * `workspace_root` - Root for `workspace_relative` configs
/// * `options` - Dry-run, strictness and write strategy
/// * `out` - Receives confirmation lines
///
/// # Returns
///
/// A vector of results, one per patch in the configuration
pub fn apply_patches(
    config: &PatchConfig,
    workspace_root: &Path,
    options: PatchOptions,
    out: &mut dyn Write,
) -> Vec<(String, Result<PatchReport, PatchError>)> {
    // Pending content per file, only populated in dry-run mode
    let mut simulated: HashMap<PathBuf, String> = HashMap::new();
    let mut results = Vec::with_capacity(config.patches.len());

    for patch in &config.patches {
        let target = resolve_target(patch, workspace_root, config.meta.workspace_relative);
        let outcome = target.and_then(|file| {
            let patcher = Patcher::new(file.clone(), patch.edit(), patch.confirmation())
                .with_options(options);

            if options.dry_run {
                // Keep pending content intact if this patch fails
                let before = match simulated.get(&file) {
                    Some(content) => content.clone(),
                    None => patcher.read()?,
                };
                let report = patcher.evaluate(before)?;
                simulated.insert(file, report.after.clone());
                Ok(report)
            } else {
                patcher.run(&mut *out)
            }
        });

        results.push((patch.id.clone(), outcome));
    }

    results
}

/// Check patch status without mutating the workspace.
///
/// Same result semantics as [`apply_patches`] in dry-run mode; `Applied`
/// means "would apply". Never strict, never prints confirmations.
pub fn check_patches(
    config: &PatchConfig,
    workspace_root: &Path,
) -> Vec<(String, Result<PatchReport, PatchError>)> {
    let options = PatchOptions {
        dry_run: true,
        ..PatchOptions::default()
    };
    apply_patches(config, workspace_root, options, &mut io::sink())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::presets;
    use crate::config::schema::Metadata;
    use pretty_assertions::assert_eq;

    const CONFIRMATION: &str = "Fixed: Added setLoading(false) after profile set";

    fn profile_patcher(file: &Path) -> Patcher {
        Patcher::new(
            file,
            TextEdit::new(
                "console.log('Profile set successfully');",
                "console.log('Profile set successfully');\n        setLoading(false);",
            ),
            CONFIRMATION,
        )
    }

    #[test]
    fn test_run_applies_and_reports() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("AuthContext.tsx");
        fs::write(&file, "foo console.log('Profile set successfully'); bar").unwrap();

        let mut out = Vec::new();
        let report = profile_patcher(&file).run(&mut out).unwrap();

        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "foo console.log('Profile set successfully');\n        setLoading(false); bar"
        );
        assert_eq!(
            report.result,
            PatchResult::Applied {
                file: file.clone(),
                occurrences: 1
            }
        );
        assert!(report.written);
        assert_eq!(String::from_utf8(out).unwrap(), format!("{CONFIRMATION}\n"));
    }

    #[test]
    fn test_run_no_match_still_reports() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("AuthContext.tsx");
        let original = "export const AuthContext = createContext(null);\n";
        fs::write(&file, original).unwrap();

        let mut out = Vec::new();
        let report = profile_patcher(&file).run(&mut out).unwrap();

        assert_eq!(report.result, PatchResult::NoMatch { file: file.clone() });
        assert_eq!(fs::read_to_string(&file).unwrap(), original);
        assert_eq!(String::from_utf8(out).unwrap(), format!("{CONFIRMATION}\n"));
    }

    #[test]
    fn test_run_strict_no_match_fails_without_report() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("AuthContext.tsx");
        fs::write(&file, "nothing to see").unwrap();

        let mut out = Vec::new();
        let patcher = profile_patcher(&file).with_options(PatchOptions {
            strict: true,
            ..PatchOptions::default()
        });
        let err = patcher.run(&mut out).unwrap_err();

        assert!(matches!(err, PatchError::NoMatch { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_run_twice_is_stable() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("AuthContext.tsx");
        fs::write(&file, "a\nconsole.log('Profile set successfully');\nb\n").unwrap();

        let patcher = profile_patcher(&file);
        patcher.run(&mut io::sink()).unwrap();
        let first = fs::read_to_string(&file).unwrap();

        let report = patcher.run(&mut io::sink()).unwrap();
        assert_eq!(report.result, PatchResult::AlreadyApplied { file: file.clone() });
        assert_eq!(fs::read_to_string(&file).unwrap(), first);
    }

    #[test]
    fn test_run_missing_file_creates_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("missing.tsx");

        let mut out = Vec::new();
        let err = profile_patcher(&file).run(&mut out).unwrap_err();

        assert!(matches!(err, PatchError::Read { .. }));
        assert!(!file.exists());
        assert!(out.is_empty());
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("AuthContext.tsx");
        let original = "console.log('Profile set successfully');";
        fs::write(&file, original).unwrap();

        let mut out = Vec::new();
        let report = profile_patcher(&file)
            .with_options(PatchOptions {
                dry_run: true,
                ..PatchOptions::default()
            })
            .run(&mut out)
            .unwrap();

        assert!(!report.written);
        assert!(report.after.contains("setLoading(false)"));
        assert_eq!(fs::read_to_string(&file).unwrap(), original);
        assert!(out.is_empty());
    }

    #[test]
    fn test_apply_patches_chains_same_file_in_dry_run() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("a.tsx"), "one").unwrap();

        let patch = |id: &str, search: &str, replace: &str| PatchDefinition {
            id: id.to_string(),
            file: "a.tsx".to_string(),
            search: search.to_string(),
            replace: replace.to_string(),
            message: None,
            description: None,
        };
        let config = PatchConfig {
            meta: Metadata {
                workspace_relative: true,
                ..Metadata::default()
            },
            patches: vec![patch("first", "one", "two"), patch("second", "two", "three")],
        };

        let results = check_patches(&config, temp_dir.path());
        assert_eq!(results.len(), 2);
        let second = results[1].1.as_ref().unwrap();
        assert_eq!(second.after, "three");
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("a.tsx")).unwrap(),
            "one"
        );
    }

    #[test]
    fn test_strict_dry_run_failure_keeps_pending_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("a.tsx"), "one").unwrap();

        let patch = |id: &str, search: &str, replace: &str| PatchDefinition {
            id: id.to_string(),
            file: "a.tsx".to_string(),
            search: search.to_string(),
            replace: replace.to_string(),
            message: None,
            description: None,
        };
        let config = PatchConfig {
            meta: Metadata {
                workspace_relative: true,
                ..Metadata::default()
            },
            patches: vec![
                patch("first", "one", "two"),
                patch("missing", "zzz", "q"),
                patch("third", "two", "three"),
            ],
        };
        let options = PatchOptions {
            dry_run: true,
            strict: true,
            ..PatchOptions::default()
        };

        let results = apply_patches(&config, temp_dir.path(), options, &mut io::sink());

        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(PatchError::NoMatch { .. })));
        let third = results[2].1.as_ref().unwrap();
        assert!(matches!(third.result, PatchResult::Applied { occurrences: 1, .. }));
        assert_eq!(third.after, "three");
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("a.tsx")).unwrap(),
            "one"
        );
    }

    #[test]
    fn test_apply_patches_preset_in_workspace() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join(presets::AUTH_CONTEXT_FILE);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "    console.log('Profile set successfully');\n").unwrap();

        let config = presets::preset_config(presets::DEFAULT_PRESET).unwrap();
        let mut out = Vec::new();
        let results = apply_patches(&config, temp_dir.path(), PatchOptions::default(), &mut out);

        assert_eq!(results.len(), 1);
        let (id, outcome) = &results[0];
        assert_eq!(id, presets::DEFAULT_PRESET);
        assert!(matches!(
            outcome.as_ref().unwrap().result,
            PatchResult::Applied { occurrences: 1, .. }
        ));
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "    console.log('Profile set successfully');\n        setLoading(false);\n"
        );
        assert_eq!(String::from_utf8(out).unwrap(), format!("{CONFIRMATION}\n"));
    }

    #[test]
    fn test_patch_result_display() {
        let applied = PatchResult::Applied {
            file: PathBuf::from("/tmp/AuthContext.tsx"),
            occurrences: 2,
        };
        assert!(applied.to_string().contains("2 occurrences"));

        let already = PatchResult::AlreadyApplied {
            file: PathBuf::from("/tmp/AuthContext.tsx"),
        };
        assert!(already.to_string().contains("Already applied"));

        let none = PatchResult::NoMatch {
            file: PathBuf::from("/tmp/AuthContext.tsx"),
        };
        assert!(none.to_string().contains("not found"));
    }
}
