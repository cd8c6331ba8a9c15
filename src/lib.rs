//! Literal Patcher: one-shot literal text patches for application sources
//!
//! Reads a file, replaces a literal search string with a replacement,
//! writes the file back and prints a confirmation line.
//!
//! # Architecture
//!
//! Every patch compiles down to a single primitive, [`TextEdit`], a pure
//! literal search-and-replace. [`Patcher`] wraps it with the file I/O and the
//! confirmation. Patch definitions come from built-in presets or TOML patch
//! files and are driven by [`apply_patches`].
//!
//! # Behaviour
//!
//! - A missing search text is not an error unless `strict` is set; the
//!   confirmation is still printed and a warning is logged
//! - Occurrences already inside a copy of the replacement are skipped, so
//!   re-running a patch is a no-op
//! - Truncating writes by default, atomic rename on request
//! - Workspace-relative patches cannot escape the workspace
//!
//! # Example
//!
//! ```no_run
//! use literal_patcher::{Patcher, TextEdit};
//!
//! let patcher = Patcher::new(
//!     "src/contexts/AuthContext.tsx",
//!     TextEdit::new(
//!         "console.log('Profile set successfully');",
//!         "console.log('Profile set successfully');\n        setLoading(false);",
//!     ),
//!     "Fixed: Added setLoading(false) after profile set",
//! );
//!
//! match patcher.run(&mut std::io::stdout()) {
//!     Ok(report) => eprintln!("{}", report.result),
//!     Err(e) => eprintln!("Patch failed: {}", e),
//! }
//! ```

pub mod config;
pub mod diff;
pub mod edit;
pub mod logging;
pub mod safety;

// Re-exports
pub use config::{
    apply_patches, check_patches, load_from_path, load_from_str, preset_config, ConfigError,
    PatchConfig, PatchDefinition, PatchError, PatchOptions, PatchReport, PatchResult, Patcher,
};
pub use edit::{EditError, Substitution, TextEdit, WriteMode};
pub use safety::{SafetyError, WorkspaceGuard};
