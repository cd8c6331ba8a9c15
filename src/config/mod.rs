pub mod applicator;
pub mod loader;
pub mod presets;
pub mod schema;

pub use applicator::{
    apply_patches, check_patches, PatchError, PatchOptions, PatchReport, PatchResult, Patcher,
};
pub use loader::{load_from_path, load_from_str, ConfigError};
pub use presets::{builtin, preset_config, DEFAULT_PRESET};
pub use schema::{Metadata, PatchConfig, PatchDefinition, ValidationError, ValidationIssue};
