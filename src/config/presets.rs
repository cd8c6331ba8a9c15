//! Built-in patches for the auth context of the dashboard application.
//!
//! Presets are ordinary [`PatchDefinition`]s, resolved relative to the
//! workspace, so they go through the same guard and applicator as patch files.

use crate::config::loader::ConfigError;
use crate::config::schema::{Metadata, PatchConfig, PatchDefinition};

/// Preset applied when no patch source is given.
pub const DEFAULT_PRESET: &str = "loading-after-profile";

/// Target file of every built-in preset.
pub const AUTH_CONTEXT_FILE: &str = "src/contexts/AuthContext.tsx";

const PROFILE_SET_SEARCH: &str = "console.log('Profile set successfully');";

const PROFILE_SET_REPLACE: &str = "console.log('Profile set successfully');
        setLoading(false);";

const BACKGROUND_FETCH_SEARCH: &str = r#"          // Fetch profile in background without blocking UI
          fetchUserProfileWithTimeout(session.user.id).then(() => {
            console.log('Profile loaded successfully');
          }).catch((profileError) => {
            console.warn('Profile fetch failed, using minimal profile:', profileError);
            // Create minimal profile as fallback
            const minimalProfile = createMinimalUserProfile(session.user);
            setUser(minimalProfile);
            setIsAdmin(false);
          });"#;

const BACKGROUND_FETCH_REPLACE: &str = r#"          // Fetch profile and ensure it completes
          fetchUserProfileWithTimeout(session.user.id)
            .then(() => {
              console.log('Profile loaded successfully');
            })
            .catch((profileError) => {
              console.warn('Profile fetch failed, using minimal profile:', profileError);
              // Create minimal profile as fallback
              const minimalProfile = createMinimalUserProfile(session.user);
              setUser(minimalProfile);
              setIsAdmin(false);
            })
            .finally(() => {
              // Ensure loading is false after profile attempt
              if (mounted) {
                setLoading(false);
              }
            });"#;

/// All built-in presets, default first.
pub fn builtin() -> Vec<PatchDefinition> {
    vec![
        PatchDefinition {
            id: DEFAULT_PRESET.to_string(),
            file: AUTH_CONTEXT_FILE.to_string(),
            search: PROFILE_SET_SEARCH.to_string(),
            replace: PROFILE_SET_REPLACE.to_string(),
            message: Some("Fixed: Added setLoading(false) after profile set".to_string()),
            description: Some("Clear the loading flag once the user profile is set".to_string()),
        },
        PatchDefinition {
            id: "await-profile-fetch".to_string(),
            file: AUTH_CONTEXT_FILE.to_string(),
            search: BACKGROUND_FETCH_SEARCH.to_string(),
            replace: BACKGROUND_FETCH_REPLACE.to_string(),
            message: Some(
                "Fixed AuthContext.tsx - profile loading now properly handled".to_string(),
            ),
            description: Some(
                "Make the initial session clear loading after the profile fetch settles"
                    .to_string(),
            ),
        },
    ]
}

/// Wrap a single preset into a workspace-relative config.
pub fn preset_config(id: &str) -> Result<PatchConfig, ConfigError> {
    let patch = builtin()
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| ConfigError::UnknownPreset(id.to_string()))?;

    Ok(PatchConfig {
        meta: Metadata {
            name: format!("preset:{id}"),
            description: patch.description.clone(),
            workspace_relative: true,
        },
        patches: vec![patch],
    })
}
