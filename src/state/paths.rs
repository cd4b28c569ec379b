//! State directory resolution.
//!
//! Resolution is a pure function of [`PlatformInfo`] and [`StateEnv`], so
//! every platform branch is testable from any host.
//!
//! # Environment Variables
//!
//! - `FLEETENV_CONFIG_DIR` - Override the state directory
//! - `FLEETENV_STATE_IN_PROJECT=1` - Keep state in `<root>/.fleetenv/`
//! - `XDG_CONFIG_HOME` - Base directory on Linux and other Unix systems
//! - `LOCALAPPDATA` / `APPDATA` - Base directory on Windows
//!
//! # Path Resolution Priority
//!
//! 1. `FLEETENV_CONFIG_DIR`
//! 2. Platform default:
//!    - Windows: `%LOCALAPPDATA%\Fleetenv\Config` (then `%APPDATA%`, then
//!      `~\AppData\Local`)
//!    - macOS: `~/Library/Application Support/Fleetenv`
//!    - Others: `$XDG_CONFIG_HOME/fleetenv` or `~/.config/fleetenv`
//!
//! Below the resolved directory each project directory gets its own
//! `projects/<name>-<hash>/state.json`, so projects sharing a provider never
//! share a link. The legacy location is always `<dir>/.fleetenv/state.json`.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::env::EnvContext;

/// Environment variable for state directory override.
pub const ENV_CONFIG_DIR: &str = "FLEETENV_CONFIG_DIR";

/// Environment variable that pins state to the workspace.
pub const ENV_STATE_IN_PROJECT: &str = "FLEETENV_STATE_IN_PROJECT";

/// Workspace-local data directory name.
pub const WORKSPACE_DATA_DIR: &str = ".fleetenv";

/// State file name inside the state directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// Subdirectory of the state directory holding per-project state.
pub const PROJECTS_DIR: &str = "projects";

/// Desktop OS family, for choosing conventional directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    MacOs,
    Unix,
}

/// The host facts that directory resolution depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: OsFamily,
    pub home: PathBuf,
}

impl PlatformInfo {
    pub fn new(os: OsFamily, home: impl Into<PathBuf>) -> Self {
        Self {
            os,
            home: home.into(),
        }
    }

    /// Describe the running host.
    pub fn detect() -> Self {
        let os = if cfg!(windows) {
            OsFamily::Windows
        } else if cfg!(target_os = "macos") {
            OsFamily::MacOs
        } else {
            OsFamily::Unix
        };
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self { os, home }
    }
}

/// Environment overrides that affect state location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateEnv {
    pub config_dir: Option<String>,
    pub state_in_project: bool,
    pub xdg_config_home: Option<String>,
    pub local_app_data: Option<String>,
    pub app_data: Option<String>,
}

impl StateEnv {
    /// Read the overrides from a context. Empty values count as unset.
    pub fn from_context(ctx: &EnvContext) -> Self {
        let get = |key: &str| ctx.get_non_empty(key).map(String::from);
        Self {
            config_dir: get(ENV_CONFIG_DIR),
            state_in_project: ctx.get(ENV_STATE_IN_PROJECT) == Some("1"),
            xdg_config_home: get("XDG_CONFIG_HOME"),
            local_app_data: get("LOCALAPPDATA"),
            app_data: get("APPDATA"),
        }
    }
}

/// Resolve the OS-conventional state directory.
///
/// This ignores the workspace-local mode; see [`StateLocation::resolve`].
///
/// # Example
///
/// ```
/// use fleetenv::state::{resolve_state_dir, OsFamily, PlatformInfo, StateEnv};
/// use std::path::PathBuf;
///
/// let platform = PlatformInfo::new(OsFamily::Unix, "/home/me");
/// let dir = resolve_state_dir(&platform, &StateEnv::default());
/// assert_eq!(dir, PathBuf::from("/home/me/.config/fleetenv"));
/// ```
pub fn resolve_state_dir(platform: &PlatformInfo, env: &StateEnv) -> PathBuf {
    if let Some(dir) = &env.config_dir {
        tracing::debug!("Using state dir from {}: {}", ENV_CONFIG_DIR, dir);
        return PathBuf::from(dir);
    }

    match platform.os {
        OsFamily::Windows => {
            let base = env
                .local_app_data
                .as_ref()
                .or(env.app_data.as_ref())
                .map(PathBuf::from)
                .unwrap_or_else(|| platform.home.join("AppData").join("Local"));
            base.join("Fleetenv").join("Config")
        }
        OsFamily::MacOs => platform
            .home
            .join("Library")
            .join("Application Support")
            .join("Fleetenv"),
        OsFamily::Unix => {
            let base = env
                .xdg_config_home
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| platform.home.join(".config"));
            base.join("fleetenv")
        }
    }
}

/// Where state is written and where it may be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLocation {
    /// Directory created on write.
    pub dir: PathBuf,
    /// File written by `write`, tried first by `read`.
    pub file: PathBuf,
    /// Read-only fallback from older versions.
    pub legacy_file: PathBuf,
}

/// Stable directory name for a project directory's state.
///
/// The directory name followed by 16 hex chars (8 bytes of SHA256) of the
/// full path, so same-named projects in different workspaces stay apart.
pub fn scope_key(dir: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(dir.to_string_lossy().as_bytes());
    let hash = hasher.finalize();

    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("root");
    format!("{}-{}", name, hex::encode(&hash[..8]))
}

impl StateLocation {
    /// Resolve primary and legacy locations for a project directory.
    pub fn resolve(platform: &PlatformInfo, env: &StateEnv, dir: &Path) -> Self {
        let local_dir = dir.join(WORKSPACE_DATA_DIR);
        let legacy_file = local_dir.join(STATE_FILE_NAME);

        let state_dir = if env.state_in_project {
            tracing::debug!("State pinned to project: {}", local_dir.display());
            local_dir
        } else {
            resolve_state_dir(platform, env)
                .join(PROJECTS_DIR)
                .join(scope_key(dir))
        };

        Self {
            file: state_dir.join(STATE_FILE_NAME),
            dir: state_dir,
            legacy_file,
        }
    }

    /// Files to try on read, in order, without duplicates.
    pub fn candidates(&self) -> Vec<&Path> {
        let mut out = vec![self.file.as_path()];
        if self.legacy_file != self.file {
            out.push(self.legacy_file.as_path());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unix() -> PlatformInfo {
        PlatformInfo::new(OsFamily::Unix, "/home/me")
    }

    #[test]
    fn override_wins_on_every_platform() {
        let env = StateEnv {
            config_dir: Some("/custom".into()),
            xdg_config_home: Some("/xdg".into()),
            local_app_data: Some("C:/Local".into()),
            ..Default::default()
        };
        for os in [OsFamily::Windows, OsFamily::MacOs, OsFamily::Unix] {
            let platform = PlatformInfo::new(os, "/home/me");
            assert_eq!(resolve_state_dir(&platform, &env), PathBuf::from("/custom"));
        }
    }

    #[test]
    fn unix_uses_xdg_then_dot_config() {
        assert_eq!(
            resolve_state_dir(&unix(), &StateEnv::default()),
            PathBuf::from("/home/me/.config/fleetenv")
        );
        let env = StateEnv {
            xdg_config_home: Some("/xdg".into()),
            ..Default::default()
        };
        assert_eq!(resolve_state_dir(&unix(), &env), PathBuf::from("/xdg/fleetenv"));
    }

    #[test]
    fn macos_uses_application_support() {
        let platform = PlatformInfo::new(OsFamily::MacOs, "/Users/me");
        let env = StateEnv {
            xdg_config_home: Some("/xdg".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_state_dir(&platform, &env),
            PathBuf::from("/Users/me/Library/Application Support/Fleetenv")
        );
    }

    #[test]
    fn windows_prefers_local_app_data_then_app_data_then_home() {
        let platform = PlatformInfo::new(OsFamily::Windows, "/home/me");

        let both = StateEnv {
            local_app_data: Some("/local".into()),
            app_data: Some("/roaming".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_state_dir(&platform, &both),
            PathBuf::from("/local/Fleetenv/Config")
        );

        let roaming = StateEnv {
            app_data: Some("/roaming".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_state_dir(&platform, &roaming),
            PathBuf::from("/roaming/Fleetenv/Config")
        );

        assert_eq!(
            resolve_state_dir(&platform, &StateEnv::default()),
            PathBuf::from("/home/me/AppData/Local/Fleetenv/Config")
        );
    }

    #[test]
    fn env_reads_from_context_and_ignores_empty_values() {
        let ctx = EnvContext::from_vars([
            ("FLEETENV_CONFIG_DIR", ""),
            ("FLEETENV_STATE_IN_PROJECT", "1"),
            ("XDG_CONFIG_HOME", "/xdg"),
        ]);
        let env = StateEnv::from_context(&ctx);
        assert_eq!(env.config_dir, None);
        assert!(env.state_in_project);
        assert_eq!(env.xdg_config_home.as_deref(), Some("/xdg"));
    }

    #[test]
    fn default_location_has_legacy_fallback() {
        let location = StateLocation::resolve(&unix(), &StateEnv::default(), Path::new("/ws/web"));
        let key = scope_key(Path::new("/ws/web"));
        let file = PathBuf::from("/home/me/.config/fleetenv/projects")
            .join(&key)
            .join("state.json");
        assert_eq!(location.file, file);
        assert_eq!(location.legacy_file, PathBuf::from("/ws/web/.fleetenv/state.json"));
        assert_eq!(
            location.candidates(),
            vec![file.as_path(), Path::new("/ws/web/.fleetenv/state.json")]
        );
    }

    #[test]
    fn each_directory_gets_its_own_state_file() {
        let env = StateEnv {
            config_dir: Some("/custom".into()),
            ..Default::default()
        };
        let api = StateLocation::resolve(&unix(), &env, Path::new("/ws/apps/api"));
        let web = StateLocation::resolve(&unix(), &env, Path::new("/ws/apps/web"));
        let other = StateLocation::resolve(&unix(), &env, Path::new("/other/apps/web"));

        assert_ne!(api.file, web.file);
        assert_ne!(web.file, other.file);
        assert!(web.file.starts_with("/custom/projects"));
    }

    #[test]
    fn scope_key_is_stable_and_named() {
        let key = scope_key(Path::new("/ws/apps/web"));
        assert_eq!(key, scope_key(Path::new("/ws/apps/web")));
        assert!(key.starts_with("web-"));
        assert_eq!(key.len(), "web-".len() + 16);
    }

    #[test]
    fn workspace_mode_pins_both_paths() {
        let env = StateEnv {
            state_in_project: true,
            config_dir: Some("/custom".into()),
            ..Default::default()
        };
        let location = StateLocation::resolve(&unix(), &env, Path::new("/ws"));
        assert_eq!(location.dir, PathBuf::from("/ws/.fleetenv"));
        assert_eq!(location.file, location.legacy_file);
        assert_eq!(location.candidates().len(), 1);
    }
}
