//! Persisted provider linkage state.
//!
//! - [`paths`]: platform-aware state directory resolution
//! - [`store`]: the state document and its reader/writer

pub mod paths;
pub mod store;

pub use paths::{
    resolve_state_dir, scope_key, OsFamily, PlatformInfo, StateEnv, StateLocation,
    ENV_CONFIG_DIR, ENV_STATE_IN_PROJECT, PROJECTS_DIR, STATE_FILE_NAME, WORKSPACE_DATA_DIR,
};
pub use store::{PersistedState, ProviderState, StateStore, TargetState};
