//! Environment maps: loading, filtering, diffing, mapping, validation.
//!
//! - [`pattern`]: only/ignore key patterns
//! - [`diff`]: added/removed/changed classification
//! - [`file`]: .env grammar, trimming and `$NAME` expansion
//! - [`context`]: layered environment context seeded once at startup
//! - [`mapping`]: key rename and value transforms
//! - [`mask`]: value masking for display
//! - [`validate`]: required-key and rule validation

use std::collections::BTreeMap;

pub mod context;
pub mod diff;
pub mod file;
pub mod mapping;
pub mod mask;
pub mod pattern;
pub mod validate;

/// Variable name to value. Sorted, so iteration is deterministic.
pub type EnvMap = BTreeMap<String, String>;

pub use context::{EnvContext, EnvLayer};
pub use diff::{diff_key_values, ChangedKey, EnvDiff};
pub use file::{
    expand_values, load_layered_env, override_file_for, parse_env_file, parse_env_str,
    EnvFileParser,
};
pub use mapping::{EnvMapping, Transform};
pub use mask::mask;
pub use pattern::{allow_key, match_pattern, to_patterns, KeyFilter, KeyPattern};
pub use validate::{validate_env, EnvSchema, SchemaType, ValidationReport};
