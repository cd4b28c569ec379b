//! Explicit environment context.
//!
//! Everything that would otherwise come from the ambient process environment
//! (reference fallbacks during expansion, CI detection, state directory
//! overrides) is read from an [`EnvContext`]. The CLI builds one at startup
//! with [`EnvContext::bootstrap`]; tests build them from literal pairs.
//!
//! The context is a stack of layers with source tracking. Later layers win.

use std::path::Path;

use super::file::parse_env_file;
use super::EnvMap;

/// One named layer of variables.
#[derive(Debug, Clone, Default)]
pub struct EnvLayer {
    /// Where these variables came from (for `--debug` output).
    pub source: String,
    pub vars: EnvMap,
}

impl EnvLayer {
    pub fn new(source: impl Into<String>, vars: EnvMap) -> Self {
        Self {
            source: source.into(),
            vars,
        }
    }
}

/// Layered, read-only view of environment variables.
///
/// # Example
///
/// ```
/// use fleetenv::env::EnvContext;
///
/// let ctx = EnvContext::from_vars([("CI", "true"), ("HOME", "/home/me")])
///     .with_layer("override", [("HOME".to_string(), "/tmp".to_string())].into());
///
/// assert!(ctx.is_ci());
/// assert_eq!(ctx.get("HOME"), Some("/tmp"));
/// assert_eq!(ctx.source_of("HOME"), Some("override"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnvContext {
    layers: Vec<EnvLayer>,
}

impl EnvContext {
    /// A context with no variables.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single-layer context from literal pairs.
    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            layers: vec![EnvLayer::new("process", vars)],
        }
    }

    /// Build the startup context for a workspace root.
    ///
    /// Layers, lowest priority first: `<root>/.env`, the process
    /// variables, `<root>/.env.local`. So `.env` never shadows a variable
    /// that is already set, while `.env.local` does.
    pub fn bootstrap<I>(root: &Path, process_vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let process = Self::from_vars(process_vars);

        let base = parse_env_file(&root.join(".env"), &process);
        let local = parse_env_file(&root.join(".env.local"), &process);
        tracing::debug!(
            "Workspace env: {} from .env, {} from .env.local",
            base.len(),
            local.len()
        );

        let mut ctx = Self::empty().with_layer(".env", base);
        ctx.layers.extend(process.layers);
        ctx.with_layer(".env.local", local)
    }

    /// Push a higher-priority layer.
    pub fn with_layer(mut self, source: impl Into<String>, vars: EnvMap) -> Self {
        self.layers.push(EnvLayer::new(source, vars));
        self
    }

    /// Resolved value of a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.vars.get(key))
            .map(String::as_str)
    }

    /// Resolved value, treating empty strings as unset.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Source name of the layer that provides a variable.
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.layers
            .iter()
            .rev()
            .find(|layer| layer.vars.contains_key(key))
            .map(|layer| layer.source.as_str())
    }

    /// True when a flag variable is set to `1` or `true`.
    pub fn is_truthy(&self, key: &str) -> bool {
        matches!(
            self.get(key).map(|v| v.trim().to_ascii_lowercase()).as_deref(),
            Some("1" | "true")
        )
    }

    /// Whether we are running under CI.
    pub fn is_ci(&self) -> bool {
        self.is_truthy("CI") || self.is_truthy("GITHUB_ACTIONS")
    }

    /// Flattened view of all layers.
    pub fn resolve(&self) -> EnvMap {
        let mut out = EnvMap::new();
        for layer in &self.layers {
            out.extend(layer.vars.clone());
        }
        out
    }

    pub fn layers(&self) -> &[EnvLayer] {
        &self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn process(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_context_has_nothing() {
        let ctx = EnvContext::empty();
        assert_eq!(ctx.get("HOME"), None);
        assert!(!ctx.is_ci());
        assert!(ctx.resolve().is_empty());
    }

    #[test]
    fn later_layers_win() {
        let ctx = EnvContext::from_vars([("A", "1"), ("B", "1")])
            .with_layer("top", [("A".to_string(), "2".to_string())].into());

        assert_eq!(ctx.get("A"), Some("2"));
        assert_eq!(ctx.get("B"), Some("1"));
        assert_eq!(ctx.source_of("A"), Some("top"));
        assert_eq!(ctx.source_of("B"), Some("process"));
        assert_eq!(ctx.resolve().get("A").map(String::as_str), Some("2"));
    }

    #[test]
    fn ci_detection() {
        assert!(EnvContext::from_vars([("CI", "true")]).is_ci());
        assert!(EnvContext::from_vars([("CI", "1")]).is_ci());
        assert!(EnvContext::from_vars([("GITHUB_ACTIONS", "true")]).is_ci());
        assert!(!EnvContext::from_vars([("CI", "false")]).is_ci());
        assert!(!EnvContext::from_vars([("CI", "")]).is_ci());
    }

    #[test]
    fn get_non_empty_skips_blank() {
        let ctx = EnvContext::from_vars([("XDG_CONFIG_HOME", "")]);
        assert_eq!(ctx.get("XDG_CONFIG_HOME"), Some(""));
        assert_eq!(ctx.get_non_empty("XDG_CONFIG_HOME"), None);
    }

    #[test]
    fn bootstrap_layers_dotenv_below_process_and_local_above() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".env"), "A=from-env\nB=from-env\nC=from-env").unwrap();
        fs::write(temp.path().join(".env.local"), "C=from-local").unwrap();

        let ctx = EnvContext::bootstrap(
            temp.path(),
            process(&[("B", "from-process"), ("C", "from-process")]),
        );

        assert_eq!(ctx.get("A"), Some("from-env"));
        assert_eq!(ctx.get("B"), Some("from-process"));
        assert_eq!(ctx.get("C"), Some("from-local"));
        assert_eq!(ctx.source_of("C"), Some(".env.local"));
    }

    #[test]
    fn bootstrap_without_files_is_process_only() {
        let temp = TempDir::new().unwrap();
        let ctx = EnvContext::bootstrap(temp.path(), process(&[("X", "1")]));
        assert_eq!(ctx.resolve().len(), 1);
    }
}
