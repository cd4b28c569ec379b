//! Required-key and rule validation of an env map.
//!
//! A schema spec is a comma-separated list of parts. Each part is either
//! `builtin:<name>` (a fixed bundle of required keys) or a path to a JSON
//! schema file, read according to [`SchemaType`].

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use super::EnvMap;

/// How schema files are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaType {
    /// `{"required": [...]}`
    #[default]
    Keys,
    /// `keys` plus `regex`, `allowed`, `oneOf` and `requireIf` rules.
    Rules,
}

impl FromStr for SchemaType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "keys" => Ok(SchemaType::Keys),
            "rules" => Ok(SchemaType::Rules),
            other => bail!("Unknown schema type '{}' (expected keys or rules)", other),
        }
    }
}

/// Built-in required-key bundles.
pub fn builtin_schema(name: &str) -> Option<&'static [&'static str]> {
    let keys: &'static [&'static str] = match name {
        "next-basic" => &["DATABASE_URL", "NEXT_PUBLIC_SITE_URL"],
        "next-prisma" => &["DATABASE_URL", "DIRECT_URL"],
        "next-auth" => &["NEXTAUTH_SECRET", "NEXTAUTH_URL"],
        "better-auth" => &["BETTER_AUTH_SECRET", "BETTER_AUTH_URL"],
        "drizzle" => &["DATABASE_URL"],
        "supabase" => &[
            "NEXT_PUBLIC_SUPABASE_URL",
            "NEXT_PUBLIC_SUPABASE_ANON_KEY",
            "SUPABASE_SERVICE_ROLE_KEY",
        ],
        "stripe" => &[
            "STRIPE_SECRET_KEY",
            "STRIPE_WEBHOOK_SECRET",
            "NEXT_PUBLIC_STRIPE_PUBLISHABLE_KEY",
        ],
        "s3" => &[
            "AWS_REGION",
            "AWS_ACCESS_KEY_ID",
            "AWS_SECRET_ACCESS_KEY",
            "S3_BUCKET",
        ],
        "r2" => &[
            "R2_ACCOUNT_ID",
            "R2_ACCESS_KEY_ID",
            "R2_SECRET_ACCESS_KEY",
            "R2_BUCKET",
        ],
        "resend" => &["RESEND_API_KEY"],
        "clerk" => &["NEXT_PUBLIC_CLERK_PUBLISHABLE_KEY", "CLERK_SECRET_KEY"],
        "upstash-redis" => &["UPSTASH_REDIS_REST_URL", "UPSTASH_REDIS_REST_TOKEN"],
        "google-oauth" => &["GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"],
        "github-oauth" => &["GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"],
        "smtp-basic" => &["SMTP_HOST", "SMTP_PORT", "SMTP_SECURE", "SMTP_USER", "SMTP_PASS"],
        "email-basic" => &["EMAIL_FROM"],
        _ => return None,
    };
    Some(keys)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RulesFile {
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    regex: BTreeMap<String, String>,
    #[serde(default)]
    allowed: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    one_of: Vec<Vec<String>>,
    #[serde(default)]
    require_if: Vec<RequireIfEntry>,
}

#[derive(Debug, Deserialize)]
struct RequireIfEntry {
    #[serde(rename = "if")]
    condition: String,
    then: Vec<String>,
}

#[derive(Debug, Clone)]
struct RequireIf {
    key: String,
    value: Option<String>,
    then: Vec<String>,
}

impl RequireIf {
    fn holds(&self, env: &EnvMap) -> bool {
        match (&self.value, env.get(&self.key)) {
            (Some(expected), Some(actual)) => expected == actual,
            (None, Some(_)) => true,
            _ => false,
        }
    }

    fn describe(&self) -> String {
        match &self.value {
            Some(v) => format!("{}={}", self.key, v),
            None => self.key.clone(),
        }
    }
}

/// A compiled validation schema.
#[derive(Debug, Default)]
pub struct EnvSchema {
    required: Vec<String>,
    regex: Vec<(String, Regex)>,
    allowed: BTreeMap<String, Vec<String>>,
    one_of: Vec<Vec<String>>,
    require_if: Vec<RequireIf>,
}

impl EnvSchema {
    /// Build a schema from a comma-separated spec.
    ///
    /// Relative file paths resolve against `base_dir`.
    pub fn load(spec: &str, schema_type: SchemaType, base_dir: &Path) -> Result<Self> {
        let mut schema = EnvSchema::default();

        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if let Some(name) = part.strip_prefix("builtin:") {
                let keys =
                    builtin_schema(name).ok_or_else(|| anyhow!("Unknown builtin schema: {}", name))?;
                schema.add_required(keys.iter().copied());
                continue;
            }

            let path = base_dir.join(part);
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Schema not found: {}", path.display()))?;
            let rules: RulesFile = serde_json::from_str(&content)
                .with_context(|| format!("Schema invalid: {}", path.display()))?;
            schema.add_required(rules.required.iter().map(String::as_str));

            if schema_type == SchemaType::Rules {
                schema.add_rules(rules)?;
            }
        }

        Ok(schema)
    }

    fn add_required<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        for key in keys {
            if !self.required.iter().any(|k| k == key) {
                self.required.push(key.to_string());
            }
        }
    }

    fn add_rules(&mut self, rules: RulesFile) -> Result<()> {
        for (key, pattern) in rules.regex {
            let re = Regex::new(&pattern)
                .with_context(|| format!("Invalid regex for {}: {}", key, pattern))?;
            self.regex.push((key, re));
        }
        self.allowed.extend(rules.allowed);
        self.one_of.extend(rules.one_of);
        for entry in rules.require_if {
            let (key, value) = match entry.condition.split_once('=') {
                Some((k, v)) => (k.to_string(), Some(v.to_string())),
                None => (entry.condition.clone(), None),
            };
            self.require_if.push(RequireIf {
                key,
                value,
                then: entry.then,
            });
        }
        Ok(())
    }

    /// The required keys, in first-seen order.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Check an env map against this schema.
    pub fn validate(&self, env: &EnvMap) -> ValidationReport {
        let mut missing: Vec<String> = self
            .required
            .iter()
            .filter(|k| !env.contains_key(k.as_str()))
            .cloned()
            .collect();

        let unknown: Vec<String> = if self.required.is_empty() {
            Vec::new()
        } else {
            env.keys()
                .filter(|k| !self.required.contains(k))
                .cloned()
                .collect()
        };

        let mut violations = Vec::new();

        for (key, re) in &self.regex {
            if let Some(value) = env.get(key) {
                if !re.is_match(value) {
                    violations.push(format!("regex:{} does not match {}", key, re.as_str()));
                }
            }
        }

        for (key, values) in &self.allowed {
            if let Some(value) = env.get(key) {
                if !values.contains(value) {
                    violations.push(format!("allowed:{} must be one of {}", key, values.join("|")));
                }
            }
        }

        for group in &self.one_of {
            if !group.iter().any(|k| env.contains_key(k)) {
                violations.push(format!("oneOf: one of [{}] must be present", group.join(", ")));
            }
        }

        for rule in &self.require_if {
            if !rule.holds(env) {
                continue;
            }
            for need in &rule.then {
                if !env.contains_key(need) {
                    violations.push(format!(
                        "requireIf: {} is required when {}",
                        need,
                        rule.describe()
                    ));
                    if !missing.contains(need) {
                        missing.push(need.clone());
                    }
                }
            }
        }

        ValidationReport {
            ok: missing.is_empty() && violations.is_empty(),
            required: self.required.clone(),
            present_count: env.len(),
            missing,
            unknown,
            violations,
        }
    }
}

/// Result of validating an env map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub ok: bool,
    pub required: Vec<String>,
    pub missing: Vec<String>,
    pub unknown: Vec<String>,
    pub violations: Vec<String>,
    pub present_count: usize,
}

/// Load a schema spec and validate `env` against it.
pub fn validate_env(
    env: &EnvMap,
    spec: &str,
    schema_type: SchemaType,
    base_dir: &Path,
) -> Result<ValidationReport> {
    Ok(EnvSchema::load(spec, schema_type, base_dir)?.validate(env))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn map(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_schema_type() {
        assert_eq!("keys".parse::<SchemaType>().unwrap(), SchemaType::Keys);
        assert_eq!("rules".parse::<SchemaType>().unwrap(), SchemaType::Rules);
        assert!("jsonschema".parse::<SchemaType>().is_err());
    }

    #[test]
    fn builtin_reports_missing_and_unknown() {
        let temp = TempDir::new().unwrap();
        let env = map(&[("DATABASE_URL", "x"), ("EXTRA", "y")]);

        let report = validate_env(&env, "builtin:next-basic", SchemaType::Keys, temp.path()).unwrap();

        assert!(!report.ok);
        assert_eq!(report.missing, vec!["NEXT_PUBLIC_SITE_URL"]);
        assert_eq!(report.unknown, vec!["EXTRA"]);
        assert_eq!(report.present_count, 2);
    }

    #[test]
    fn composes_builtins_without_duplicates() {
        let temp = TempDir::new().unwrap();
        let schema = EnvSchema::load(
            "builtin:next-basic, builtin:drizzle",
            SchemaType::Keys,
            temp.path(),
        )
        .unwrap();
        assert_eq!(schema.required(), ["DATABASE_URL", "NEXT_PUBLIC_SITE_URL"]);
    }

    #[test]
    fn unknown_builtin_is_error() {
        let temp = TempDir::new().unwrap();
        let err = EnvSchema::load("builtin:nope", SchemaType::Keys, temp.path()).unwrap_err();
        assert!(err.to_string().contains("Unknown builtin schema: nope"));
    }

    #[test]
    fn missing_schema_file_is_error() {
        let temp = TempDir::new().unwrap();
        let err = EnvSchema::load("schema.json", SchemaType::Keys, temp.path()).unwrap_err();
        assert!(err.to_string().contains("Schema not found"));
    }

    #[test]
    fn keys_file_ignores_rules() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("schema.json"),
            r#"{"required": ["A"], "oneOf": [["X", "Y"]]}"#,
        )
        .unwrap();

        let report =
            validate_env(&map(&[("A", "1")]), "schema.json", SchemaType::Keys, temp.path()).unwrap();

        assert!(report.ok);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn rules_file_checks_everything() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("rules.json"),
            r#"{
                "required": ["MODE"],
                "regex": {"PORT": "^[0-9]+$"},
                "allowed": {"MODE": ["dev", "prod"]},
                "oneOf": [["RESEND_API_KEY", "SMTP_HOST"]],
                "requireIf": [{"if": "MODE=prod", "then": ["SENTRY_DSN"]}]
            }"#,
        )
        .unwrap();
        let env = map(&[("MODE", "prod"), ("PORT", "80a")]);

        let report = validate_env(&env, "rules.json", SchemaType::Rules, temp.path()).unwrap();

        assert!(!report.ok);
        assert_eq!(report.missing, vec!["SENTRY_DSN"]);
        assert_eq!(report.violations.len(), 3);
        assert!(report.violations[0].starts_with("regex:PORT"));
        assert!(report.violations[1].starts_with("oneOf:"));
        assert_eq!(
            report.violations[2],
            "requireIf: SENTRY_DSN is required when MODE=prod"
        );
    }

    #[test]
    fn require_if_without_value_triggers_on_presence() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("rules.json"),
            r#"{"requireIf": [{"if": "SMTP_HOST", "then": ["SMTP_PORT"]}]}"#,
        )
        .unwrap();

        let without = validate_env(&EnvMap::new(), "rules.json", SchemaType::Rules, temp.path()).unwrap();
        assert!(without.ok);

        let with = validate_env(
            &map(&[("SMTP_HOST", "h")]),
            "rules.json",
            SchemaType::Rules,
            temp.path(),
        )
        .unwrap();
        assert!(!with.ok);
        assert_eq!(with.missing, vec!["SMTP_PORT"]);
    }

    #[test]
    fn allowed_rejects_other_values() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("rules.json"),
            r#"{"allowed": {"MODE": ["dev", "prod"]}}"#,
        )
        .unwrap();

        let report = validate_env(
            &map(&[("MODE", "staging")]),
            "rules.json",
            SchemaType::Rules,
            temp.path(),
        )
        .unwrap();

        assert_eq!(report.violations, vec!["allowed:MODE must be one of dev|prod"]);
        assert!(report.unknown.is_empty());
    }
}
