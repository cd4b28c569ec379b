//! .env file parsing and loading.
//!
//! [`EnvFileParser`] implements the dotenv grammar. [`parse_env_file`] layers
//! the loader semantics on top of it: values are trimmed, keys with empty
//! values are dropped, and `${NAME}` / `$NAME` references are expanded.

use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

use super::{EnvContext, EnvMap};

/// Maximum number of expansion passes applied to a single value.
pub const MAX_EXPANSION_PASSES: usize = 5;

static VAR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z0-9_]+)\}|\$([A-Z0-9_]+)").unwrap());

/// Parses .env content into a map of raw (untrimmed, unexpanded) values.
///
/// # Supported Formats
///
/// - Simple: `KEY=value`
/// - Exported: `export KEY=value`
/// - Quoted: `KEY="value"`, `KEY='value'`, ``KEY=`value` ``
/// - Multi-line double-quoted values, with `\n`, `\"` and `\\` escapes
/// - Comments: full-line `# comment` and inline ` # comment` after unquoted values
/// - Values with equals signs: `URL=https://example.com?foo=bar`
///
/// Lines without `=` are skipped. Later assignments of a key win.
///
/// # Example
///
/// ```
/// use fleetenv::env::EnvFileParser;
///
/// let content = r#"
/// # Database config
/// DATABASE_URL=postgres://localhost/db
/// export DEBUG="true"
/// "#;
///
/// let vars = EnvFileParser::parse(content);
/// assert_eq!(vars.get("DATABASE_URL").map(String::as_str), Some("postgres://localhost/db"));
/// assert_eq!(vars.get("DEBUG").map(String::as_str), Some("true"));
/// ```
pub struct EnvFileParser;

impl EnvFileParser {
    /// Parse an env file content string into a map of variables.
    pub fn parse(content: &str) -> EnvMap {
        let mut vars = EnvMap::new();
        let mut lines = content.lines();

        while let Some(raw) = lines.next() {
            let line = raw.trim_start();

            // Skip empty lines and comments
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);

            let Some(eq_pos) = line.find('=') else {
                continue;
            };
            let key = line[..eq_pos].trim();
            if !Self::is_valid_key(key) {
                continue;
            }
            let rest = line[eq_pos + 1..].trim_start();

            let value = match rest.chars().next() {
                Some('"') => Self::double_quoted(&rest[1..], &mut lines),
                Some(q @ ('\'' | '`')) => Self::single_quoted(&rest[1..], q),
                _ => Self::unquoted(rest),
            };

            vars.insert(key.to_string(), value);
        }

        vars
    }

    /// Keys are non-empty and free of whitespace and quotes.
    fn is_valid_key(key: &str) -> bool {
        !key.is_empty()
            && !key
                .chars()
                .any(|c| c.is_whitespace() || c == '"' || c == '\'' || c == '#')
    }

    fn unquoted(rest: &str) -> String {
        let value = match rest.find(" #") {
            Some(pos) => &rest[..pos],
            None if rest.starts_with('#') => "",
            None => rest,
        };
        value.trim().to_string()
    }

    fn single_quoted(rest: &str, quote: char) -> String {
        match rest.rfind(quote) {
            Some(end) => rest[..end].to_string(),
            None => rest.trim_end().to_string(),
        }
    }

    /// Read a double-quoted value, continuing onto following lines until
    /// the closing quote.
    fn double_quoted<'a>(first: &'a str, lines: &mut impl Iterator<Item = &'a str>) -> String {
        let mut out = String::new();
        let mut current = first;

        loop {
            let mut chars = current.chars();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some('n') => out.push('\n'),
                        Some('r') => out.push('\r'),
                        Some('t') => out.push('\t'),
                        Some(other) => out.push(other),
                        None => out.push('\\'),
                    },
                    '"' => return out,
                    _ => out.push(c),
                }
            }
            match lines.next() {
                Some(next) => {
                    out.push('\n');
                    current = next;
                }
                // Unterminated: keep what was read
                None => return out,
            }
        }
    }

    /// Render a map as .env content that [`EnvFileParser::parse`] reads back
    /// unchanged.
    pub fn render(vars: &EnvMap) -> String {
        let mut out = String::new();
        for (key, value) in vars {
            let escaped = value
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n")
                .replace('\r', "\\r");
            out.push_str(&format!("{}=\"{}\"\n", key, escaped));
        }
        out
    }
}

/// Trim values and drop keys whose trimmed value is empty.
fn trim_values(raw: EnvMap) -> EnvMap {
    raw.into_iter()
        .filter_map(|(k, v)| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some((k, trimmed.to_string()))
            }
        })
        .collect()
}

/// Expand references in every value of an already-trimmed map.
///
/// References resolve against the trimmed (unexpanded) values of the same
/// map, then against `ctx`, then to the empty string. Each value gets at
/// most [`MAX_EXPANSION_PASSES`] passes and stops as soon as a pass changes
/// nothing, so cyclic references leave residual `$NAME` tokens.
pub fn expand_values(trimmed: &EnvMap, ctx: &EnvContext) -> EnvMap {
    let resolve = |name: &str| -> String {
        trimmed
            .get(name)
            .map(String::as_str)
            .or_else(|| ctx.get(name))
            .unwrap_or_default()
            .to_string()
    };

    trimmed
        .iter()
        .map(|(key, value)| {
            let mut current = value.clone();
            for _ in 0..MAX_EXPANSION_PASSES {
                let next = VAR_REF
                    .replace_all(&current, |caps: &Captures| {
                        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                        resolve(name)
                    })
                    .into_owned();
                if next == current {
                    break;
                }
                current = next;
            }
            (key.clone(), current)
        })
        .collect()
}

/// Parse .env content with loader semantics (trim, drop empty, expand).
pub fn parse_env_str(content: &str, ctx: &EnvContext) -> EnvMap {
    let trimmed = trim_values(EnvFileParser::parse(content));
    expand_values(&trimmed, ctx)
}

/// Load an env file with loader semantics.
///
/// Never fails: a missing or unreadable file yields an empty map, since env
/// files are optional.
pub fn parse_env_file(path: &Path, ctx: &EnvContext) -> EnvMap {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_env_str(&content, ctx),
        Err(e) => {
            tracing::debug!("Env file {} not loaded: {}", path.display(), e);
            EnvMap::new()
        }
    }
}

/// The override file that pairs with a local env file.
///
/// `.env` pairs with `.env.local`, `.env.production` with
/// `.env.production.local`. Files already ending in `.local` have none.
pub fn override_file_for(file: &str) -> Option<String> {
    if file.ends_with(".local") {
        None
    } else {
        Some(format!("{}.local", file))
    }
}

/// Load a local env file and its override file; override values win.
pub fn load_layered_env(dir: &Path, file: &str, ctx: &EnvContext) -> EnvMap {
    let mut vars = parse_env_file(&dir.join(file), ctx);
    if let Some(override_file) = override_file_for(file) {
        vars.extend(parse_env_file(&dir.join(override_file), ctx));
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn get<'a>(vars: &'a EnvMap, key: &str) -> Option<&'a str> {
        vars.get(key).map(String::as_str)
    }

    #[test]
    fn parses_simple_env_file() {
        let vars = EnvFileParser::parse("KEY1=value1\nKEY2=value2\n");
        assert_eq!(get(&vars, "KEY1"), Some("value1"));
        assert_eq!(get(&vars, "KEY2"), Some("value2"));
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let content = "# comment\n\nKEY=value\n   # indented comment\n";
        let vars = EnvFileParser::parse(content);
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn handles_quoted_values() {
        let content = "DOUBLE=\"double quoted\"\nSINGLE='single quoted'\nTICK=`tick`\n";
        let vars = EnvFileParser::parse(content);
        assert_eq!(get(&vars, "DOUBLE"), Some("double quoted"));
        assert_eq!(get(&vars, "SINGLE"), Some("single quoted"));
        assert_eq!(get(&vars, "TICK"), Some("tick"));
    }

    #[test]
    fn strips_export_prefix() {
        let vars = EnvFileParser::parse("export TOKEN=abc");
        assert_eq!(get(&vars, "TOKEN"), Some("abc"));
    }

    #[test]
    fn strips_inline_comments_from_unquoted_values() {
        let vars = EnvFileParser::parse("PORT=3000 # dev port\nHASH=\"a # b\"");
        assert_eq!(get(&vars, "PORT"), Some("3000"));
        assert_eq!(get(&vars, "HASH"), Some("a # b"));
    }

    #[test]
    fn handles_multiline_double_quoted_values() {
        let content = "KEY=\"line1\nline2\"\nNEXT=1";
        let vars = EnvFileParser::parse(content);
        assert_eq!(get(&vars, "KEY"), Some("line1\nline2"));
        assert_eq!(get(&vars, "NEXT"), Some("1"));
    }

    #[test]
    fn handles_escapes_in_double_quotes() {
        let vars = EnvFileParser::parse(r#"KEY="a\nb \"q\" c\\d""#);
        assert_eq!(get(&vars, "KEY"), Some("a\nb \"q\" c\\d"));
    }

    #[test]
    fn handles_values_with_equals() {
        let vars = EnvFileParser::parse("URL=https://example.com?foo=bar");
        assert_eq!(get(&vars, "URL"), Some("https://example.com?foo=bar"));
    }

    #[test]
    fn skips_lines_without_equals() {
        let vars = EnvFileParser::parse("KEY1=value1\ninvalid line\nKEY2=value2");
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn later_assignment_wins() {
        let vars = EnvFileParser::parse("A=1\nA=2");
        assert_eq!(get(&vars, "A"), Some("2"));
    }

    #[test]
    fn render_is_read_back_unchanged() {
        let mut vars = EnvMap::new();
        vars.insert("PLAIN".into(), "value".into());
        vars.insert("TRICKY".into(), "a \"b\"\nc\\d # e".into());

        let parsed = EnvFileParser::parse(&EnvFileParser::render(&vars));

        assert_eq!(parsed, vars);
    }

    #[test]
    fn render_keeps_carriage_returns() {
        let mut vars = EnvMap::new();
        vars.insert("CRLF".into(), "line one\r\nline two".into());
        vars.insert("TRAILING_CR".into(), "value\r".into());

        let rendered = EnvFileParser::render(&vars);

        assert!(!rendered.contains('\r'));
        assert_eq!(EnvFileParser::parse(&rendered), vars);
    }

    #[test]
    fn loader_trims_expands_and_drops_empty() {
        let ctx = EnvContext::empty();
        let content = "A=  foo  \nB=$A-suf\nC=${A}-x\nEMPTY=   \n";

        let vars = parse_env_str(content, &ctx);

        assert_eq!(get(&vars, "A"), Some("foo"));
        assert_eq!(get(&vars, "B"), Some("foo-suf"));
        assert_eq!(get(&vars, "C"), Some("foo-x"));
        assert!(!vars.contains_key("EMPTY"));
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn quoted_whitespace_is_trimmed_too() {
        let vars = parse_env_str("A=\"  padded  \"\nB=\"   \"", &EnvContext::empty());
        assert_eq!(get(&vars, "A"), Some("padded"));
        assert!(!vars.contains_key("B"));
    }

    #[test]
    fn expansion_follows_chains() {
        let vars = parse_env_str("A=base\nB=${A}/b\nC=${B}/c", &EnvContext::empty());
        assert_eq!(get(&vars, "C"), Some("base/b/c"));
    }

    #[test]
    fn expansion_falls_back_to_context_then_empty() {
        let ctx = EnvContext::from_vars([("HOST", "example.com")]);
        let vars = parse_env_str("URL=https://$HOST/x\nMISSING=[${NOPE}]", &ctx);
        assert_eq!(get(&vars, "URL"), Some("https://example.com/x"));
        assert_eq!(get(&vars, "MISSING"), Some("[]"));
    }

    #[test]
    fn file_values_shadow_context() {
        let ctx = EnvContext::from_vars([("HOST", "from-context")]);
        let vars = parse_env_str("HOST=from-file\nURL=$HOST", &ctx);
        assert_eq!(get(&vars, "URL"), Some("from-file"));
    }

    #[test]
    fn dropped_empty_key_resolves_from_context() {
        let ctx = EnvContext::from_vars([("E", "ctx")]);
        let vars = parse_env_str("E=  \nX=$E", &ctx);
        assert_eq!(get(&vars, "X"), Some("ctx"));
    }

    #[test]
    fn lowercase_references_are_left_alone() {
        let vars = parse_env_str("A=1\nB=$a-${a}", &EnvContext::empty());
        assert_eq!(get(&vars, "B"), Some("$a-${a}"));
    }

    #[test]
    fn cyclic_references_stop_after_pass_limit() {
        let vars = parse_env_str("X=$Y\nY=$X", &EnvContext::empty());
        // Each pass swaps the reference, so a token always remains.
        assert!(get(&vars, "X").unwrap().starts_with('$'));
        assert!(get(&vars, "Y").unwrap().starts_with('$'));
    }

    #[test]
    fn self_reference_that_grows_is_bounded() {
        let vars = parse_env_str("P=a:$P", &EnvContext::empty());
        let value = get(&vars, "P").unwrap();
        assert_eq!(value.matches("a:").count(), MAX_EXPANSION_PASSES + 1);
        assert!(value.ends_with("$P"));
    }

    #[test]
    fn missing_file_yields_empty_map() {
        let vars = parse_env_file(Path::new("/nonexistent/.env"), &EnvContext::empty());
        assert!(vars.is_empty());
    }

    #[test]
    fn override_file_naming() {
        assert_eq!(override_file_for(".env").as_deref(), Some(".env.local"));
        assert_eq!(
            override_file_for(".env.production").as_deref(),
            Some(".env.production.local")
        );
        assert_eq!(override_file_for(".env.local"), None);
    }

    #[test]
    fn layered_env_prefers_override_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".env"), "A=base\nB=base").unwrap();
        fs::write(temp.path().join(".env.local"), "B=local\nC=local").unwrap();

        let vars = load_layered_env(temp.path(), ".env", &EnvContext::empty());

        assert_eq!(get(&vars, "A"), Some("base"));
        assert_eq!(get(&vars, "B"), Some("local"));
        assert_eq!(get(&vars, "C"), Some("local"));
    }
}
