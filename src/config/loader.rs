//! Configuration loading and environment parsing.

use super::Config;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Load configuration with the following precedence (highest first):
/// 1) `MASQUERADE_CONFIG_JSON` env var containing raw JSON
/// 2) File pointed to by `MASQUERADE_CONFIG_PATH`
/// 3) `config.json` in the current working directory
/// 4) Defaults compiled into the binary
///
/// Individual fields can be overridden by environment variables with the
/// prefix `MASQUERADE` using `__` as a nested separator, e.g.
/// `MASQUERADE__PORT=8080` or `MASQUERADE__GAME__DISCUSSION_SECS=90`.
///
/// A handful of flat legacy variables are also honored for operational
/// convenience: `NUM_AI_PLAYERS`, `AI_MODEL_PROVIDER`, `AI_MODEL_NAME`,
/// `AI_TEMPERATURE`, `DISCUSSION_TIME`, `VOTING_TIME`, `ROUNDS_TO_WIN`,
/// `MESSAGE_COOLDOWN`, `LLM_API_KEY`, `HOST`, `PORT`.
///
/// Any errors while reading/parsing are printed to stderr and defaults are
/// used. `load()` always returns a `Config`; callers who need hard failure
/// should run [`super::validation::validate`] on the result.
#[must_use]
pub fn load() -> Config {
    use std::env;
    use std::path::PathBuf;

    let defaults = Config::default();
    let mut merged =
        serde_json::to_value(&defaults).unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

    // 1) Inline JSON via env var
    if let Ok(json) = env::var("MASQUERADE_CONFIG_JSON") {
        if let Some(value) = parse_json_document(&json, "MASQUERADE_CONFIG_JSON") {
            merge_values(&mut merged, value);
        }
    }

    // 2) Explicit path via env var
    if let Ok(path) = env::var("MASQUERADE_CONFIG_PATH") {
        merge_file_source(&mut merged, &PathBuf::from(path));
    }

    // 3) config.json in CWD
    merge_file_source(&mut merged, &PathBuf::from("config.json"));

    // Environment overrides with prefix MASQUERADE and nested separator __
    apply_env_overrides(&mut merged);

    // Flat legacy variables, applied last so they always win
    apply_legacy_env_vars(&mut merged);

    match serde_json::from_value::<Config>(merged) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to deserialize config; using defaults: {e}");
            defaults
        }
    }
}

fn parse_json_document(raw: &str, label: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }

    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            eprintln!("Failed to parse config from {label}: {err}");
            None
        }
    }
}

fn merge_file_source(target: &mut Value, path: &Path) {
    if path.as_os_str().is_empty() || !path.exists() {
        return;
    }

    match fs::read_to_string(path) {
        Ok(contents) => {
            if let Some(value) = parse_json_document(&contents, &format!("file {}", path.display()))
            {
                merge_values(target, value);
            }
        }
        Err(err) => {
            eprintln!("Failed to read config from {}: {}", path.display(), err);
        }
    }
}

fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target_slot, source_value) => {
            *target_slot = source_value;
        }
    }
}

fn apply_env_overrides(root: &mut Value) {
    for (key, raw_value) in std::env::vars() {
        let Some(stripped) = key.strip_prefix("MASQUERADE__") else {
            continue;
        };

        let segments: Vec<String> = stripped
            .split("__")
            .filter(|segment| !segment.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();

        if segments.is_empty() {
            continue;
        }

        let value = parse_env_value(&raw_value);
        set_nested_value(root, &segments, value);
    }
}

/// Mapping of flat legacy variables to their nested config paths.
const LEGACY_ENV_VARS: &[(&str, &[&str])] = &[
    ("HOST", &["host"]),
    ("PORT", &["port"]),
    ("NUM_AI_PLAYERS", &["game", "num_ai_players"]),
    ("DISCUSSION_TIME", &["game", "discussion_secs"]),
    ("VOTING_TIME", &["game", "voting_secs"]),
    ("ROUNDS_TO_WIN", &["game", "rounds_to_win"]),
    ("MESSAGE_COOLDOWN", &["game", "message_cooldown_secs"]),
    ("AI_MODEL_PROVIDER", &["ai", "provider"]),
    ("AI_MODEL_NAME", &["ai", "model"]),
    ("AI_TEMPERATURE", &["ai", "temperature"]),
    ("LLM_API_KEY", &["ai", "api_key"]),
];

fn apply_legacy_env_vars(root: &mut Value) {
    for (var, path) in LEGACY_ENV_VARS {
        if let Ok(raw) = std::env::var(var) {
            if raw.trim().is_empty() {
                continue;
            }
            let segments: Vec<String> = path.iter().map(|s| (*s).to_string()).collect();
            set_nested_value(root, &segments, parse_env_value(&raw));
        }
    }
}

fn parse_env_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::String(String::new());
    }

    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

fn set_nested_value(target: &mut Value, segments: &[String], value: Value) {
    match segments {
        [] => *target = value,
        [leaf] => {
            let map = ensure_object(target);
            map.insert(leaf.clone(), value);
        }
        [head, rest @ ..] => {
            let map = ensure_object(target);
            let entry = map
                .entry(head.clone())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            set_nested_value(entry, rest, value);
        }
    }
}

fn ensure_object(value: &mut Value) -> &mut serde_json::Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(serde_json::Map::new());
    }

    // SAFETY: The branch above guarantees `value` is a `Value::Object`, so
    // `as_object_mut()` will always return `Some`.
    #[allow(clippy::expect_used)]
    value
        .as_object_mut()
        .expect("value should be coerced into an object")
}
