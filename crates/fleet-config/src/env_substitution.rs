use fleet_core::{FleetError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::env;

// ${VAR} or ${VAR:-default}
static ENV_VAR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}").expect("Invalid regex pattern")
});

/// Recursively substitute environment variables in every string of a
/// parsed configuration document.
pub fn substitute_env_vars(value: &mut Value) -> Result<()> {
    substitute_with(value, &|name| env::var(name).ok())
}

pub(crate) fn substitute_with(
    value: &mut Value,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<()> {
    match value {
        Value::String(s) => {
            *s = substitute_in_string(s, lookup)?;
        }
        Value::Object(map) => {
            for v in map.values_mut() {
                substitute_with(v, lookup)?;
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                substitute_with(v, lookup)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn substitute_in_string(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Result<String> {
    let mut missing_vars = Vec::new();

    let result = ENV_VAR_REGEX.replace_all(input, |cap: &regex::Captures<'_>| {
        let var_name = &cap[1];
        match (lookup(var_name), cap.get(2)) {
            (Some(value), _) => value,
            (None, Some(default)) => default.as_str().to_string(),
            (None, None) => {
                missing_vars.push(var_name.to_string());
                String::new()
            }
        }
    });

    if !missing_vars.is_empty() {
        return Err(FleetError::ConfigError(format!(
            "Missing required environment variables: {}. Set them or give a ${{VAR:-default}} fallback.",
            missing_vars.join(", ")
        )));
    }

    Ok(result.into_owned())
}
