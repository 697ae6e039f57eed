use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Splits a free-form argument string into tokens.
///
/// Tokens are separated by whitespace. Single or double quotes group
/// whitespace into one token and are stripped from the result.
pub fn parse_additional_args(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }

    tokens
}

/// Drops exact duplicates, keeping the first occurrence and the order of survivors.
///
/// Flags sharing a key but carrying different values are all kept; a warning
/// names the key so the conflict is visible in the logs.
pub fn remove_args_duplicate(args: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values_by_key: HashMap<String, String> = HashMap::new();
    let mut out = Vec::with_capacity(args.len());

    for arg in args {
        if !seen.insert(arg.clone()) {
            continue;
        }
        if let Some((key, value)) = arg.split_once('=') {
            if key.starts_with("--") {
                match values_by_key.get(key) {
                    Some(previous) if previous != value => {
                        warn!("Flag {} given more than once with different values", key);
                    }
                    Some(_) => {}
                    None => {
                        values_by_key.insert(key.to_string(), value.to_string());
                    }
                }
            }
        }
        out.push(arg);
    }

    out
}

pub(crate) fn flag(key: &str, value: impl std::fmt::Display) -> String {
    format!("--{}={}", key, value)
}
