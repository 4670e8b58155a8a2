//! Expression resolution: substituting `${...}` placeholders against an
//! injected environment oracle.

use std::collections::HashMap;

use crate::error::ModelError;

/// The injected lookup source an [`EXPRESSION`](crate::value::ValueType::Expression)
/// value is resolved against. Implementations supply only the
/// caller-provided property map; the `env.`-prefixed OS-environment
/// fallback is applied centrally by the resolver (see module docs).
pub trait ExpressionEnvironment {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// The one concrete [`ExpressionEnvironment`] this crate ships: a plain
/// property map.
#[derive(Debug, Clone, Default)]
pub struct SimpleEnvironment {
    properties: HashMap<String, String>,
}

impl SimpleEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }
}

impl ExpressionEnvironment for SimpleEnvironment {
    fn lookup(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }
}

fn lookup_name(env: &dyn ExpressionEnvironment, name: &str) -> Option<String> {
    if let Some(value) = env.lookup(name) {
        return Some(value);
    }
    if let Some(var_name) = name.strip_prefix("env.") {
        if let Ok(value) = std::env::var(var_name) {
            return Some(value);
        }
    }
    None
}

/// Resolves a single `${...}` segment body (the text between `${` and
/// `}`, exclusive) against `env`.
fn resolve_segment(segment: &str, env: &dyn ExpressionEnvironment) -> Result<String, ModelError> {
    let alternatives: Vec<&str> = segment.split(',').collect();
    let last = alternatives.len() - 1;
    let mut fallback: Option<String> = None;
    for (i, alt) in alternatives.iter().enumerate() {
        if let Some((name, default)) = alt.split_once(':') {
            if let Some(value) = lookup_name(env, name) {
                return Ok(value);
            }
            fallback = Some(default.to_string());
        } else if i == last {
            fallback = Some((*alt).to_string());
        } else if let Some(value) = lookup_name(env, alt) {
            return Ok(value);
        }
    }
    fallback.ok_or_else(|| ModelError::Grammar(format!("unresolved expression: ${{{segment}}}")))
}

/// Replaces the first `${...}` segment in `text`, if any.
fn resolve_first(text: &str, env: &dyn ExpressionEnvironment) -> Result<Option<String>, ModelError> {
    let Some(start) = text.find("${") else {
        return Ok(None);
    };
    let after = &text[start + 2..];
    let Some(end_rel) = after.find('}') else {
        return Err(ModelError::Grammar("unterminated expression".to_string()));
    };
    let segment = &after[..end_rel];
    let tail_start = start + 2 + end_rel + 1;
    let resolved = resolve_segment(segment, env)?;
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..start]);
    out.push_str(&resolved);
    out.push_str(&text[tail_start..]);
    Ok(Some(out))
}

/// Resolves every `${...}` placeholder in `text`, re-entering the
/// scanner on the substituted text until a fixed point (bounded by the
/// text's length so a self-referential expression cannot loop forever).
pub fn resolve(text: &str, env: &dyn ExpressionEnvironment) -> Result<String, ModelError> {
    let mut current = text.to_string();
    let bound = current.len().saturating_mul(2) + 64;
    for _ in 0..bound {
        match resolve_first(&current, env)? {
            Some(next) => current = next,
            None => return Ok(current),
        }
    }
    Err(ModelError::Grammar(format!(
        "expression did not converge: {text}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_first_present_name() {
        let env = SimpleEnvironment::new().with_property("foo", "7");
        assert_eq!(resolve("${foo:bar}", &env).unwrap(), "7");
    }

    #[test]
    fn falls_back_to_default() {
        let env = SimpleEnvironment::new();
        assert_eq!(resolve("${foo:bar}", &env).unwrap(), "bar");
    }

    #[test]
    fn tries_alternatives_in_order() {
        let env = SimpleEnvironment::new().with_property("second", "s");
        assert_eq!(resolve("${first,second,default}", &env).unwrap(), "s");
    }

    #[test]
    fn unresolved_without_default_errors() {
        let env = SimpleEnvironment::new();
        assert!(resolve("${missing}", &env).is_err());
    }

    #[test]
    fn env_prefixed_names_fall_back_to_os_environment() {
        std::env::set_var("DMR_TEST_EXPR_VAR", "from-os");
        let env = SimpleEnvironment::new();
        assert_eq!(
            resolve("${env.DMR_TEST_EXPR_VAR:x}", &env).unwrap(),
            "from-os"
        );
        std::env::remove_var("DMR_TEST_EXPR_VAR");
    }

    #[test]
    fn literal_text_without_placeholder_is_unchanged() {
        let env = SimpleEnvironment::new();
        assert_eq!(resolve("no placeholders here", &env).unwrap(), "no placeholders here");
    }
}
