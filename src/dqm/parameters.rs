//! Per-item parameter lookup.
//!
//! Node configuration values may reference the current input item with
//! `{{ input }}` or `{{ input.field }}`; they are rendered per item before the
//! typed request is built.

use std::sync::OnceLock;

use regex_lite::{Captures, Regex};
use serde_json::Value;

use crate::error::{Error, Result};

/// Typed, per-item access to operation parameters by field name.
pub trait ParameterReader: Send + Sync {
    /// Number of input items parameters can be read for.
    fn item_count(&self) -> usize;

    /// String value of `name` for item `item`, `None` if unset or null.
    fn string(&self, name: &str, item: usize) -> Option<String>;

    /// Integer value of `name` for item `item`.
    ///
    /// Numeric strings (including rendered templates) are accepted; anything
    /// else that is set is an invalid-parameter error.
    fn integer(&self, name: &str, item: usize) -> Result<Option<i64>>;
}

/// Parameters read from a node's JSON config, rendered against input items.
pub struct NodeParameters<'a> {
    config: &'a Value,
    items: &'a [Value],
}

impl<'a> NodeParameters<'a> {
    pub fn new(config: &'a Value, items: &'a [Value]) -> Self {
        Self { config, items }
    }

    fn item(&self, index: usize) -> &Value {
        static NULL: Value = Value::Null;
        self.items.get(index).unwrap_or(&NULL)
    }
}

impl ParameterReader for NodeParameters<'_> {
    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn string(&self, name: &str, item: usize) -> Option<String> {
        match self.config.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(render_template(s, self.item(item))),
            other => Some(other.to_string()),
        }
    }

    fn integer(&self, name: &str, item: usize) -> Result<Option<i64>> {
        match self.config.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| Error::invalid(name, format!("expected an integer, got {}", n))),
            Some(Value::String(s)) => {
                let rendered = render_template(s, self.item(item));
                let trimmed = rendered.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed.parse::<i64>().map(Some).map_err(|_| {
                    Error::invalid(name, format!("expected an integer, got '{}'", trimmed))
                })
            }
            Some(other) => Err(Error::invalid(
                name,
                format!("expected an integer, got {}", other),
            )),
        }
    }
}

/// Plain JSON parameters with no templating, identical for every item.
impl ParameterReader for Value {
    fn item_count(&self) -> usize {
        1
    }

    fn string(&self, name: &str, _item: usize) -> Option<String> {
        match self.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn integer(&self, name: &str, _item: usize) -> Result<Option<i64>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| Error::invalid(name, format!("expected an integer, got {}", n))),
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed.parse::<i64>().map(Some).map_err(|_| {
                    Error::invalid(name, format!("expected an integer, got '{}'", trimmed))
                })
            }
            Some(other) => Err(Error::invalid(
                name,
                format!("expected an integer, got {}", other),
            )),
        }
    }
}

fn template_regex() -> &'static Regex {
    static TEMPLATE_REGEX: OnceLock<Regex> = OnceLock::new();
    TEMPLATE_REGEX.get_or_init(|| Regex::new(r"\{\{\s*(.+?)\s*\}\}").expect("valid regex"))
}

/// Replace `{{ input }}` and `{{ input.field }}` references with values from
/// the current item. Dotted paths (`{{ input.page.id }}`) walk nested objects.
/// A reference to a field the item lacks renders as an empty string; any other
/// `{{ ... }}` expression is left as written.
fn render_template(template: &str, input: &Value) -> String {
    template_regex()
        .replace_all(template, |caps: &Captures| {
            let expr = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            resolve_input(expr.trim(), input)
                .unwrap_or_else(|| caps.get(0).map(|m| m.as_str()).unwrap_or_default().to_string())
        })
        .into_owned()
}

fn resolve_input(expr: &str, input: &Value) -> Option<String> {
    let value = if expr == "input" {
        Some(input)
    } else {
        let path = expr.strip_prefix("input.")?;
        path.split('.')
            .try_fold(input, |current, key| current.get(key))
    };

    Some(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    })
}
