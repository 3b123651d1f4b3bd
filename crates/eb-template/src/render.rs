//! Built-in template renderer.

use crate::expr::{parse_expression, Expr, Value};
use crate::{TemplateError, TemplateEvaluator};
use std::collections::HashMap;
use std::fmt;

const OPEN_TAG: &str = "<%=";
const CLOSE_TAG: &str = "%>";

/// Environment variable lookup used by `ENV[...]` and `ENV.fetch(...)`.
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Renders `<%= expr %>` output tags against an environment lookup.
///
/// Literal text between tags is kept verbatim. Only output tags are
/// understood; any other `<%` tag is rejected.
pub struct ErbRenderer {
    env: EnvLookup,
}

impl fmt::Debug for ErbRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErbRenderer").finish_non_exhaustive()
    }
}

impl Default for ErbRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ErbRenderer {
    /// Renderer reading the process environment.
    pub fn new() -> Self {
        Self {
            env: Box::new(|name: &str| std::env::var(name).ok()),
        }
    }

    /// Renderer with a custom environment lookup.
    pub fn with_lookup(env: EnvLookup) -> Self {
        Self { env }
    }

    /// Renderer reading from a fixed map instead of the process environment.
    pub fn with_env(vars: HashMap<String, String>) -> Self {
        Self::with_lookup(Box::new(move |name: &str| vars.get(name).cloned()))
    }

    /// Evaluate a parsed expression.
    pub fn evaluate(&self, expr: &Expr) -> Result<Value, TemplateError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::EnvIndex(name) => {
                let name = self.env_name(name)?;
                Ok((self.env)(&name).map(Value::Str).unwrap_or(Value::Nil))
            }
            Expr::EnvFetch { name, default } => {
                let name = self.env_name(name)?;
                match ((self.env)(&name), default) {
                    (Some(value), _) => Ok(Value::Str(value)),
                    (None, Some(default)) => self.evaluate(default),
                    (None, None) => Err(TemplateError::MissingEnv(name)),
                }
            }
            Expr::MethodCall { receiver, method } => {
                let receiver = self.evaluate(receiver)?;
                call_method(receiver, method)
            }
            Expr::Add(lhs, rhs) => add(self.evaluate(lhs)?, self.evaluate(rhs)?),
        }
    }

    fn env_name(&self, expr: &Expr) -> Result<String, TemplateError> {
        match self.evaluate(expr)? {
            Value::Str(name) => Ok(name),
            other => Err(TemplateError::Type(format!(
                "environment variable name must be a string, got {}",
                other.type_name()
            ))),
        }
    }
}

impl TemplateEvaluator for ErbRenderer {
    fn render(&self, template: &str) -> Result<String, TemplateError> {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;
        let mut consumed = 0;

        while let Some(start) = rest.find("<%") {
            output.push_str(&rest[..start]);
            let tag_offset = consumed + start;
            let after_open = &rest[start..];
            if !after_open.starts_with(OPEN_TAG) {
                return Err(TemplateError::syntax(
                    tag_offset,
                    "only <%= ... %> output tags are supported",
                ));
            }

            let body_start = start + OPEN_TAG.len();
            let body_len = rest[body_start..]
                .find(CLOSE_TAG)
                .ok_or(TemplateError::UnterminatedTag(tag_offset))?;
            let body = &rest[body_start..body_start + body_len];

            let expr = parse_expression(body)?;
            let value = self.evaluate(&expr)?;
            tracing::trace!(expression = body.trim(), "rendered template expression");
            output.push_str(&value.to_string());

            let next = body_start + body_len + CLOSE_TAG.len();
            consumed += next;
            rest = &rest[next..];
        }

        output.push_str(rest);
        Ok(output)
    }
}

fn call_method(receiver: Value, method: &str) -> Result<Value, TemplateError> {
    match (method, receiver) {
        ("to_s", value) => Ok(Value::Str(value.to_string())),
        ("upcase", Value::Str(s)) => Ok(Value::Str(s.to_uppercase())),
        ("downcase", Value::Str(s)) => Ok(Value::Str(s.to_lowercase())),
        ("strip", Value::Str(s)) => Ok(Value::Str(s.trim().to_string())),
        ("to_i", Value::Str(s)) => Ok(Value::Int(leading_integer(&s))),
        ("to_i", Value::Int(i)) => Ok(Value::Int(i)),
        ("to_i", Value::Float(x)) => Ok(Value::Int(x.trunc() as i64)),
        ("to_i", Value::Nil) => Ok(Value::Int(0)),
        (method, receiver) => Err(TemplateError::UnknownMethod {
            method: method.to_string(),
            receiver: receiver.type_name().to_string(),
        }),
    }
}

/// Integer prefix of a string, 0 when there is none.
fn leading_integer(s: &str) -> i64 {
    let trimmed = s.trim_start();
    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        if c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+')) {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    trimmed[..end].parse().unwrap_or(0)
}

fn add(lhs: Value, rhs: Value) -> Result<Value, TemplateError> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(b)
            .map(Value::Int)
            .ok_or_else(|| TemplateError::Type("integer overflow".to_string())),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 + b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + b as f64)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (a, b) => Err(TemplateError::Type(format!(
            "cannot add {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}
