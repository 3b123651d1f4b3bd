//! Evaluator for `<%= ... %>` expressions embedded in deployment settings.
//!
//! Setting values may carry a template expression such as
//! `<%= ENV.fetch('DB_HOST', 'localhost') %>`. This crate locates the
//! expression inside a value and renders it through a [`TemplateEvaluator`].
//! [`ErbRenderer`] is the built-in evaluator; embedding applications can
//! supply their own.

mod error;
mod expr;
mod render;

pub use error::TemplateError;
pub use expr::{parse_expression, Expr, Value};
pub use render::{ErbRenderer, EnvLookup};

use regex_lite::Regex;
use std::sync::OnceLock;

/// Renders template text into its final string form.
pub trait TemplateEvaluator {
    /// Render `template`, replacing every `<%= expr %>` tag with the
    /// string form of the evaluated expression.
    fn render(&self, template: &str) -> Result<String, TemplateError>;
}

fn expression_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Greedy and line-bound: the match runs from the first `<%=` to the
    // last `%>` on that line.
    PATTERN.get_or_init(|| Regex::new(r"<%=.*%>").expect("static pattern is valid"))
}

/// Returns the first template expression found in `text`, if any.
pub fn first_expression(text: &str) -> Option<&str> {
    expression_pattern().find(text).map(|m| m.as_str())
}
