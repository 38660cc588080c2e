//! Markdown and template rendering.
//!
//! Every post renders through one shared template document. The post's
//! Markdown body is converted to HTML and merged into the field map under
//! the distinct `contentHtml` key, so the template can reach both the raw
//! source and the converted markup.

use std::path::Path;

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use serde_json::Value;

use crate::models::Post;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern")
});

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to read page template: {0}")]
    Template(#[source] std::io::Error),

    #[error("template references missing field `{0}`")]
    MissingField(String),
}

pub struct Renderer {
    template: String,
}

impl Renderer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let template = std::fs::read_to_string(path).map_err(RenderError::Template)?;
        Ok(Self { template })
    }

    /// Produce the full page text for one post.
    ///
    /// Fails when the template references a field the post does not carry;
    /// the error names the offending placeholder.
    pub fn render(&self, post: &Post) -> Result<String, RenderError> {
        let mut fields = post.field_map();
        fields.insert(
            "contentHtml".to_string(),
            Value::String(markdown_to_html(&post.content_md)),
        );

        let mut out = String::with_capacity(self.template.len());
        let mut last = 0;
        for placeholder in PLACEHOLDER.find_iter(&self.template) {
            let key = placeholder
                .as_str()
                .trim_start_matches("{{")
                .trim_end_matches("}}")
                .trim();
            let value = fields
                .get(key)
                .ok_or_else(|| RenderError::MissingField(key.to_string()))?;

            out.push_str(&self.template[last..placeholder.start()]);
            push_value(&mut out, value);
            last = placeholder.end();
        }
        out.push_str(&self.template[last..]);
        Ok(out)
    }
}

/// Convert Markdown to HTML with default options; nothing in the input is
/// executed.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::empty());
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(text) => out.push_str(text),
        other => out.push_str(&other.to_string()),
    }
}
