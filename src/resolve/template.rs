//! Named-placeholder URL templates
//!
//! ```ignore
//! let url = UrlTemplate::new("{endpoint}?token={token}&file={region}.csv.gz")
//!     .param("endpoint", "https://opencellid.org/ocid/downloads")
//!     .secret("token", token)
//!     .param("region", "310")
//!     .render()?;
//! ```
//!
//! Rendering fails when a placeholder has no value or a value has no
//! placeholder, so a typo in either surfaces before any request is made.

use crate::error::{ProvisionError, Result};

const REDACTED: &str = "***";

struct Binding {
    name: &'static str,
    value: String,
    secret: bool,
}

/// A URL with `{name}` placeholders and the values bound to them.
pub struct UrlTemplate {
    template: &'static str,
    bindings: Vec<Binding>,
}

/// A rendered URL and its printable form with secrets masked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedUrl {
    pub url: String,
    pub display: String,
}

enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

impl UrlTemplate {
    pub fn new(template: &'static str) -> Self {
        Self {
            template,
            bindings: Vec::new(),
        }
    }

    /// Bind a value that may appear in logs.
    pub fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.bindings.push(Binding {
            name,
            value: value.into(),
            secret: false,
        });
        self
    }

    /// Bind a value that must never be printed.
    pub fn secret(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.bindings.push(Binding {
            name,
            value: value.into(),
            secret: true,
        });
        self
    }

    pub fn render(&self) -> Result<RenderedUrl> {
        let segments = parse(self.template)?;

        for binding in &self.bindings {
            let used = segments
                .iter()
                .any(|seg| matches!(seg, Segment::Placeholder(name) if *name == binding.name));
            if !used {
                return Err(ProvisionError::Template(format!(
                    "parameter '{}' has no placeholder in '{}'",
                    binding.name, self.template
                )));
            }
        }

        let mut url = String::with_capacity(self.template.len());
        let mut display = String::with_capacity(self.template.len());
        for seg in segments {
            match seg {
                Segment::Literal(text) => {
                    url.push_str(text);
                    display.push_str(text);
                }
                Segment::Placeholder(name) => {
                    let binding = self
                        .bindings
                        .iter()
                        .find(|b| b.name == name)
                        .ok_or_else(|| {
                            ProvisionError::Template(format!(
                                "no value for placeholder '{{{}}}' in '{}'",
                                name, self.template
                            ))
                        })?;
                    url.push_str(&binding.value);
                    display.push_str(if binding.secret {
                        REDACTED
                    } else {
                        &binding.value
                    });
                }
            }
        }

        Ok(RenderedUrl { url, display })
    }
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while !rest.is_empty() {
        match rest.find(['{', '}']) {
            None => {
                segments.push(Segment::Literal(rest));
                break;
            }
            Some(idx) if rest[idx..].starts_with('}') => {
                return Err(ProvisionError::Template(format!(
                    "unmatched '}}' in '{}'",
                    template
                )));
            }
            Some(idx) => {
                if idx > 0 {
                    segments.push(Segment::Literal(&rest[..idx]));
                }
                let after = &rest[idx + 1..];
                let end = after.find('}').ok_or_else(|| {
                    ProvisionError::Template(format!("unterminated placeholder in '{}'", template))
                })?;
                let name = &after[..end];
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Err(ProvisionError::Template(format!(
                        "invalid placeholder '{{{}}}' in '{}'",
                        name, template
                    )));
                }
                segments.push(Segment::Placeholder(name));
                rest = &after[end + 1..];
            }
        }
    }

    Ok(segments)
}
