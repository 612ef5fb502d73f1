//! Page templates compiled into the binary.
//!
//! Placeholders are written `{{ key }}`. Values added with
//! [`Context::text`] are HTML-escaped; unknown placeholders render empty.

use std::collections::HashMap;

const LAYOUT: &str = include_str!("../../templates/layout.html");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Main,
    About,
    Contact,
    Pmb,
}

impl Page {
    fn source(self) -> &'static str {
        match self {
            Self::Main => include_str!("../../templates/main.html"),
            Self::About => include_str!("../../templates/about.html"),
            Self::Contact => include_str!("../../templates/contact.html"),
            Self::Pmb => include_str!("../../templates/pmb.html"),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Main => "Home",
            Self::About => "About",
            Self::Contact => "Contact",
            Self::Pmb => "PMB",
        }
    }
}

#[derive(Debug, Default)]
pub struct Context {
    values: HashMap<&'static str, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, key: &'static str, value: impl AsRef<str>) -> Self {
        self.values.insert(key, escape_html(value.as_ref()));
        self
    }

    /// Inserts markup verbatim. Callers escape any user input inside it.
    pub fn html(mut self, key: &'static str, fragment: String) -> Self {
        self.values.insert(key, fragment);
        self
    }
}

pub fn render(page: Page, context: Context) -> String {
    let content = fill(page.source(), &context.values);
    let layout = Context::new().text("title", page.title()).html("content", content);
    fill(LAYOUT, &layout.values)
}

fn fill(template: &str, values: &HashMap<&'static str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                if let Some(value) = values.get(key) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            // Keeps user text from forming placeholders in the layout pass.
            '{' => out.push_str("&#123;"),
            _ => out.push(ch),
        }
    }
    out
}
