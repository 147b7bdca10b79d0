use crate::consts::DEFAULT_TITLE_FALLBACK;
use crate::frame::Header;

#[derive(Clone, Debug, PartialEq)]
pub enum TitleSegment {
    Text(String),
    /// Header keyword, substituted by `fallback` when absent.
    Field { key: String, fallback: String },
}

/// Figure title built from literal text and header lookups.
///
/// The text form writes fields as `{KEY}` or `{KEY|fallback}`; `{{` and `}}`
/// are literal braces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TitleTemplate {
    segments: Vec<TitleSegment>,
}

impl TitleTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(TitleSegment::Text(text.into()));
        self
    }

    pub fn field(mut self, key: impl Into<String>, fallback: impl Into<String>) -> Self {
        self.segments.push(TitleSegment::Field {
            key: key.into(),
            fallback: fallback.into(),
        });
        self
    }

    pub fn parse(template: &str) -> Self {
        let mut out = Self::new();
        let mut text = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    text.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    text.push('}');
                }
                '{' => {
                    let body: String = chars.by_ref().take_while(|&c| c != '}').collect();
                    if !text.is_empty() {
                        out = out.text(std::mem::take(&mut text));
                    }
                    let (key, fallback) = match body.split_once('|') {
                        Some((k, f)) => (k.trim(), f),
                        None => (body.trim(), DEFAULT_TITLE_FALLBACK),
                    };
                    out = out.field(key, fallback);
                }
                _ => text.push(c),
            }
        }
        if !text.is_empty() {
            out = out.text(text);
        }
        out
    }

    pub fn segments(&self) -> &[TitleSegment] {
        &self.segments
    }

    /// Ordered (field name, fallback) pairs.
    pub fn fields(&self) -> Vec<(&str, &str)> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                TitleSegment::Field { key, fallback } => Some((key.as_str(), fallback.as_str())),
                TitleSegment::Text(_) => None,
            })
            .collect()
    }

    pub fn render(&self, header: &Header) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                TitleSegment::Text(t) => t.clone(),
                TitleSegment::Field { key, fallback } => header.get_or(key, fallback),
            })
            .collect()
    }
}
