//! Storage endpoint templates
//!
//! A Spaces endpoint is configured as a string such as
//! `https://{{.Region}}.digitaloceanspaces.com`. The template is compiled once
//! when the client is built and rendered for each region on demand.
//!
//! Only the `Region` placeholder exists. It may be written `{{.Region}}`,
//! `{{ .Region }}` or `{{Region}}`; anything else between double braces is
//! rejected at parse time.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Regex for matching template actions: {{ ... }}
static ACTION_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").unwrap());

/// Name of the only supported placeholder
const REGION: &str = "Region";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Region,
}

/// Compiled storage endpoint template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl EndpointTemplate {
    /// Compile a template string
    pub fn parse(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Err(Error::template(source, "template is empty"));
        }

        let mut segments = Vec::new();
        let mut last = 0;

        for cap in ACTION_REGEX.captures_iter(source) {
            let (Some(whole), Some(inner)) = (cap.get(0), cap.get(1)) else {
                continue;
            };

            push_literal(&mut segments, source, &source[last..whole.start()])?;

            let name = inner.as_str().trim();
            if name.strip_prefix('.').unwrap_or(name) != REGION {
                return Err(Error::template(
                    source,
                    format!("unknown placeholder '{name}', only {{{{.Region}}}} is supported"),
                ));
            }
            segments.push(Segment::Region);
            last = whole.end();
        }

        push_literal(&mut segments, source, &source[last..])?;

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Render the endpoint for a region. The region is lowercased first, so
    /// `NYC3` and `nyc3` produce the same endpoint.
    pub fn render(&self, region: &str) -> String {
        let region = region.to_lowercase();
        let mut out = String::with_capacity(self.source.len() + region.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Region => out.push_str(&region),
            }
        }
        out
    }

    /// The template string as configured
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the rendered endpoint depends on the region at all
    pub fn has_region(&self) -> bool {
        self.segments.contains(&Segment::Region)
    }
}

impl fmt::Display for EndpointTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn push_literal(segments: &mut Vec<Segment>, source: &str, text: &str) -> Result<()> {
    if text.contains("{{") {
        return Err(Error::template(source, "unclosed action"));
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_string()));
    }
    Ok(())
}
