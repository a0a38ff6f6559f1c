//! Comparison manifest formatting

use std::fmt;

use serde::Serialize;

/// Header used when the sources are not named
const PLACEHOLDER_HEADER: &str = "set,these,manually";

/// Ordered list of uploaded image links, in upload order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    links: Vec<String>,
    sources: Vec<String>,
}

impl Manifest {
    /// Create an empty manifest with the placeholder header
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty manifest whose header names the compared sources
    pub fn with_sources(sources: Vec<String>) -> Self {
        Self {
            links: Vec::new(),
            sources,
        }
    }

    /// Append a link
    pub fn push(&mut self, link: impl Into<String>) {
        self.links.push(link.into());
    }

    /// Links in upload order
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Number of links
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// True when nothing was uploaded
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Render the comparison block, one link per line
    pub fn render(&self) -> String {
        let header = if self.sources.is_empty() {
            PLACEHOLDER_HEADER.to_string()
        } else {
            self.sources.join(", ")
        };

        let mut out = format!("[comparison={}]\n", header);
        for link in &self.links {
            out.push_str(link);
            out.push('\n');
        }
        out.push_str("[/comparison]\n");
        out
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
