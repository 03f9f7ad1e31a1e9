//! Console rendering: human-readable text, or one JSON object on stdout.

use actfind::core::{Error, Presentation, Query, Result};
use std::fmt::Display;
use std::io::{self, Write};

const RULE_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Error::Input(format!(
                "unknown output format {other:?} (expected text|json)"
            ))),
        }
    }
}

/// A failed write to the console, e.g. a closed pipe.
pub fn output_error(e: io::Error) -> Error {
    Error::Io(format!("writing output: {e}"))
}

/// Write one line and flush.
pub fn write_line(out: &mut impl Write, line: impl Display) -> Result<()> {
    writeln!(out, "{line}")
        .and_then(|()| out.flush())
        .map_err(output_error)
}

/// Render search results. Paragraph numbers are 1-based in text output.
pub fn write_text(out: &mut impl Write, shown: &Presentation<'_>) -> Result<()> {
    write_presentation(out, shown)
        .and_then(|()| out.flush())
        .map_err(output_error)
}

fn write_presentation(out: &mut impl Write, shown: &Presentation<'_>) -> io::Result<()> {
    let groups = match shown {
        Presentation::NoMatches => return writeln!(out, "No matches found."),
        Presentation::Groups(groups) => groups,
    };

    let rule = "=".repeat(RULE_WIDTH);
    writeln!(
        out,
        "\nFound {} matching paragraph(s). Showing results:\n",
        groups.len()
    )?;
    for (count, group) in groups.iter().enumerate() {
        writeln!(out, "{rule}")?;
        writeln!(
            out,
            "Match {} (paragraph {}):",
            count + 1,
            group.match_position + 1
        )?;
        writeln!(out, "{rule}")?;
        for line in &group.lines {
            writeln!(
                out,
                "\n[{}] Paragraph {}:",
                line.label.as_str(),
                line.position + 1
            )?;
            writeln!(out, "{}", line.text)?;
        }
        writeln!(out, "\n")?;
    }
    Ok(())
}

/// Search results as a JSON value. Positions are 0-based.
pub fn search_json(
    query: &Query,
    paragraphs: usize,
    matches: &[usize],
    shown: &Presentation<'_>,
) -> serde_json::Value {
    serde_json::json!({
        "schema_version": 1,
        "kind": "search",
        "ok": true,
        "query": query.as_str(),
        "paragraphs": paragraphs,
        "matches": matches,
        "result": shown,
    })
}

/// JSON for a document that produced no searchable paragraphs.
pub fn no_content_json() -> serde_json::Value {
    serde_json::json!({
        "schema_version": 1,
        "kind": "search",
        "ok": true,
        "paragraphs": 0,
        "matches": [],
        "result": { "kind": "no_content" },
    })
}
