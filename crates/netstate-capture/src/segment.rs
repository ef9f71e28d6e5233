//! Transcript segmentation
//!
//! Splits one long captured transcript into per-command sections. A boundary
//! line both closes the section before it and opens the next one; it never
//! lands in either section's body.

use netstate_core::Section;
use regex::Regex;

/// Segmentation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    #[error("Invalid boundary pattern: {0}")]
    InvalidPattern(String),

    #[error("Boundary pattern never matched any of {lines} lines")]
    NoBoundary { lines: usize },

    #[error("Boundary on line {line} captured an empty command name")]
    EmptyCommand { line: usize },
}

enum State<'a> {
    Idle,
    InSection {
        command: String,
        boundary: &'a str,
        buffer: Vec<String>,
    },
}

/// Splits transcripts on a boundary pattern
#[derive(Debug, Clone)]
pub struct Segmenter {
    boundary: Regex,
}

impl Segmenter {
    /// Compile a segmenter from a boundary regex
    pub fn new(pattern: &str) -> Result<Self, SegmentError> {
        let boundary =
            Regex::new(pattern).map_err(|e| SegmentError::InvalidPattern(e.to_string()))?;
        Ok(Self { boundary })
    }

    /// Segmenter for a configuration's boundary pattern
    pub fn from_config(config: &netstate_core::SegmentConfig) -> Result<Self, SegmentError> {
        Self::new(&config.boundary)
    }

    pub fn pattern(&self) -> &str {
        self.boundary.as_str()
    }

    /// Segment a whole transcript
    pub fn segment_text(&self, text: &str) -> Result<Vec<Section>, SegmentError> {
        let lines: Vec<&str> = text.lines().collect();
        segment(&lines, &self.boundary)
    }

    /// Segment pre-split lines
    pub fn segment(&self, lines: &[&str]) -> Result<Vec<Section>, SegmentError> {
        segment(lines, &self.boundary)
    }
}

/// Command named by a boundary match, or `None` if the line is not a boundary
///
/// The pattern has to match at the first character of the line. The command
/// comes from the `command` group, else group 1, else the whole match.
fn boundary_command<'l>(boundary: &Regex, line: &'l str) -> Option<&'l str> {
    let caps = boundary.captures(line)?;
    let whole = caps.get(0)?;
    if whole.start() != 0 {
        return None;
    }

    let command = caps
        .name("command")
        .or_else(|| caps.get(1))
        .unwrap_or(whole);

    Some(command.as_str().trim())
}

/// Split lines into ordered sections
///
/// Lines before the first boundary are skipped. The final section is closed
/// at end of input; no trailing boundary is needed.
pub fn segment(lines: &[&str], boundary: &Regex) -> Result<Vec<Section>, SegmentError> {
    let mut sections = Vec::new();
    let mut state = State::Idle;
    let mut preamble = 0usize;

    for (i, &line) in lines.iter().enumerate() {
        match boundary_command(boundary, line) {
            Some(command) => {
                if command.is_empty() {
                    return Err(SegmentError::EmptyCommand { line: i + 1 });
                }

                // the same line closes the open section and opens the next
                if let State::InSection { command: open, boundary: opened_by, buffer } =
                    std::mem::replace(&mut state, State::Idle)
                {
                    close(&mut sections, open, opened_by, buffer);
                }

                state = State::InSection {
                    command: command.to_string(),
                    boundary: line,
                    buffer: Vec::new(),
                };
            }
            None => match &mut state {
                State::Idle => preamble += 1,
                State::InSection { buffer, .. } => buffer.push(line.to_string()),
            },
        }
    }

    if let State::InSection { command, boundary, buffer } = state {
        close(&mut sections, command, boundary, buffer);
    }

    if sections.is_empty() {
        return Err(SegmentError::NoBoundary { lines: lines.len() });
    }

    tracing::debug!(sections = sections.len(), preamble, "segmented transcript");
    Ok(sections)
}

fn close(sections: &mut Vec<Section>, command: String, boundary: &str, buffer: Vec<String>) {
    tracing::trace!(command = %command, lines = buffer.len(), "closing section");
    sections.push(Section {
        order_index: sections.len(),
        command,
        boundary: boundary.to_string(),
        raw_text: buffer,
    });
}
