//! Per-command text blocks cut from a captured transcript

use serde::{Deserialize, Serialize};

/// One command's raw text block plus its position in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Position in the transcript, strictly increasing from 0
    pub order_index: usize,

    /// Command captured from the boundary line (never empty)
    pub command: String,

    /// The boundary line that opened this section, verbatim
    pub boundary: String,

    /// Body lines between this boundary and the next one
    pub raw_text: Vec<String>,
}

impl Section {
    /// Body lines joined with newlines
    pub fn text(&self) -> String {
        self.raw_text.join("\n")
    }

    pub fn line_count(&self) -> usize {
        self.raw_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_text.is_empty()
    }
}

/// Rebuild the transcript lines: each boundary line followed by its body
///
/// Lines before the first boundary belong to no section and are not
/// rebuilt. The result equals the segmented input only when that input
/// starts with a boundary line; otherwise it equals the input from its first
/// boundary on.
pub fn reassemble(sections: &[Section]) -> Vec<&str> {
    let mut lines = Vec::new();
    for section in sections {
        lines.push(section.boundary.as_str());
        lines.extend(section.raw_text.iter().map(String::as_str));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassemble_interleaves_boundaries() {
        let sections = vec![
            Section {
                order_index: 0,
                command: "show version".into(),
                boundary: "--- show version ---".into(),
                raw_text: vec!["Arista DCS-7050".into()],
            },
            Section {
                order_index: 1,
                command: "show clock".into(),
                boundary: "--- show clock ---".into(),
                raw_text: vec![],
            },
        ];

        assert_eq!(
            reassemble(&sections),
            vec!["--- show version ---", "Arista DCS-7050", "--- show clock ---"]
        );
        assert_eq!(sections[0].text(), "Arista DCS-7050");
        assert!(sections[1].is_empty());
    }
}
