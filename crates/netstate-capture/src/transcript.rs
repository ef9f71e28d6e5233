//! Transcript files
//!
//! Reads plain or gzip-compressed captures, sniffs the device vendor from the
//! first lines and renders device replies back into a transcript that the
//! default boundary pattern segments again.

use crate::device::CommandOutput;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Transcript read errors
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Failed to read transcript {0}: {1}")]
    IoError(String, String),

    #[error("Failed to decompress transcript {0}: {1}")]
    DecompressError(String, String),

    #[error("Transcript {0} is not valid UTF-8")]
    InvalidUtf8(String),
}

fn is_gzip(path: &Path, bytes: &[u8]) -> bool {
    path.extension().is_some_and(|ext| ext == "gz") || bytes.starts_with(&GZIP_MAGIC)
}

/// Read a transcript, decompressing `.gz` files
pub fn read_transcript(path: &Path) -> Result<String, TranscriptError> {
    let name = path.display().to_string();
    let bytes =
        std::fs::read(path).map_err(|e| TranscriptError::IoError(name.clone(), e.to_string()))?;

    if !is_gzip(path, &bytes) {
        return String::from_utf8(bytes).map_err(|_| TranscriptError::InvalidUtf8(name));
    }

    let mut text = String::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_string(&mut text)
        .map_err(|e| TranscriptError::DecompressError(name.clone(), e.to_string()))?;

    tracing::debug!(path = %name, bytes = text.len(), "decompressed transcript");
    Ok(text)
}

/// First vendor signature seen in the first `sniff_lines` lines
pub fn sniff_vendor<'s>(
    text: &str,
    signatures: &'s [String],
    sniff_lines: usize,
) -> Option<&'s str> {
    text.lines().take(sniff_lines).find_map(|line| {
        signatures
            .iter()
            .find(|signature| line.contains(signature.as_str()))
            .map(String::as_str)
    })
}

/// Header line written before each command's output
fn header_line(command: &str) -> String {
    format!("--------------- {} -------------", command)
}

/// Render replies as a text backup, one header per command
pub fn render_transcript(outputs: &[CommandOutput]) -> String {
    let mut text = String::new();
    for reply in outputs {
        text.push_str(&header_line(&reply.command));
        text.push('\n');
        if !reply.output.is_empty() {
            text.push_str(reply.output.trim_end_matches('\n'));
            text.push('\n');
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Encoding;
    use crate::segment::Segmenter;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use netstate_core::config::DEFAULT_BOUNDARY_PATTERN;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    fn reply(command: &str, output: &str) -> CommandOutput {
        CommandOutput {
            command: command.to_string(),
            encoding: Encoding::Text,
            output: output.to_string(),
        }
    }

    #[test]
    fn reads_plain_and_gzip() {
        let dir = TempDir::new().unwrap();
        let text = "------------- show clock -------------\nnow\n";

        let plain = dir.path().join("show-tech.txt");
        std::fs::write(&plain, text).unwrap();
        assert_eq!(read_transcript(&plain).unwrap(), text);

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let gz = dir.path().join("show-tech.txt.gz");
        std::fs::write(&gz, &compressed).unwrap();
        assert_eq!(read_transcript(&gz).unwrap(), text);

        // magic bytes are enough without the extension
        let renamed = dir.path().join("show-tech.log");
        std::fs::write(&renamed, &compressed).unwrap();
        assert_eq!(read_transcript(&renamed).unwrap(), text);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_transcript(Path::new("/nonexistent/show-tech")).unwrap_err();
        assert!(matches!(err, TranscriptError::IoError(..)));
    }

    #[test]
    fn sniffs_vendor_within_window() {
        let signatures = vec!["Arista DCS-".to_string()];
        let text = "------------- show version -------------\nArista DCS-7050QX-32\n";

        assert_eq!(sniff_vendor(text, &signatures, 50), Some("Arista DCS-"));
        assert_eq!(sniff_vendor(text, &signatures, 1), None);
        assert_eq!(sniff_vendor("Cisco IOS", &signatures, 50), None);
    }

    #[test]
    fn rendered_backup_segments_again() {
        let outputs = vec![
            reply("show clock", "now\n"),
            reply("show ip route", ""),
            reply("show version", "Arista DCS-7050\n4.18.1F"),
        ];

        let text = render_transcript(&outputs);
        let sections = Segmenter::new(DEFAULT_BOUNDARY_PATTERN)
            .unwrap()
            .segment_text(&text)
            .unwrap();

        let commands: Vec<&str> = sections.iter().map(|s| s.command.as_str()).collect();
        assert_eq!(commands, vec!["show clock", "show ip route", "show version"]);
        assert_eq!(sections[0].text(), "now");
        assert!(sections[1].is_empty());
        assert_eq!(sections[2].text(), "Arista DCS-7050\n4.18.1F");
    }
}
