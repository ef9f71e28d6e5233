//! Capture side of netstate
//!
//! Turns raw device output into snapshots: transcript reading and
//! segmentation, the table parser seam, the device query seam and snapshot
//! building. Interface name matching lives here too since it works on the
//! same raw identifiers.
//!
//! ## Example
//!
//! ```rust,ignore
//! use netstate_capture::{RegexTableParser, Segmenter, SnapshotBuilder};
//!
//! let sections = Segmenter::new(DEFAULT_BOUNDARY_PATTERN)?.segment_text(&text)?;
//! let parser = RegexTableParser::from_config(&config)?;
//! let snapshot = SnapshotBuilder::new(&parser, &config.vendor).build("carcore3", &sections);
//! ```

pub mod segment;
pub mod parser;
pub mod interface;
pub mod device;
pub mod builder;
pub mod transcript;

pub use segment::{Segmenter, SegmentError};
pub use parser::{ParseMiss, RegexTableParser, TableParser};
pub use interface::{equivalence, find_equivalent, split_name, InterfaceNameError};
pub use device::{CommandOutput, DeviceError, DeviceQuery, Encoding, ReplayDevice};
pub use builder::SnapshotBuilder;
pub use transcript::{read_transcript, render_transcript, sniff_vendor, TranscriptError};
