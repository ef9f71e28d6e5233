//! netstate engine - snapshot comparison
//!
//! Pairs the command results of two snapshots by position and diffs each
//! configured command as a keyed outer join over its table rows.

pub mod compare;
pub mod diff;

pub use compare::{ExactComparator, RowComparator};
pub use diff::{diff, diff_tables, CommandDiffError, DiffEngine, Side};
