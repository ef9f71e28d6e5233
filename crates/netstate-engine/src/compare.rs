//! Check column comparison

/// Decides whether two values of one check column are the same
///
/// Register one on a [`crate::DiffEngine`] to relax comparison for a command,
/// for example to treat long and short interface names as equal.
pub trait RowComparator: Send + Sync {
    fn equal(&self, column: &str, old: &str, new: &str) -> bool;
}

/// Exact string comparison; an empty value never equals a present one
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactComparator;

impl RowComparator for ExactComparator {
    fn equal(&self, _column: &str, old: &str, new: &str) -> bool {
        old == new
    }
}

impl<F> RowComparator for F
where
    F: Fn(&str, &str, &str) -> bool + Send + Sync,
{
    fn equal(&self, column: &str, old: &str, new: &str) -> bool {
        self(column, old, new)
    }
}
