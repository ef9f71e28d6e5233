//! Interface name equivalence
//!
//! Devices print the same interface in long and short forms
//! (`Ethernet1/2`, `Et1/2`, `Eth1/2`). Two names are treated as the same
//! interface when their numeric remainders are identical and one alphabetic
//! prefix occurs inside the other.
//!
//! The containment check is unanchored and order-insensitive, so prefixes
//! that merely share a substring (`net1` vs `Ethernet1`) also match.
//! Callers that need stricter matching should compare prefixes themselves.

/// Interface name errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterfaceNameError {
    #[error("Interface name '{0}' contains no digit")]
    NoDigit(String),
}

/// Split a name at its first digit into (prefix, remainder)
pub fn split_name(name: &str) -> Result<(&str, &str), InterfaceNameError> {
    let at = name
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| InterfaceNameError::NoDigit(name.to_string()))?;

    Ok(name.split_at(at))
}

/// Check whether two names refer to the same interface
pub fn equivalence(a: &str, b: &str) -> Result<bool, InterfaceNameError> {
    let (prefix_a, rest_a) = split_name(a)?;
    let (prefix_b, rest_b) = split_name(b)?;

    let equivalent =
        rest_a == rest_b && (prefix_a.contains(prefix_b) || prefix_b.contains(prefix_a));
    if equivalent {
        tracing::trace!(a, b, "interface names match");
    }
    Ok(equivalent)
}

/// First candidate naming the same interface as `name`
///
/// Candidates without a digit are skipped.
pub fn find_equivalent<'c, I>(
    name: &str,
    candidates: I,
) -> Result<Option<&'c str>, InterfaceNameError>
where
    I: IntoIterator<Item = &'c str>,
{
    // fail fast on a malformed query name
    split_name(name)?;

    Ok(candidates
        .into_iter()
        .find(|candidate| equivalence(name, candidate).unwrap_or(false)))
}
