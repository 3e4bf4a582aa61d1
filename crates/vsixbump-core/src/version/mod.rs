//! Four-part manifest version arithmetic.
//!
//! VSIX manifests carry versions of the form `major.minor.build.revision`.
//! Only the last component is ever touched; the first three are passed
//! through as written, leading zeros included.

use thiserror::Error;

/// Number of dot-separated components in a manifest version.
pub const COMPONENTS: usize = 4;

/// Errors from version operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The string is not four dot-separated non-negative integers.
    #[error("invalid manifest version {version:?}: {reason}")]
    Format {
        /// The offending version string.
        version: String,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Increment the last component of an `a.b.c.d` version.
///
/// ```
/// use vsixbump_core::version::increment_version;
///
/// assert_eq!(increment_version("1.0.0.4").unwrap(), "1.0.0.5");
/// assert_eq!(increment_version("2.1.0.9").unwrap(), "2.1.0.10");
/// ```
///
/// # Errors
///
/// Returns [`VersionError::Format`] if the string does not have exactly four
/// components of ASCII digits. Components have no size limit.
pub fn increment_version(version: &str) -> VersionResult<String> {
    let format_error = |reason| VersionError::Format {
        version: version.to_string(),
        reason,
    };

    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() != COMPONENTS {
        return Err(format_error("expected four dot-separated components"));
    }
    if parts
        .iter()
        .any(|part| part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(format_error("components must be non-negative integers"));
    }

    let (last, prefix) = parts
        .split_last()
        .ok_or_else(|| format_error("expected four dot-separated components"))?;

    let mut bumped = prefix.join(".");
    bumped.push('.');
    bumped.push_str(&increment_digits(last));
    Ok(bumped)
}

/// Add one to a string of ASCII digits, with no upper bound.
///
/// Leading zeros are dropped, so `"007"` becomes `"8"`.
fn increment_digits(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    let mut out: Vec<u8> = trimmed.bytes().collect();

    let mut carry = true;
    for digit in out.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            carry = false;
            break;
        }
    }
    if carry {
        out.insert(0, b'1');
    }

    out.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bumps_last_component() {
        assert_eq!(increment_version("1.0.0.4").unwrap(), "1.0.0.5");
    }

    #[test]
    fn carries_into_more_digits() {
        assert_eq!(increment_version("2.1.0.9").unwrap(), "2.1.0.10");
        assert_eq!(increment_version("0.0.0.99").unwrap(), "0.0.0.100");
    }

    #[test]
    fn prefix_passes_through_unchanged() {
        for (prefix, last) in [("0.0.0", 0_u64), ("10.200.3000", 41), ("01.02.03", 7)] {
            let bumped = increment_version(&format!("{prefix}.{last}")).unwrap();
            assert_eq!(bumped, format!("{prefix}.{}", last + 1));
        }
    }

    #[test]
    fn leading_zeros_in_last_component_are_normalized() {
        assert_eq!(increment_version("1.0.0.007").unwrap(), "1.0.0.8");
    }

    #[test]
    fn rejects_wrong_component_count() {
        assert!(matches!(
            increment_version("1.0.4"),
            Err(VersionError::Format { .. })
        ));
        assert!(increment_version("1.0.0.0.4").is_err());
        assert!(increment_version("").is_err());
    }

    #[test]
    fn rejects_non_numeric_components() {
        assert!(increment_version("1.0.0.x").is_err());
        assert!(increment_version("1.a.0.4").is_err());
        assert!(increment_version("1.0.0.-4").is_err());
        assert!(increment_version("1.0..4").is_err());
    }

    #[test]
    fn last_component_has_no_size_limit() {
        assert_eq!(
            increment_version("1.0.0.99999999999999999999").unwrap(),
            "1.0.0.100000000000000000000"
        );
        let beyond_u64 = format!("1.0.0.{}", u64::MAX);
        assert_eq!(
            increment_version(&beyond_u64).unwrap(),
            "1.0.0.18446744073709551616"
        );
    }

    #[test]
    fn zero_and_all_zero_components() {
        assert_eq!(increment_version("1.0.0.0").unwrap(), "1.0.0.1");
        assert_eq!(increment_version("1.0.0.000").unwrap(), "1.0.0.1");
        assert_eq!(increment_version("1.0.0.0099").unwrap(), "1.0.0.100");
    }
}
