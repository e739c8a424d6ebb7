use crate::error::{BuildError, Result};
use crate::types::version::VersionTriple;
use crate::utils::logger::{LogLevel, Logger};

/// Sentinel numeric version meaning "derive it from the version string".
pub const UNSET_VERSION_NUMBER: &str = "0.0.0";

/// Three dot-separated, non-empty, all-digit components. Purely syntactic:
/// components of any magnitude are accepted.
pub fn is_numeric_triple(version: &str) -> bool {
    let parts = version.split('.').collect::<Vec<_>>();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

/// Parses a numeric triple into integers. `None` for other shapes and for
/// components that do not fit in a `u64`.
pub fn parse_strict(version: &str) -> Option<VersionTriple> {
    if !is_numeric_triple(version) {
        return None;
    }
    let mut nums = [0u64; 3];
    for (slot, part) in nums.iter_mut().zip(version.split('.')) {
        *slot = part.parse::<u64>().ok()?;
    }
    Some(VersionTriple::new(nums[0], nums[1], nums[2]))
}

/// Checks a caller-supplied numeric version: the sentinel or a numeric triple.
pub fn validate_version_number(version_number: &str) -> Result<()> {
    if version_number == UNSET_VERSION_NUMBER || is_numeric_triple(version_number) {
        Ok(())
    } else {
        Err(BuildError::InvalidVersionNumber(version_number.to_string()))
    }
}

/// Parses a host compatibility version leniently. `2024.1` means `2024.1.0`
/// and a missing value means `0.0.0`. Anything unparseable is logged and
/// read as `0.0.0`.
pub fn parse_compat(field: &str, version: Option<&str>) -> VersionTriple {
    let Some(raw) = version.map(str::trim).filter(|v| !v.is_empty()) else {
        return VersionTriple::default();
    };

    let parts = raw
        .split('.')
        .map(|s| s.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()
        .filter(|p| (1..=3).contains(&p.len()));

    match parts {
        Some(p) => VersionTriple::new(
            p[0],
            p.get(1).copied().unwrap_or(0),
            p.get(2).copied().unwrap_or(0),
        ),
        None => {
            Logger::new().log_message(
                LogLevel::Warning,
                &format!("Unparseable {} '{}', using 0.0.0", field, raw),
            );
            VersionTriple::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_accepts_three_numeric_parts() {
        assert_eq!(parse_strict("1.2.3"), Some(VersionTriple::new(1, 2, 3)));
        assert_eq!(
            parse_strict("20240105.0.0"),
            Some(VersionTriple::new(20240105, 0, 0))
        );
    }

    #[test]
    fn strict_rejects_other_shapes() {
        for bad in ["1.2", "1.2.3.4", "1.2.x", "2024.dev", "", "1..3", "1.2.-3", "1.2.+3"] {
            assert_eq!(parse_strict(bad), None, "{bad} should be rejected");
        }
    }

    #[test]
    fn version_number_validation() {
        assert!(validate_version_number("0.0.0").is_ok());
        assert!(validate_version_number("3.10.42").is_ok());
        for bad in ["1.0", "v1.0.0", "1.0.0-beta", "latest"] {
            assert!(matches!(
                validate_version_number(bad),
                Err(BuildError::InvalidVersionNumber(v)) if v == bad
            ));
        }
    }

    #[test]
    fn huge_numeric_components_are_valid_version_numbers() {
        let huge = "18446744073709551616.0.0";
        assert!(is_numeric_triple(huge));
        assert!(validate_version_number(huge).is_ok());
        assert!(validate_version_number("99999999999999999999999.1.2").is_ok());
        assert_eq!(parse_strict(huge), None);
    }

    #[test]
    fn compat_versions_are_lenient() {
        assert_eq!(
            parse_compat("minimum", Some("2019.3")),
            VersionTriple::new(2019, 3, 0)
        );
        assert_eq!(
            parse_compat("minimum", Some("2024.4.1")),
            VersionTriple::new(2024, 4, 1)
        );
        assert_eq!(parse_compat("minimum", Some("2024")), VersionTriple::new(2024, 0, 0));
        assert_eq!(parse_compat("minimum", None), VersionTriple::default());
        assert_eq!(parse_compat("minimum", Some("  ")), VersionTriple::default());
    }

    #[test]
    fn unparseable_compat_versions_read_as_zero() {
        for raw in ["2024.beta", "next", "1.2.3.4", "2024..1"] {
            assert_eq!(
                parse_compat("lastTested", Some(raw)),
                VersionTriple::default(),
                "{raw}"
            );
        }
    }
}
