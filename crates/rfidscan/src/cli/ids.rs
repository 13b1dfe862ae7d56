//! `--id` parsing and target resolution.

use super::{DeviceSelector, Registry, Result, RfidscanError};

/// Parsed `--id` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IdSelection {
    All,
    /// Scanners in the order given.
    List(Vec<DeviceSelector>),
}

/// Parse `"all"` or a list of ids separated by commas or spaces.
///
/// A token of exactly 8 characters is a serial number in hex. Other tokens
/// are decimal or `0x`-prefixed hex.
pub(super) fn parse_ids(s: &str) -> Result<IdSelection> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("all") {
        return Ok(IdSelection::All);
    }
    let ids = s
        .split([',', ' '])
        .filter(|t| !t.is_empty())
        .map(parse_id)
        .collect::<Result<Vec<_>>>()?;
    if ids.is_empty() {
        return Err(RfidscanError::Parse("No scanner id given".into()));
    }
    log::debug!("selected ids: {ids:?}");
    Ok(IdSelection::List(ids))
}

fn parse_id(token: &str) -> Result<DeviceSelector> {
    let invalid = || RfidscanError::Parse(format!("Invalid scanner id: {token:?}"));
    if token.len() == 8 {
        if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        return Ok(DeviceSelector::BySerial(token.to_ascii_uppercase()));
    }
    let (digits, radix) = match token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (token, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }
    let id = u32::from_str_radix(digits, radix).map_err(|_| invalid())?;
    Ok(DeviceSelector::from_legacy_id(id))
}

/// Scanners a session works on.
///
/// Without `--id`, a configured serial wins over "every scanner".
pub(super) fn resolve_targets(
    registry: &Registry,
    ids: Option<&IdSelection>,
    preferred_serial: &str,
) -> Vec<DeviceSelector> {
    match ids {
        Some(IdSelection::List(selectors)) => selectors.clone(),
        None if !preferred_serial.is_empty() => {
            vec![DeviceSelector::BySerial(preferred_serial.to_string())]
        }
        Some(IdSelection::All) | None => {
            (0..registry.count()).map(DeviceSelector::ByIndex).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfidscan_lib::transport::mock::MockTransport;

    #[test]
    fn all_is_case_insensitive() {
        assert_eq!(parse_ids("all").unwrap(), IdSelection::All);
        assert_eq!(parse_ids(" ALL ").unwrap(), IdSelection::All);
    }

    #[test]
    fn mixed_list() {
        assert_eq!(
            parse_ids("0, 2,0x0A 1a2b3c4d").unwrap(),
            IdSelection::List(vec![
                DeviceSelector::ByIndex(0),
                DeviceSelector::ByIndex(2),
                DeviceSelector::ByIndex(10),
                DeviceSelector::BySerial("1A2B3C4D".into()),
            ])
        );
    }

    #[test]
    fn eight_characters_are_hex_even_without_letters() {
        assert_eq!(
            parse_ids("12345678").unwrap(),
            IdSelection::List(vec![DeviceSelector::BySerial("12345678".into())])
        );
    }

    #[test]
    fn large_numeric_id_is_a_serial() {
        assert_eq!(
            parse_ids("0x1A2B3C4D").unwrap(),
            IdSelection::List(vec![DeviceSelector::BySerial("1A2B3C4D".into())])
        );
    }

    #[test]
    fn small_serial_is_not_an_index() {
        let mut t = MockTransport::new();
        t.attach("/dev/hidraw0", Some("0000000A"), 0x1C34, 0x7241);
        let mut reg = Registry::new();
        reg.enumerate(&mut t).unwrap();

        let ids = parse_ids("0000000A").unwrap();
        let targets = resolve_targets(&reg, Some(&ids), "");
        assert_eq!(targets, [DeviceSelector::BySerial("0000000A".into())]);
        let opened = reg.open(&mut t, &targets[0]).unwrap();
        assert_eq!(opened.index, Some(0));
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", ",", "abc", "-1", "0x", "0xZZ", "1A2B3C4G"] {
            assert!(parse_ids(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn listed_targets_keep_their_order() {
        let reg = Registry::new();
        let ids = parse_ids("1,1A2B3C4D").unwrap();
        let targets = resolve_targets(&reg, Some(&ids), "");
        assert_eq!(
            targets,
            [
                DeviceSelector::ByIndex(1),
                DeviceSelector::BySerial("1A2B3C4D".into())
            ]
        );
    }

    #[test]
    fn default_targets() {
        let mut t = MockTransport::new();
        t.attach("/dev/hidraw0", Some("00000002"), 0x1C34, 0x7241);
        t.attach("/dev/hidraw1", Some("00000001"), 0x1C34, 0x7241);
        let mut reg = Registry::new();
        reg.enumerate(&mut t).unwrap();

        assert_eq!(
            resolve_targets(&reg, None, ""),
            [DeviceSelector::ByIndex(0), DeviceSelector::ByIndex(1)]
        );
        assert_eq!(
            resolve_targets(&reg, None, "00000002"),
            [DeviceSelector::BySerial("00000002".into())]
        );
        assert_eq!(resolve_targets(&reg, Some(&IdSelection::All), "00000002").len(), 2);
    }
}
