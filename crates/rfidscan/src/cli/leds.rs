//! `leds`, `leds-default`, `beep` and `test` subcommands.

use std::thread;
use std::time::Duration;

use rfidscan_lib::led::LedMode;

use super::{HidHandle, HidTransport, Result, ops};

/// Every channel back under reader control.
pub(super) const DEFAULT_CODES: [u8; 3] = [LedMode::Default as u8; 3];

/// Buzzer duration of the `test` sequence.
const TEST_BEEP_MS: u16 = 150;

pub(super) fn cmd_leds<T: HidTransport>(
    transport: &T,
    handle: HidHandle,
    [red, green, blue]: [u8; 3],
    during: Option<u16>,
) -> Result<()> {
    log::debug!("leds {red},{green},{blue} during {during:?}");
    match during {
        Some(ms) if ms > 0 => ops::set_leds_for(transport, handle, red, green, blue, ms)?,
        _ => ops::set_leds(transport, handle, red, green, blue)?,
    }
    Ok(())
}

pub(super) fn cmd_beep<T: HidTransport>(transport: &T, handle: HidHandle, ms: u16) -> Result<()> {
    log::debug!("beep {ms} ms");
    ops::set_buzzer(transport, handle, ms)?;
    Ok(())
}

/// Light red, green and blue in turn, then all three with a beep, then hand
/// the LEDs back to the reader.
pub(super) fn cmd_test<T: HidTransport>(
    transport: &T,
    handle: HidHandle,
    step: Duration,
) -> Result<()> {
    let on = LedMode::On as u8;
    let off = LedMode::Off as u8;

    for (label, codes) in [
        ("red", [on, off, off]),
        ("green", [off, on, off]),
        ("blue", [off, off, on]),
    ] {
        msg!("Testing the {label} LED");
        cmd_leds(transport, handle, codes, None)?;
        thread::sleep(step);
    }

    msg!("Testing all of the LEDs and the buzzer");
    cmd_leds(transport, handle, [on; 3], None)?;
    cmd_beep(transport, handle, TEST_BEEP_MS)?;
    thread::sleep(step);

    cmd_leds(transport, handle, DEFAULT_CODES, None)?;
    println!("Everything looks OK!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfidscan_lib::transport::mock::MockTransport;

    fn open_mock() -> (MockTransport, HidHandle) {
        let mut t = MockTransport::with_device("1A2B3C4D");
        let h = t.open_path("mock://1A2B3C4D").unwrap();
        (t, h)
    }

    #[test]
    fn default_codes_are_13() {
        assert_eq!(DEFAULT_CODES, [13, 13, 13]);
    }

    #[test]
    fn leds_with_duration_carry_it() {
        let (t, h) = open_mock();
        cmd_leds(&t, h, [4, 7, 0], Some(0x0102)).unwrap();
        let req = t.last_request().unwrap();
        assert_eq!(&req[5..11], &[4, 7, 0, 0, 0x01, 0x02]);
    }

    #[test]
    fn zero_duration_is_persistent() {
        let (t, h) = open_mock();
        cmd_leds(&t, h, [1, 1, 1], Some(0)).unwrap();
        let req = t.last_request().unwrap();
        assert_eq!(req[1], 3 + 4);
    }

    #[test]
    fn test_sequence_ends_on_default() {
        let (t, h) = open_mock();
        cmd_test(&t, h, Duration::ZERO).unwrap();
        // red, green, blue, all, beep, default
        assert_eq!(t.request_count(), 6);
        let last = t.last_request().unwrap();
        assert_eq!(&last[5..8], &[13, 13, 13]);
        let beep = t.requests.borrow()[4];
        assert_eq!(&beep[5..7], &[0x00, 150]);
    }
}
