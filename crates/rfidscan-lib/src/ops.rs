//! Device operations: typed wrappers over [`crate::codec`].
//!
//! Each call picks an action, item and payload and performs one exchange.
//! Nothing is cached between calls.

use crate::codec::{self, encode_be16};
use crate::protocol::*;
use crate::transport::{DeviceError, HidHandle, HidTransport, Result};

// ── Identity strings ──

pub fn vendor_name(transport: &impl HidTransport, handle: HidHandle) -> Result<String> {
    codec::get_ascii(transport, handle, ACTION_GET_CONST_ASCII, GET_CONST_ITEM_VENDOR_NAME)
}

pub fn product_name(transport: &impl HidTransport, handle: HidHandle) -> Result<String> {
    codec::get_ascii(transport, handle, ACTION_GET_CONST_ASCII, GET_CONST_ITEM_PRODUCT_NAME)
}

/// Serial number as reported by the firmware (not the USB descriptor).
pub fn serial_number(transport: &impl HidTransport, handle: HidHandle) -> Result<String> {
    codec::get_ascii(transport, handle, ACTION_GET_CONST_ASCII, GET_CONST_ITEM_SERIAL_NUMBER)
}

/// Raw version string, e.g. `"0102010305"`. See [`crate::identity::VersionInfo`].
pub fn version(transport: &impl HidTransport, handle: HidHandle) -> Result<String> {
    codec::get_ascii(transport, handle, ACTION_GET_CONST_ASCII, GET_CONST_ITEM_PRODUCT_VERSION)
}

pub fn vid_pid(transport: &impl HidTransport, handle: HidHandle) -> Result<String> {
    codec::get_ascii(transport, handle, ACTION_GET_CONST_ASCII, GET_CONST_ITEM_PID_VID)
}

pub fn protocol_info(transport: &impl HidTransport, handle: HidHandle) -> Result<Vec<u8>> {
    codec::get(transport, handle, ACTION_GET_PROTOCOL_INFO, 0)
}

/// Last error code latched by the reader; 0 when it answers with no data.
pub fn last_error(transport: &impl HidTransport, handle: HidHandle) -> Result<u8> {
    let payload = codec::get(
        transport,
        handle,
        ACTION_GET_VARIABLE,
        GET_VARIABLE_ITEM_LAST_ERROR,
    )?;
    Ok(payload.first().copied().unwrap_or(0))
}

// ── LEDs and buzzer ──

/// Set the red, green and blue LED modes until further notice.
///
/// Each value is a mode code (see [`crate::led::LedMode`]).
pub fn set_leds(
    transport: &impl HidTransport,
    handle: HidHandle,
    r: u8,
    g: u8,
    b: u8,
) -> Result<()> {
    codec::set(transport, handle, ACTION_SET_LEDS, 0, &[r, g, b, 0])
}

/// Set the LED modes for `duration_ms`, after which the reader reverts.
pub fn set_leds_for(
    transport: &impl HidTransport,
    handle: HidHandle,
    r: u8,
    g: u8,
    b: u8,
    duration_ms: u16,
) -> Result<()> {
    let [hi, lo] = encode_be16(duration_ms);
    codec::set(transport, handle, ACTION_SET_LEDS, 0, &[r, g, b, 0, hi, lo])
}

pub fn set_buzzer(
    transport: &impl HidTransport,
    handle: HidHandle,
    duration_ms: u16,
) -> Result<()> {
    codec::set(transport, handle, ACTION_SET_BUZZER, 0, &encode_be16(duration_ms))
}

// ── Registers ──

/// Read a configuration register. An undefined register reads as empty.
pub fn register_read(
    transport: &impl HidTransport,
    handle: HidHandle,
    addr: u8,
) -> Result<Vec<u8>> {
    codec::get(transport, handle, ACTION_GET_FEED, addr)
}

/// Read a register into `buf` and return the length reported by the reader.
pub fn register_read_into(
    transport: &impl HidTransport,
    handle: HidHandle,
    addr: u8,
    buf: &mut [u8],
) -> Result<usize> {
    codec::get_into(transport, handle, ACTION_GET_FEED, addr, buf)
}

pub fn register_write(
    transport: &impl HidTransport,
    handle: HidHandle,
    addr: u8,
    data: &[u8],
) -> Result<()> {
    codec::set(transport, handle, ACTION_SET_FEED, addr, data)
}

/// Erase a register (write with an empty payload).
pub fn register_erase(transport: &impl HidTransport, handle: HidHandle, addr: u8) -> Result<()> {
    codec::set(transport, handle, ACTION_SET_FEED, addr, &[])
}

// ── Behaviour commands ──

fn behaviour(transport: &impl HidTransport, handle: HidHandle, command: u8) -> Result<()> {
    codec::set(transport, handle, ACTION_SET_BEHAVIOUR, 0, &[command])
}

/// Restart the reader so that register changes take effect.
pub fn apply_config(transport: &impl HidTransport, handle: HidHandle) -> Result<()> {
    behaviour(transport, handle, SET_BEHAVIOUR_ITEM_APPLY_CONFIG)
}

pub fn factory_reset(transport: &impl HidTransport, handle: HidHandle) -> Result<()> {
    behaviour(transport, handle, SET_BEHAVIOUR_ITEM_RESET)
}

pub fn start_reader(transport: &impl HidTransport, handle: HidHandle) -> Result<()> {
    behaviour(transport, handle, SET_BEHAVIOUR_ITEM_START_READER)
}

pub fn stop_reader(transport: &impl HidTransport, handle: HidHandle) -> Result<()> {
    behaviour(transport, handle, SET_BEHAVIOUR_ITEM_STOP_READER)
}

pub fn start_keyboard(transport: &impl HidTransport, handle: HidHandle) -> Result<()> {
    behaviour(transport, handle, SET_BEHAVIOUR_ITEM_START_KEYBOARD)
}

pub fn stop_keyboard(transport: &impl HidTransport, handle: HidHandle) -> Result<()> {
    behaviour(transport, handle, SET_BEHAVIOUR_ITEM_STOP_KEYBOARD)
}

// ── Access control ──

/// Outcome of [`check_access`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    /// No password is set.
    Open,
    /// A password is set and the supplied one matches.
    Granted,
    /// The password register is malformed or holds `FF FF`.
    Locked,
    PasswordRequired,
    WrongPassword,
}

impl AccessStatus {
    pub fn is_allowed(self) -> bool {
        matches!(self, AccessStatus::Open | AccessStatus::Granted)
    }

    /// Message shown to the user for this outcome.
    pub fn message(self) -> &'static str {
        match self {
            AccessStatus::Open => "No password set",
            AccessStatus::Granted => "Password is OK!",
            AccessStatus::Locked => "This RFID Scanner has been locked",
            AccessStatus::PasswordRequired => {
                "This RFID Scanner is password-protected, use --password <password> to login"
            }
            AccessStatus::WrongPassword => "Wrong password",
        }
    }
}

/// Compare `password` with the reader's password register.
///
/// A reader that refuses to read the register is treated as unprotected.
/// Link failures are still reported.
pub fn check_access(
    transport: &impl HidTransport,
    handle: HidHandle,
    password: Option<[u8; 2]>,
) -> Result<AccessStatus> {
    let stored = match register_read(transport, handle, REG_PASSWORD) {
        Ok(v) => v,
        Err(e @ DeviceError::Device { .. }) => {
            log::debug!("password register unreadable ({e}), assuming none");
            return Ok(AccessStatus::Open);
        }
        Err(e) => return Err(e),
    };
    let status = if stored.is_empty() {
        AccessStatus::Open
    } else if stored.len() != 2 || stored == [0xFF, 0xFF] {
        AccessStatus::Locked
    } else {
        match password {
            None => AccessStatus::PasswordRequired,
            Some(p) if p[..] != stored[..] => AccessStatus::WrongPassword,
            Some(_) => AccessStatus::Granted,
        }
    };
    Ok(status)
}
