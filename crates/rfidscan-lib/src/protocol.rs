//! Protocol constants for SpringCard Prox'N'Roll RFID scanners.
//!
//! All commands travel as HID feature reports with report id 0. A frame is
//! always 65 bytes on the wire (1 report id byte + 64 report bytes):
//!
//! ```text
//! [0] report id (0)
//! [1] length / status   3 + payload length
//! [2] sequence / error  0 on request, device error code on response
//! [3] action            bit 7 set for SET_* actions
//! [4] item / address
//! [5..] payload         up to 60 bytes
//! ```

// ── Frame geometry ──

/// HID report id used for every exchange.
pub const REPORT_ID: u8 = 0;

/// HID feature report size, excluding the report id byte.
pub const REPORT_SIZE: usize = 64;

/// Full frame size including the report id byte.
pub const FRAME_SIZE: usize = REPORT_SIZE + 1;

/// Offset of the first payload byte in a frame.
pub const PAYLOAD_OFFSET: usize = 5;

/// Largest payload a SET request may carry.
pub const MAX_PAYLOAD: usize = 60;

/// Value of byte 1 for a frame without payload (action + item + sequence).
pub const HEADER_LEN: u8 = 3;

/// Bit 7 of the action byte marks a write.
pub const WRITE_FLAG: u8 = 0x80;

// ── Timing ──

/// Delay between sending a feature report and reading the answer back.
///
/// The firmware needs this turnaround; reading earlier returns stale data.
pub const EXCHANGE_DELAY_MS: u64 = 5;

// ── Actions ──

pub const ACTION_GET_PROTOCOL_INFO: u8 = 0x01;
pub const ACTION_GET_VARIABLE: u8 = 0x02;
pub const ACTION_GET_CONST_ASCII: u8 = 0x04;

/// Register read.
pub const ACTION_GET_FEED: u8 = 0x20;

pub const ACTION_SET_BEHAVIOUR: u8 = 0x80;
pub const ACTION_SET_LEDS: u8 = 0x88;
pub const ACTION_SET_BUZZER: u8 = 0x8A;

/// Register write / erase.
pub const ACTION_SET_FEED: u8 = 0xA0;

pub const ACTION_SET_MIFARE_KEY: u8 = 0xB0;

// ── Items ──

/// `ACTION_GET_VARIABLE` item: last error raised by the reader.
pub const GET_VARIABLE_ITEM_LAST_ERROR: u8 = 0x01;

pub const GET_CONST_ITEM_VENDOR_NAME: u8 = 0x01;
pub const GET_CONST_ITEM_PRODUCT_NAME: u8 = 0x02;
pub const GET_CONST_ITEM_SERIAL_NUMBER: u8 = 0x03;
pub const GET_CONST_ITEM_PID_VID: u8 = 0x04;
pub const GET_CONST_ITEM_PRODUCT_VERSION: u8 = 0x05;

// ── Behaviour commands ──
//
// Sent as the single payload byte of `ACTION_SET_BEHAVIOUR` (item 0).

pub const SET_BEHAVIOUR_ITEM_STOP_READER: u8 = 0x10;
pub const SET_BEHAVIOUR_ITEM_START_READER: u8 = 0x11;
pub const SET_BEHAVIOUR_ITEM_STOP_KEYBOARD: u8 = 0x20;
pub const SET_BEHAVIOUR_ITEM_START_KEYBOARD: u8 = 0x21;
pub const SET_BEHAVIOUR_ITEM_APPLY_CONFIG: u8 = 0xC0;
pub const SET_BEHAVIOUR_ITEM_RESET: u8 = 0xD0;

// ── Registers ──

/// Keyboard layout register (one byte, see [`crate::layout`]).
pub const REG_KEYBOARD_LAYOUT: u8 = 0xA0;

/// Two-byte configuration password register.
pub const REG_PASSWORD: u8 = 0x6F;

/// Registers whose contents are never displayed.
pub const SECRET_REGISTERS: [u8; 3] = [0x55, 0x56, REG_PASSWORD];

/// First and last register addresses a dump walks through.
///
/// 0x00 and 0xFF are reserved and rejected by [`crate::register::RegisterAddr`].
pub const REG_FIRST: u8 = 0x01;
pub const REG_LAST: u8 = 0xFE;

// ── USB identifiers ──

/// SpringCard vendor ID.
pub const SPRINGCARD_VID: u16 = 0x1C34;

/// Is this register's value hidden from dumps?
pub fn is_secret_register(addr: u8) -> bool {
    SECRET_REGISTERS.contains(&addr)
}
