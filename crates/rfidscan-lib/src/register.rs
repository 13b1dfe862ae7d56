//! Configuration registers: address and value parsing, display, dump.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RfidscanError;
use crate::ops;
use crate::protocol::{MAX_PAYLOAD, REG_FIRST, REG_LAST, is_secret_register};
use crate::transport::{HidHandle, HidTransport, Result};

/// Longest value [`parse_value`] accepts: one frame's payload.
pub const MAX_VALUE_LEN: usize = MAX_PAYLOAD;

// ── Addresses ──

/// A register address as typed by the user: two hex digits, 0x00 and 0xFF
/// excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegisterAddr(u8);

impl RegisterAddr {
    pub fn new(addr: u8) -> Option<Self> {
        (addr != 0x00 && addr != 0xFF).then_some(RegisterAddr(addr))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl FromStr for RegisterAddr {
    type Err = RfidscanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || RfidscanError::Parse(format!("Invalid register addr: {s:?}"));
        if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let addr = u8::from_str_radix(s, 16).map_err(|_| invalid())?;
        RegisterAddr::new(addr).ok_or_else(invalid)
    }
}

impl fmt::Display for RegisterAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}", self.0)
    }
}

// ── Values ──

fn is_value_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '.' | ':')
}

/// Parse a register value.
///
/// Leading `=`, `:`, spaces and tabs are skipped. A value starting with `@`
/// is taken as ASCII text; anything else is hex byte pairs, optionally
/// separated by spaces, tabs, dots or colons (`"01:02 0A.FF"`). Values over
/// [`MAX_VALUE_LEN`] bytes are refused. An empty value is valid (it erases).
pub fn parse_value(s: &str) -> crate::error::Result<Vec<u8>> {
    let s = s.trim_start_matches(['=', ':', ' ', '\t']);
    if let Some(text) = s.strip_prefix('@') {
        return check_len(text.as_bytes().to_vec());
    }

    let digits = s.trim_end_matches(is_value_separator);
    let mut bytes = Vec::new();
    let mut rest = digits;
    while !rest.is_empty() {
        let pair = rest.get(..2).ok_or_else(|| {
            RfidscanError::Parse(format!("Odd number of hex digits in value: {s:?}"))
        })?;
        let byte = pair
            .bytes()
            .all(|b| b.is_ascii_hexdigit())
            .then(|| u8::from_str_radix(pair, 16).ok())
            .flatten()
            .ok_or_else(|| RfidscanError::Parse(format!("Invalid hex byte {pair:?} in value")))?;
        bytes.push(byte);
        rest = rest[2..].trim_start_matches(is_value_separator);
    }
    check_len(bytes)
}

fn check_len(bytes: Vec<u8>) -> crate::error::Result<Vec<u8>> {
    if bytes.len() > MAX_VALUE_LEN {
        return Err(RfidscanError::Parse(format!(
            "Value of {} bytes exceeds {MAX_VALUE_LEN}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Render a value as contiguous uppercase hex, masking secret registers.
pub fn format_value(addr: u8, value: &[u8]) -> String {
    if is_secret_register(addr) {
        return "XX".repeat(value.len());
    }
    value.iter().map(|b| format!("{b:02X}")).collect()
}

// ── Register I/O ──

/// One defined register, as shown by `read` and `dump`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterEntry {
    pub addr: u8,
    /// Hex rendering, masked for secret registers.
    pub value: String,
    pub len: usize,
}

impl RegisterEntry {
    pub fn new(addr: u8, raw: &[u8]) -> Self {
        RegisterEntry {
            addr,
            value: format_value(addr, raw),
            len: raw.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for RegisterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "{:02X} : (empty)", self.addr)
        } else {
            write!(f, "{:02X} : {}", self.addr, self.value)
        }
    }
}

pub fn read_entry(
    transport: &impl HidTransport,
    handle: HidHandle,
    addr: u8,
) -> Result<RegisterEntry> {
    let raw = ops::register_read(transport, handle, addr)?;
    Ok(RegisterEntry::new(addr, &raw))
}

/// Write a register, then read it back.
pub fn write_and_verify(
    transport: &impl HidTransport,
    handle: HidHandle,
    addr: u8,
    value: &[u8],
) -> Result<RegisterEntry> {
    ops::register_write(transport, handle, addr, value)?;
    read_entry(transport, handle, addr)
}

/// Read every register from 0x01 to 0xFE and keep the defined ones.
pub fn dump_registers(
    transport: &impl HidTransport,
    handle: HidHandle,
) -> Result<Vec<RegisterEntry>> {
    let mut entries = Vec::new();
    for addr in REG_FIRST..=REG_LAST {
        let entry = read_entry(transport, handle, addr)?;
        if !entry.is_empty() {
            entries.push(entry);
        }
    }
    log::debug!("dump: {} register(s) defined", entries.len());
    Ok(entries)
}

/// Erase registers 0x00 through 0xFE, stopping at the first failure.
pub fn erase_all(transport: &impl HidTransport, handle: HidHandle) -> Result<()> {
    for addr in 0x00..=REG_LAST {
        ops::register_erase(transport, handle, addr)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    fn open_mock() -> (MockTransport, HidHandle) {
        let mut t = MockTransport::with_device("1A2B3C4D");
        let h = t.open_path("mock://1A2B3C4D").unwrap();
        (t, h)
    }

    // ── addresses ──

    #[test]
    fn addr_parses_two_hex_digits() {
        assert_eq!("a0".parse::<RegisterAddr>().unwrap().get(), 0xA0);
        assert_eq!(" 6F ".parse::<RegisterAddr>().unwrap().get(), 0x6F);
        assert_eq!(RegisterAddr::new(0x01).unwrap().to_string(), "01");
    }

    #[test]
    fn addr_rejects_reserved_and_malformed() {
        for bad in ["00", "FF", "ff", "1", "123", "G1", "", "0x"] {
            assert!(bad.parse::<RegisterAddr>().is_err(), "{bad:?}");
        }
        assert!(RegisterAddr::new(0x00).is_none());
        assert!(RegisterAddr::new(0xFF).is_none());
    }

    // ── values ──

    #[test]
    fn value_hex_with_separators() {
        assert_eq!(parse_value("01:02 0A.ff\t10").unwrap(), [0x01, 0x02, 0x0A, 0xFF, 0x10]);
        assert_eq!(parse_value("DEADBEEF").unwrap(), [0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn value_leading_junk_trimmed() {
        assert_eq!(parse_value("= :\t12").unwrap(), [0x12]);
    }

    #[test]
    fn value_ascii() {
        assert_eq!(parse_value("@Hello").unwrap(), b"Hello");
        assert_eq!(parse_value("=@a b").unwrap(), b"a b");
    }

    #[test]
    fn value_empty_is_valid() {
        assert!(parse_value("").unwrap().is_empty());
        assert!(parse_value(" = ").unwrap().is_empty());
        assert!(parse_value("@").unwrap().is_empty());
    }

    #[test]
    fn value_rejects_bad_hex() {
        assert!(parse_value("0G").is_err());
        assert!(parse_value("123").is_err());
        assert!(parse_value("+1").is_err());
    }

    #[test]
    fn value_fits_one_frame() {
        assert_eq!(parse_value(&"AB".repeat(60)).unwrap().len(), 60);
        assert_eq!(parse_value(&format!("@{}", "x".repeat(60))).unwrap().len(), 60);
    }

    #[test]
    fn value_longer_than_one_frame_is_refused() {
        let err = parse_value(&"AB".repeat(61)).unwrap_err();
        assert!(matches!(err, RfidscanError::Parse(_)));
        assert!(err.to_string().contains("61 bytes"));
        assert!(parse_value(&format!("@{}", "x".repeat(61))).is_err());
    }

    #[test]
    fn secret_values_masked() {
        assert_eq!(format_value(0x6F, &[0x12, 0x34]), "XXXX");
        assert_eq!(format_value(0x55, &[1, 2, 3]), "XXXXXX");
        assert_eq!(format_value(0x10, &[0x0A, 0xBC]), "0ABC");
    }

    #[test]
    fn entry_display() {
        assert_eq!(RegisterEntry::new(0x10, &[0x01, 0xFF]).to_string(), "10 : 01FF");
        assert_eq!(RegisterEntry::new(0x56, &[0x01]).to_string(), "56 : XX");
        assert_eq!(RegisterEntry::new(0x20, &[]).to_string(), "20 : (empty)");
    }

    // ── I/O ──

    #[test]
    fn write_and_verify_reads_back() {
        let (t, h) = open_mock();
        let entry = write_and_verify(&t, h, 0x10, &[0xCA, 0xFE]).unwrap();
        assert_eq!(entry.value, "CAFE");
        assert_eq!(t.request_count(), 2);
    }

    #[test]
    fn dump_lists_defined_registers_only() {
        let (t, h) = open_mock();
        t.set_register(0x10, &[0x01]);
        t.set_register(0x6F, &[0x12, 0x34]);
        t.set_register(0xA0, &[0x03]);
        let entries = dump_registers(&t, h).unwrap();
        let addrs: Vec<u8> = entries.iter().map(|e| e.addr).collect();
        assert_eq!(addrs, [0x10, 0x6F, 0xA0]);
        assert_eq!(entries[1].value, "XXXX");
        assert_eq!(t.request_count(), 254);
    }

    #[test]
    fn dump_empty_reader() {
        let (t, h) = open_mock();
        assert!(dump_registers(&t, h).unwrap().is_empty());
    }

    #[test]
    fn dump_stops_on_error() {
        let (t, h) = open_mock();
        t.push_payload(&[]);
        t.push_error(0x03);
        assert!(dump_registers(&t, h).is_err());
        assert_eq!(t.request_count(), 2);
    }

    #[test]
    fn erase_all_covers_00_to_fe() {
        let (t, h) = open_mock();
        t.set_register(0x00, &[1]);
        t.set_register(0xFE, &[1]);
        erase_all(&t, h).unwrap();
        assert!(t.registers.borrow().is_empty());
        assert_eq!(t.request_count(), 255);
    }
}
