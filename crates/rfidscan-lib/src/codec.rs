//! Request/response codec for the feature-report protocol.
//!
//! `encode_*` and [`decode_response`] are pure; [`get`] and [`set`] perform
//! a full round trip through a [`HidTransport`].

use crate::protocol::*;
use crate::transport::{DeviceError, HidHandle, HidTransport, Result};

/// A decoded answer frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Action byte echoed by the reader.
    pub action: u8,
    pub item: u8,
    /// Payload length as reported by the reader (byte 1 minus the header).
    pub reported_len: usize,
    /// Payload bytes actually present in the frame (at most 60).
    pub payload: Vec<u8>,
}

// ── Encoding ──

/// Build a GET request frame. The write flag is always cleared.
pub fn encode_get(action: u8, item: u8) -> [u8; FRAME_SIZE] {
    let mut frame = [0u8; FRAME_SIZE];
    frame[0] = REPORT_ID;
    frame[1] = HEADER_LEN;
    frame[2] = 0; // sequence
    frame[3] = action & !WRITE_FLAG;
    frame[4] = item;
    frame
}

/// Build a SET request frame. The write flag is always set.
pub fn encode_set(action: u8, item: u8, payload: &[u8]) -> Result<[u8; FRAME_SIZE]> {
    if payload.len() > MAX_PAYLOAD {
        return Err(DeviceError::Precondition(format!(
            "payload of {} bytes exceeds {MAX_PAYLOAD}",
            payload.len()
        )));
    }
    let mut frame = [0u8; FRAME_SIZE];
    frame[0] = REPORT_ID;
    frame[1] = HEADER_LEN + payload.len() as u8;
    frame[2] = 0; // sequence
    frame[3] = action | WRITE_FLAG;
    frame[4] = item;
    frame[PAYLOAD_OFFSET..PAYLOAD_OFFSET + payload.len()].copy_from_slice(payload);
    Ok(frame)
}

// ── Decoding ──

/// Decode an answer frame.
///
/// A non-zero error byte becomes [`DeviceError::Device`]. Otherwise the
/// payload is `byte1 - 3` bytes starting at offset 5, clamped to the frame.
pub fn decode_response(frame: &[u8; FRAME_SIZE]) -> Result<Response> {
    if frame[2] != 0 {
        return Err(DeviceError::Device { code: frame[2] });
    }
    let reported_len = frame[1].saturating_sub(HEADER_LEN) as usize;
    let present = reported_len.min(FRAME_SIZE - PAYLOAD_OFFSET);
    Ok(Response {
        action: frame[3],
        item: frame[4],
        reported_len,
        payload: frame[PAYLOAD_OFFSET..PAYLOAD_OFFSET + present].to_vec(),
    })
}

/// Encode a 16-bit value the way the firmware expects it (big-endian).
pub fn encode_be16(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Decode a big-endian 16-bit value. Returns `None` for short input.
pub fn decode_be16(bytes: &[u8]) -> Option<u16> {
    let b: [u8; 2] = bytes.get(..2)?.try_into().ok()?;
    Some(u16::from_be_bytes(b))
}

// ── Round trips ──

fn round_trip(
    transport: &impl HidTransport,
    handle: HidHandle,
    frame: &mut [u8; FRAME_SIZE],
) -> Result<Response> {
    log::trace!("-> {:02X?}", &frame[..PAYLOAD_OFFSET + 8]);
    transport.exchange(handle, frame)?;
    log::trace!("<- {:02X?}", &frame[..PAYLOAD_OFFSET + 8]);
    decode_response(frame).inspect_err(|e| log::debug!("action 0x{:02X}: {e}", frame[3]))
}

/// Read `(action, item)` from the reader and return its payload.
///
/// An empty payload is a valid, successful answer.
pub fn get(
    transport: &impl HidTransport,
    handle: HidHandle,
    action: u8,
    item: u8,
) -> Result<Vec<u8>> {
    let mut frame = encode_get(action, item);
    Ok(round_trip(transport, handle, &mut frame)?.payload)
}

/// Like [`get`] but copies into `buf`, truncating to its capacity.
///
/// Returns the payload length reported by the reader, which may exceed
/// `buf.len()`.
pub fn get_into(
    transport: &impl HidTransport,
    handle: HidHandle,
    action: u8,
    item: u8,
    buf: &mut [u8],
) -> Result<usize> {
    let mut frame = encode_get(action, item);
    let resp = round_trip(transport, handle, &mut frame)?;
    let n = resp.payload.len().min(buf.len());
    buf[..n].copy_from_slice(&resp.payload[..n]);
    Ok(resp.reported_len)
}

/// Read a string into `buf`, always leaving it NUL-terminated.
///
/// On error `buf` holds an empty string. When the answer does not fit, the
/// last byte of `buf` becomes the terminator. An empty `buf` is left alone.
pub fn get_string(
    transport: &impl HidTransport,
    handle: HidHandle,
    action: u8,
    item: u8,
    buf: &mut [u8],
) -> Result<usize> {
    match get_into(transport, handle, action, item, buf) {
        Ok(len) => {
            let end = len.min(buf.len().saturating_sub(1));
            if let Some(b) = buf.get_mut(end) {
                *b = 0;
            }
            Ok(len)
        }
        Err(e) => {
            if let Some(b) = buf.first_mut() {
                *b = 0;
            }
            Err(e)
        }
    }
}

/// Read an ASCII constant as an owned string (stops at the first NUL).
pub fn get_ascii(
    transport: &impl HidTransport,
    handle: HidHandle,
    action: u8,
    item: u8,
) -> Result<String> {
    let payload = get(transport, handle, action, item)?;
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    Ok(String::from_utf8_lossy(&payload[..end]).into_owned())
}

/// Write `payload` to `(action, item)`.
///
/// Oversized payloads are rejected before anything is sent.
pub fn set(
    transport: &impl HidTransport,
    handle: HidHandle,
    action: u8,
    item: u8,
    payload: &[u8],
) -> Result<()> {
    let mut frame = encode_set(action, item, payload)?;
    let sent_action = frame[3];
    let resp = round_trip(transport, handle, &mut frame)?;
    if resp.action != 0 && (resp.action & !WRITE_FLAG) != (sent_action & !WRITE_FLAG) {
        log::debug!(
            "action 0x{sent_action:02X} answered with action 0x{:02X}",
            resp.action
        );
        return Err(DeviceError::Rejected {
            action: resp.action,
        });
    }
    Ok(())
}
