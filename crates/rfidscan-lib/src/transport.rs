//! HID transport: trait + hidapi backend.
//!
//! The transport owns every platform resource. Callers only ever see a
//! [`HidHandle`], a plain token that the transport maps back to its open
//! device. Releasing a handle twice, or releasing one the transport never
//! issued, does nothing.

use std::collections::HashMap;
use std::ffi::CString;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::protocol::{EXCHANGE_DELAY_MS, FRAME_SIZE};

// ── Error type ──

/// Device communication errors.
///
/// Three families are kept apart so callers can react differently:
/// transport failures (`OpenFailed`, `NotOpen`, `Transport`) may be worth a
/// re-enumeration, device-reported failures (`Device`, `Rejected`) are passed
/// through untouched, and `Precondition` means nothing was sent at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// No cached device matches the requested selector.
    NotFound,
    /// The handle is not (or no longer) open.
    NotOpen,
    OpenFailed(String),
    /// Feature report send or receive failed.
    Transport(String),
    /// The reader answered with a non-zero error byte.
    Device { code: u8 },
    /// The reader answered a SET with an unexpected action byte.
    Rejected { action: u8 },
    /// Malformed request, rejected before any transport activity.
    Precondition(String),
}

impl DeviceError {
    /// True for failures of the USB link itself rather than of the reader.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DeviceError::NotOpen | DeviceError::OpenFailed(_) | DeviceError::Transport(_)
        )
    }

    /// Negative status code in the reader's own convention (`-error_byte`).
    pub fn status(&self) -> Option<i32> {
        match self {
            DeviceError::Device { code } => Some(-i32::from(*code)),
            DeviceError::Rejected { action } => Some(-i32::from(*action)),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotFound => write!(f, "RFID scanner not found"),
            DeviceError::NotOpen => write!(f, "RFID scanner is not open"),
            DeviceError::OpenFailed(e) => write!(f, "Failed to open device: {e}"),
            DeviceError::Transport(e) => write!(f, "Transport error: {e}"),
            DeviceError::Device { code } => {
                write!(f, "Error raised by the reader: {}", -i32::from(*code))
            }
            DeviceError::Rejected { action } => {
                write!(f, "Request rejected by the reader (action 0x{action:02X})")
            }
            DeviceError::Precondition(e) => write!(f, "Invalid request: {e}"),
        }
    }
}

impl std::error::Error for DeviceError {}

impl From<hidapi::HidError> for DeviceError {
    fn from(e: hidapi::HidError) -> Self {
        DeviceError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;

// ── Handles and discovery ──

/// Opaque token for an open device, issued by a [`HidTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HidHandle(u32);

impl HidHandle {
    pub fn new(raw: u32) -> Self {
        HidHandle(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for HidHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A HID device reported by enumeration (not opened).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredDevice {
    pub path: String,
    /// USB serial number; `None` when the platform refuses to read it.
    pub serial: Option<String>,
    pub vid: u16,
    pub pid: u16,
}

// ── Trait ──

pub trait HidTransport {
    /// List devices matching `vid`/`pid`.
    fn enumerate(&mut self, vid: u16, pid: u16) -> Result<Vec<DiscoveredDevice>>;
    fn open_path(&mut self, path: &str) -> Result<HidHandle>;
    fn open_serial(&mut self, vid: u16, pid: u16, serial: &str) -> Result<HidHandle>;
    /// Release the device behind `handle`. Unknown handles are ignored.
    fn close(&mut self, handle: HidHandle);
    /// Send `frame` as a feature report and overwrite it with the answer.
    ///
    /// Returns the number of bytes received.
    fn exchange(&self, handle: HidHandle, frame: &mut [u8; FRAME_SIZE]) -> Result<usize>;
}

// ── hidapi backend ──

/// Transport over the system HID stack (hidapi).
pub struct HidApiTransport {
    api: hidapi::HidApi,
    open: HashMap<HidHandle, hidapi::HidDevice>,
    next_handle: u32,
    exchange_delay: Duration,
}

impl HidApiTransport {
    pub fn new() -> Result<Self> {
        // Each enumeration resets this list and rescans one VID/PID pair.
        let api = hidapi::HidApi::new()
            .map_err(|e| DeviceError::OpenFailed(format!("hidapi init: {e}")))?;
        Ok(HidApiTransport {
            api,
            open: HashMap::new(),
            next_handle: 1,
            exchange_delay: Duration::from_millis(EXCHANGE_DELAY_MS),
        })
    }

    fn track(&mut self, device: hidapi::HidDevice) -> HidHandle {
        let handle = HidHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        self.open.insert(handle, device);
        handle
    }
}

impl HidTransport for HidApiTransport {
    fn enumerate(&mut self, vid: u16, pid: u16) -> Result<Vec<DiscoveredDevice>> {
        self.api.reset_devices()?;
        self.api.add_devices(vid, pid)?;
        let found = self
            .api
            .device_list()
            .filter(|d| d.vendor_id() == vid && d.product_id() == pid)
            .map(|d| DiscoveredDevice {
                path: d.path().to_string_lossy().into_owned(),
                serial: d.serial_number().map(str::to_owned),
                vid: d.vendor_id(),
                pid: d.product_id(),
            })
            .collect();
        Ok(found)
    }

    fn open_path(&mut self, path: &str) -> Result<HidHandle> {
        let cpath = CString::new(path)
            .map_err(|_| DeviceError::OpenFailed(format!("path contains NUL: {path:?}")))?;
        let device = self
            .api
            .open_path(&cpath)
            .map_err(|e| DeviceError::OpenFailed(format!("{path}: {e}")))?;
        Ok(self.track(device))
    }

    fn open_serial(&mut self, vid: u16, pid: u16, serial: &str) -> Result<HidHandle> {
        let device = self
            .api
            .open_serial(vid, pid, serial)
            .map_err(|e| DeviceError::OpenFailed(format!("{vid:04X}:{pid:04X} {serial}: {e}")))?;
        Ok(self.track(device))
    }

    fn close(&mut self, handle: HidHandle) {
        // Dropping the HidDevice closes it.
        if self.open.remove(&handle).is_some() {
            log::debug!("closed handle {handle}");
        }
    }

    fn exchange(&self, handle: HidHandle, frame: &mut [u8; FRAME_SIZE]) -> Result<usize> {
        let device = self.open.get(&handle).ok_or(DeviceError::NotOpen)?;
        device
            .send_feature_report(&frame[..])
            .map_err(|e| DeviceError::Transport(format!("send_feature_report: {e}")))?;
        std::thread::sleep(self.exchange_delay);
        let n = device
            .get_feature_report(&mut frame[..])
            .map_err(|e| DeviceError::Transport(format!("get_feature_report: {e}")))?;
        Ok(n)
    }
}

// ── Mock transport for testing ──

/// In-memory reader emulation for unit and integration tests.
///
/// Always compiled, hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::{HashSet, VecDeque};

    use crate::protocol::*;

    /// Emulated reader: attached devices, a register file, identity strings,
    /// and the list of frames it received.
    ///
    /// Queued responses (`push_response` and friends) take precedence over
    /// emulation; once the queue is empty, requests are answered from the
    /// register file and identity strings.
    pub struct MockTransport {
        pub attached: Vec<DiscoveredDevice>,
        /// Register file: address → value.
        pub registers: RefCell<HashMap<u8, Vec<u8>>>,
        /// `GET_CONST_ASCII` answers: item → string.
        pub strings: HashMap<u8, String>,
        /// Every request frame, in order.
        pub requests: RefCell<Vec<[u8; FRAME_SIZE]>>,
        /// Canned answers, popped one per exchange.
        pub responses: RefCell<VecDeque<[u8; FRAME_SIZE]>>,
        /// Handles currently open, with the path they were opened for.
        pub open: RefCell<HashMap<HidHandle, String>>,
        /// Handles passed to `close`, including repeated ones.
        pub closed: RefCell<Vec<HidHandle>>,
        /// If true, `exchange` fails as if the device was unplugged.
        pub fail_exchange: Cell<bool>,
        /// Paths that refuse to open.
        pub fail_open: HashSet<String>,
        next_handle: Cell<u32>,
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockTransport {
        pub fn new() -> Self {
            let strings = HashMap::from([
                (GET_CONST_ITEM_VENDOR_NAME, "SpringCard".to_string()),
                (
                    GET_CONST_ITEM_PRODUCT_NAME,
                    "Prox'N'Roll RFID Scanner".to_string(),
                ),
                (GET_CONST_ITEM_SERIAL_NUMBER, "1A2B3C4D".to_string()),
                (GET_CONST_ITEM_PID_VID, "1C347241".to_string()),
                (GET_CONST_ITEM_PRODUCT_VERSION, "0102010305".to_string()),
            ]);
            MockTransport {
                attached: Vec::new(),
                registers: RefCell::new(HashMap::new()),
                strings,
                requests: RefCell::new(Vec::new()),
                responses: RefCell::new(VecDeque::new()),
                open: RefCell::new(HashMap::new()),
                closed: RefCell::new(Vec::new()),
                fail_exchange: Cell::new(false),
                fail_open: HashSet::new(),
                next_handle: Cell::new(1),
            }
        }

        /// A transport with one attached Prox'N'Roll (0x1C34:0x7241).
        pub fn with_device(serial: &str) -> Self {
            let mut t = Self::new();
            t.attach(&format!("mock://{serial}"), Some(serial), SPRINGCARD_VID, 0x7241);
            t
        }

        pub fn attach(&mut self, path: &str, serial: Option<&str>, vid: u16, pid: u16) {
            self.attached.push(DiscoveredDevice {
                path: path.into(),
                serial: serial.map(str::to_owned),
                vid,
                pid,
            });
        }

        /// Queue a raw answer frame.
        pub fn push_response(&self, frame: [u8; FRAME_SIZE]) {
            self.responses.borrow_mut().push_back(frame);
        }

        /// Queue a successful answer carrying `payload`.
        pub fn push_payload(&self, payload: &[u8]) {
            let mut frame = [0u8; FRAME_SIZE];
            frame[1] = HEADER_LEN + payload.len() as u8;
            frame[PAYLOAD_OFFSET..PAYLOAD_OFFSET + payload.len()].copy_from_slice(payload);
            self.push_response(frame);
        }

        /// Queue an answer whose error byte is `code`.
        pub fn push_error(&self, code: u8) {
            let mut frame = [0u8; FRAME_SIZE];
            frame[1] = HEADER_LEN;
            frame[2] = code;
            self.push_response(frame);
        }

        pub fn register(&self, addr: u8) -> Option<Vec<u8>> {
            self.registers.borrow().get(&addr).cloned()
        }

        pub fn set_register(&self, addr: u8, value: &[u8]) {
            self.registers.borrow_mut().insert(addr, value.to_vec());
        }

        pub fn request_count(&self) -> usize {
            self.requests.borrow().len()
        }

        pub fn last_request(&self) -> Option<[u8; FRAME_SIZE]> {
            self.requests.borrow().last().copied()
        }

        pub fn is_open(&self, handle: HidHandle) -> bool {
            self.open.borrow().contains_key(&handle)
        }

        fn issue(&self, path: &str) -> HidHandle {
            let handle = HidHandle(self.next_handle.get());
            self.next_handle.set(self.next_handle.get() + 1);
            self.open.borrow_mut().insert(handle, path.to_string());
            handle
        }

        fn emulate(&self, request: &[u8; FRAME_SIZE]) -> [u8; FRAME_SIZE] {
            let mut answer = *request;
            answer[1] = HEADER_LEN;
            answer[2] = 0;
            let action = request[3];
            let item = request[4];
            let reply = |answer: &mut [u8; FRAME_SIZE], data: &[u8]| {
                let n = data.len().min(MAX_PAYLOAD);
                answer[1] = HEADER_LEN + n as u8;
                answer[PAYLOAD_OFFSET..].fill(0);
                answer[PAYLOAD_OFFSET..PAYLOAD_OFFSET + n].copy_from_slice(&data[..n]);
            };
            match action {
                ACTION_GET_CONST_ASCII => match self.strings.get(&item) {
                    Some(s) => reply(&mut answer, s.as_bytes()),
                    None => answer[2] = 0x01,
                },
                ACTION_GET_FEED => {
                    let value = self.register(item).unwrap_or_default();
                    reply(&mut answer, &value);
                }
                ACTION_SET_FEED => {
                    let len = (request[1].saturating_sub(HEADER_LEN) as usize).min(MAX_PAYLOAD);
                    let value = &request[PAYLOAD_OFFSET..PAYLOAD_OFFSET + len];
                    if value.is_empty() {
                        self.registers.borrow_mut().remove(&item);
                    } else {
                        self.set_register(item, value);
                    }
                    answer[1] = HEADER_LEN;
                }
                _ => {}
            }
            answer
        }
    }

    impl HidTransport for MockTransport {
        fn enumerate(&mut self, vid: u16, pid: u16) -> Result<Vec<DiscoveredDevice>> {
            Ok(self
                .attached
                .iter()
                .filter(|d| d.vid == vid && d.pid == pid)
                .cloned()
                .collect())
        }

        fn open_path(&mut self, path: &str) -> Result<HidHandle> {
            if self.fail_open.contains(path) {
                return Err(DeviceError::OpenFailed(format!("mock: {path} refused")));
            }
            if !self.attached.iter().any(|d| d.path == path) {
                return Err(DeviceError::OpenFailed(format!("mock: no device at {path}")));
            }
            Ok(self.issue(path))
        }

        fn open_serial(&mut self, vid: u16, pid: u16, serial: &str) -> Result<HidHandle> {
            let path = self
                .attached
                .iter()
                .find(|d| d.vid == vid && d.pid == pid && d.serial.as_deref() == Some(serial))
                .map(|d| d.path.clone())
                .ok_or_else(|| DeviceError::OpenFailed(format!("mock: no serial {serial}")))?;
            self.open_path(&path)
        }

        fn close(&mut self, handle: HidHandle) {
            self.closed.borrow_mut().push(handle);
            self.open.borrow_mut().remove(&handle);
        }

        fn exchange(&self, handle: HidHandle, frame: &mut [u8; FRAME_SIZE]) -> Result<usize> {
            if !self.is_open(handle) {
                return Err(DeviceError::NotOpen);
            }
            self.requests.borrow_mut().push(*frame);
            if self.fail_exchange.get() {
                return Err(DeviceError::Transport("mock: device unplugged".into()));
            }
            let answer = match self.responses.borrow_mut().pop_front() {
                Some(canned) => canned,
                None => self.emulate(frame),
            };
            *frame = answer;
            Ok(FRAME_SIZE)
        }
    }
}
