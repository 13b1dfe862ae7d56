//! Device registry: enumeration cache and identity resolution.
//!
//! The registry keeps one [`DeviceDescriptor`] per attached scanner, sorted
//! by serial number so indices are stable across runs with the same set of
//! devices. It is refilled from scratch by [`Registry::enumerate`]; entries
//! are never removed one by one.

use std::fmt;

use serde::Serialize;

use crate::models::KNOWN_MODELS;
use crate::transport::{DeviceError, HidHandle, HidTransport, Result};

/// Maximum number of cached devices. Extra devices are dropped.
pub const MAX_DEVICES: usize = 16;

/// Longest platform path kept in the cache, in bytes.
pub const PATH_MAX_LEN: usize = 128;

/// A cached scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    pub path: String,
    pub serial: String,
    pub vid: u16,
    pub pid: u16,
    /// Set while the device is open through [`Registry::open`].
    pub handle: Option<HidHandle>,
}

// ── Selectors ──

/// How a caller names a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    /// Position in the sorted cache.
    ByIndex(usize),
    BySerial(String),
    /// Platform path; may name a device the cache has never seen.
    ByPath(String),
}

impl DeviceSelector {
    /// Interpret a legacy numeric id.
    ///
    /// Small values are cache indices. Anything above [`MAX_DEVICES`] is a
    /// serial number written as 8 uppercase hex digits.
    pub fn from_legacy_id(id: u32) -> Self {
        if id as usize > MAX_DEVICES {
            DeviceSelector::BySerial(format!("{id:08X}"))
        } else {
            DeviceSelector::ByIndex(id as usize)
        }
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelector::ByIndex(i) => write!(f, "index {i}"),
            DeviceSelector::BySerial(s) => write!(f, "serial {s}"),
            DeviceSelector::ByPath(p) => write!(f, "path {p}"),
        }
    }
}

/// Result of a successful [`Registry::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenedDevice {
    pub handle: HidHandle,
    /// Cache entry now holding the handle, or `None` when the device was
    /// opened by a path the cache does not know.
    pub index: Option<usize>,
}

// ── Registry ──

#[derive(Debug, Default)]
pub struct Registry {
    devices: Vec<DeviceDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the cache from every known model signature.
    ///
    /// Returns the number of cached devices.
    pub fn enumerate(&mut self, transport: &mut impl HidTransport) -> Result<usize> {
        if self.devices.iter().any(|d| d.handle.is_some()) {
            log::debug!("enumerate: dropping handles of open devices from the cache");
        }
        self.devices.clear();
        for model in KNOWN_MODELS {
            self.enumerate_by_vid_pid(transport, model.vid, model.pid)?;
        }
        log::debug!("enumerate: {} device(s) cached", self.devices.len());
        Ok(self.devices.len())
    }

    /// Append devices matching one `vid`/`pid` pair, then re-sort.
    ///
    /// Returns the number of devices appended by this call.
    pub fn enumerate_by_vid_pid(
        &mut self,
        transport: &mut impl HidTransport,
        vid: u16,
        pid: u16,
    ) -> Result<usize> {
        let found = transport.enumerate(vid, pid)?;
        let mut added = 0;
        for dev in found {
            if dev.vid == 0 || dev.pid == 0 || dev.vid != vid || dev.pid != pid {
                continue;
            }
            let Some(serial) = dev.serial else {
                log::debug!("skipping {} (no serial number)", dev.path);
                continue;
            };
            if dev.path.len() > PATH_MAX_LEN {
                log::warn!(
                    "skipping device {serial}: path is {} bytes (limit {PATH_MAX_LEN})",
                    dev.path.len()
                );
                continue;
            }
            if self.devices.len() >= MAX_DEVICES {
                log::warn!(
                    "device cache full ({MAX_DEVICES}), ignoring {} (serial {serial})",
                    dev.path
                );
                break;
            }
            log::debug!("found {vid:04X}:{pid:04X} serial {serial} at {}", dev.path);
            self.devices.push(DeviceDescriptor {
                path: dev.path,
                serial,
                vid: dev.vid,
                pid: dev.pid,
                handle: None,
            });
            added += 1;
        }
        // Stable, byte-wise: equal serials keep discovery order.
        self.devices.sort_by(|a, b| a.serial.cmp(&b.serial));
        Ok(added)
    }

    // ── Lookups ──

    pub fn index_by_path(&self, path: &str) -> Option<usize> {
        self.devices.iter().position(|d| d.path == path)
    }

    pub fn index_by_serial(&self, serial: &str) -> Option<usize> {
        self.devices.iter().position(|d| d.serial == serial)
    }

    pub fn index_by_handle(&self, handle: HidHandle) -> Option<usize> {
        self.devices.iter().position(|d| d.handle == Some(handle))
    }

    /// Resolve a selector to a cache index. Out-of-range indices resolve to
    /// `None`.
    pub fn resolve(&self, selector: &DeviceSelector) -> Option<usize> {
        match selector {
            DeviceSelector::ByIndex(i) => (*i < self.devices.len()).then_some(*i),
            DeviceSelector::BySerial(s) => self.index_by_serial(s),
            DeviceSelector::ByPath(p) => self.index_by_path(p),
        }
    }

    /// Resolve a legacy numeric id (see [`DeviceSelector::from_legacy_id`]).
    pub fn index_by_id(&self, id: u32) -> Option<usize> {
        self.resolve(&DeviceSelector::from_legacy_id(id))
    }

    // ── Accessors ──

    pub fn count(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DeviceDescriptor> {
        self.devices.get(index)
    }

    pub fn descriptors(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn cached_path(&self, index: usize) -> Option<&str> {
        self.get(index).map(|d| d.path.as_str())
    }

    pub fn cached_serial(&self, index: usize) -> Option<&str> {
        self.get(index).map(|d| d.serial.as_str())
    }

    pub fn cached_vid(&self, index: usize) -> Option<u16> {
        self.get(index).map(|d| d.vid)
    }

    pub fn cached_pid(&self, index: usize) -> Option<u16> {
        self.get(index).map(|d| d.pid)
    }

    pub fn serial_for_handle(&self, handle: HidHandle) -> Option<&str> {
        self.index_by_handle(handle)
            .and_then(|i| self.cached_serial(i))
    }

    // ── Open / close ──

    /// Open the device named by `selector` and record its handle.
    ///
    /// An entry that is already open hands back its existing handle.
    pub fn open(
        &mut self,
        transport: &mut impl HidTransport,
        selector: &DeviceSelector,
    ) -> Result<OpenedDevice> {
        if let DeviceSelector::ByPath(path) = selector
            && self.index_by_path(path).is_none()
        {
            let handle = transport.open_path(path)?;
            log::warn!("opened {path} as {handle}, but it is not in the device cache");
            return Ok(OpenedDevice {
                handle,
                index: None,
            });
        }

        let index = self.resolve(selector).ok_or(DeviceError::NotFound)?;
        let entry = &mut self.devices[index];
        if let Some(handle) = entry.handle {
            log::debug!("device {} already open as {handle}", entry.serial);
            return Ok(OpenedDevice {
                handle,
                index: Some(index),
            });
        }
        let handle = match selector {
            DeviceSelector::BySerial(_) => {
                transport.open_serial(entry.vid, entry.pid, &entry.serial)?
            }
            DeviceSelector::ByIndex(_) | DeviceSelector::ByPath(_) => {
                transport.open_path(&entry.path)?
            }
        };
        log::debug!("opened {} ({}) as {handle}", entry.serial, entry.path);
        entry.handle = Some(handle);
        Ok(OpenedDevice {
            handle,
            index: Some(index),
        })
    }

    /// Enumerate, then open the first device in serial order.
    pub fn open_first(&mut self, transport: &mut impl HidTransport) -> Result<OpenedDevice> {
        self.enumerate(transport)?;
        self.open(transport, &DeviceSelector::ByIndex(0))
    }

    /// Release `handle` and forget it. `None` and stale handles are ignored.
    pub fn close(&mut self, transport: &mut impl HidTransport, handle: Option<HidHandle>) {
        let Some(handle) = handle else {
            return;
        };
        if let Some(i) = self.index_by_handle(handle) {
            self.devices[i].handle = None;
        }
        transport.close(handle);
    }
}
