//! Model table: USB signatures of supported RFID scanners.
//!
//! Enumeration only looks for the signatures listed here. Unknown models
//! get `None` from `detect_model()`.

use serde::Serialize;

use crate::protocol::SPRINGCARD_VID;

/// A supported scanner model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScannerModel {
    pub vid: u16,
    pub pid: u16,
    pub name: &'static str,
}

// ── Prox'N'Roll ──

pub const PROXNROLL: ScannerModel = ScannerModel {
    vid: SPRINGCARD_VID,
    pid: 0x7241,
    name: "Prox'N'Roll RFID Scanner",
};

pub const PROXNROLL_HSP: ScannerModel = ScannerModel {
    vid: SPRINGCARD_VID,
    pid: 0xB241,
    name: "Prox'N'Roll RFID Scanner HSP",
};

/// Every signature enumeration walks through, in order.
pub const KNOWN_MODELS: &[ScannerModel] = &[PROXNROLL, PROXNROLL_HSP];

/// Look up the model for a `vid`/`pid` pair.
pub fn detect_model(vid: u16, pid: u16) -> Option<&'static ScannerModel> {
    KNOWN_MODELS.iter().find(|m| m.vid == vid && m.pid == pid)
}

/// Display name for a `vid`/`pid` pair, with a generic fallback.
pub fn model_name(vid: u16, pid: u16) -> &'static str {
    detect_model(vid, pid).map_or("Unknown RFID Scanner", |m| m.name)
}
