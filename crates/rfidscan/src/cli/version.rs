//! `version` subcommand: identity strings and firmware version.

use rfidscan_lib::identity;

use super::{DeviceReport, HidHandle, HidTransport, Result, kv_indent, kv_width};

pub(super) fn cmd_version<T: HidTransport>(
    transport: &T,
    handle: HidHandle,
    cached: Option<(u16, u16)>,
    json: bool,
) -> Result<DeviceReport> {
    let id = identity::read_identity(transport, handle)?;
    let vid_pid = match cached {
        Some((vid, pid)) => format!("{vid:04X}:{pid:04X}"),
        None => "(unknown)".to_string(),
    };

    if !json {
        let w = kv_width(
            &[],
            &["VID/PID:", "Vendor:", "Product:", "Serial number:", "Version:"],
        );
        println!("RFID Scanner {}:", id.serial);
        kv_indent("VID/PID:", &vid_pid, w);
        kv_indent("Vendor:", &id.vendor, w);
        kv_indent("Product:", &id.product, w);
        kv_indent("Serial number:", &id.serial, w);
        kv_indent("Version:", id.version_display(), w);
    }

    Ok(DeviceReport {
        serial: id.serial.clone(),
        identity: Some(id),
        registers: None,
    })
}
