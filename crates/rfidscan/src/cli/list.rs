//! `list` subcommand: show the scanners found by enumeration.

use super::{ListOutput, ListedDevice, Registry, Result, models, print_json};

pub(super) fn cmd_list(registry: &Registry, json: bool) -> Result<()> {
    if json {
        let output = ListOutput {
            count: registry.count(),
            devices: registry
                .descriptors()
                .iter()
                .enumerate()
                .map(|(id, d)| ListedDevice {
                    id,
                    model: models::model_name(d.vid, d.pid).to_string(),
                    descriptor: d.clone(),
                })
                .collect(),
        };
        return print_json(&output);
    }

    if registry.is_empty() {
        println!("No RFID Scanner found.");
        return Ok(());
    }

    for (id, d) in registry.descriptors().iter().enumerate() {
        println!(
            "id:{id} - VID: {:04X}, PID: {:04X}, serial number: {}",
            d.vid, d.pid, d.serial
        );
        log::debug!("  {} at {}", models::model_name(d.vid, d.pid), d.path);
    }
    Ok(())
}
