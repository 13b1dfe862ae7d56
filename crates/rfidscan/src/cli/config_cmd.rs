//! `config` subcommand: show current configuration and file path.

use std::path::Path;

use super::{Config, ConfigOutput, Result, kv, kv_indent, kv_width, print_json};

pub(super) fn cmd_config(json: bool, custom_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(custom_path);
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());

    if json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
        };
        return print_json(&output);
    }

    // Human-readable output
    let w = kv_width(
        &["Config file:"],
        &["beep_ms:", "password:", "device_serial:", "apply_after_write:"],
    );

    match &config_path {
        Some(p) => {
            if config_exists {
                kv("Config file:", format_args!("{} (loaded)", p.display()), w);
            } else {
                kv(
                    "Config file:",
                    format_args!("{} (not found, using defaults)", p.display()),
                    w,
                );
            }
        }
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    kv_indent("beep_ms:", config.beep_ms, w);
    let password = match config.password_bytes() {
        Ok(None) => "(none)".to_string(),
        Ok(Some(_)) => "(set)".to_string(),
        Err(_) => format!("{:?} (invalid)", config.password),
    };
    kv_indent("password:", password, w);
    let serial = if config.device_serial.is_empty() {
        "(every scanner)"
    } else {
        config.device_serial.as_str()
    };
    kv_indent("device_serial:", serial, w);
    kv_indent("apply_after_write:", config.apply_after_write, w);

    if let Err(errors) = config.validate() {
        println!();
        println!("Problems:");
        for e in &errors {
            println!("  {e}");
        }
    }
    Ok(())
}
