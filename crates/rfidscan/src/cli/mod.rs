//! CLI subcommands: scanner listing, LEDs and buzzer, register access.

/// Informational output, silenced by `--quiet` and `--json`.
macro_rules! msg {
    ($($arg:tt)*) => {
        if !crate::QUIET.load(std::sync::atomic::Ordering::Relaxed) {
            println!($($arg)*);
        }
    };
}

mod config_cmd;
mod ids;
mod layout_cmd;
mod leds;
mod list;
mod registers;
mod version;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Subcommand;
use serde::Serialize;

pub(super) use rfidscan_lib::config::Config;
pub(super) use rfidscan_lib::error::{Result, RfidscanError};
pub(super) use rfidscan_lib::identity::Identity;
pub(super) use rfidscan_lib::layout::KeyboardLayout;
pub(super) use rfidscan_lib::models;
pub(super) use rfidscan_lib::multiconf::Multiconf;
pub(super) use rfidscan_lib::ops::{self, AccessStatus};
pub(super) use rfidscan_lib::register::{RegisterAddr, RegisterEntry};
pub(super) use rfidscan_lib::registry::DeviceDescriptor;
pub(super) use rfidscan_lib::transport::HidApiTransport;
pub(super) use rfidscan_lib::{DeviceError, DeviceSelector, HidHandle, HidTransport, Registry};

use ids::IdSelection;
use registers::Assignment;

const PADDING: usize = 2;

/// Pause between the colour steps of `test`.
const TEST_STEP: Duration = Duration::from_secs(1);

/// Alignment width for a command's key-value output: at least PADDING
/// spaces after the longest key, top-level and indented values aligned.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{key:<width$}{value}", width = w);
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    println!("{text}");
    Ok(())
}

/// Load the config from `custom_path` or the default location, logging
/// parse problems instead of failing.
pub(super) fn load_config(custom_path: Option<&Path>) -> Config {
    match custom_path {
        Some(path) => {
            let (config, warnings) = Config::load_from(path);
            for w in &warnings {
                log::warn!("{w}");
            }
            config
        }
        None => Config::load(),
    }
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
}

#[derive(Serialize)]
pub(super) struct ListOutput {
    pub count: usize,
    pub devices: Vec<ListedDevice>,
}

#[derive(Serialize)]
pub(super) struct ListedDevice {
    pub id: usize,
    pub model: String,
    #[serde(flatten)]
    pub descriptor: DeviceDescriptor,
}

/// What one scanner answered to `version`, `read` or `dump`.
#[derive(Serialize)]
pub(super) struct DeviceReport {
    pub serial: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registers: Option<Vec<RegisterEntry>>,
}

#[derive(Serialize)]
pub(super) struct ReportOutput {
    pub devices: Vec<DeviceReport>,
}

// ── Commands ──

#[derive(Subcommand)]
pub enum Command {
    /// List attached RFID scanners
    List,

    /// Show vendor, product, serial number and firmware version
    Version,

    /// Set the red, green and blue LEDs, e.g. `leds fast,fastinv,off`
    ///
    /// Modes: off on slow auto fast heart slowinv fastinv heartinv half
    /// halfinv type field default float ignore. Channels left out keep
    /// `default`; unknown names are ignored.
    Leds {
        /// Comma-separated modes for red, green and blue
        modes: String,
        /// Return to the default after this many milliseconds
        #[arg(long, value_name = "MS")]
        during: Option<u16>,
    },

    /// Give the LEDs back to the reader
    LedsDefault,

    /// Sound the buzzer
    Beep {
        /// Duration in milliseconds (default: beep_ms from the config)
        #[arg(long, value_name = "MS")]
        during: Option<u16>,
    },

    /// Set the keyboard layout badge numbers are typed in
    Layout {
        /// qwerty, azerty (laptop), azerty-desktop or qwertz
        layout: KeyboardLayout,
    },

    /// Read one configuration register
    Read {
        /// Register address, two hex digits (01 to FE)
        addr: RegisterAddr,
    },

    /// Write one configuration register
    Write {
        /// `<addr>=<value>`: hex bytes (`10=01:02`), ASCII (`10=@text`), or
        /// nothing to erase (`10=`)
        assignment: Assignment,
    },

    /// Print every defined configuration register
    Dump,

    /// Load a .multiconf file into the scanner
    WriteConf {
        /// Path to the .multiconf file
        file: PathBuf,
    },

    /// Cycle through the LEDs and buzzer to check the scanner works
    Test,

    /// Show current configuration and file path
    Config,
}

/// Options shared by every subcommand.
pub struct Globals {
    pub json: bool,
    pub ids: Option<String>,
    pub password: Option<String>,
    pub reset: bool,
    pub config_path: Option<PathBuf>,
}

/// A command with its arguments validated, ready to run per scanner.
pub(super) enum Action {
    List,
    Version,
    Leds {
        codes: [u8; 3],
        during: Option<u16>,
    },
    Beep(u16),
    Layout(KeyboardLayout),
    Read(RegisterAddr),
    Write(Assignment),
    Dump,
    WriteConf(Multiconf),
    Test(Duration),
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Version => "version",
            Action::Leds { .. } => "leds",
            Action::Beep(_) => "beep",
            Action::Layout(_) => "layout",
            Action::Read(_) => "read",
            Action::Write(_) => "write",
            Action::Dump => "dump",
            Action::WriteConf(_) => "write-conf",
            Action::Test(_) => "test",
        }
    }

    /// LEDs, buzzer and identity work on protected scanners too.
    fn needs_access(&self) -> bool {
        !matches!(
            self,
            Action::List | Action::Version | Action::Leds { .. } | Action::Beep(_)
        )
    }

    fn supports_json(&self) -> bool {
        matches!(
            self,
            Action::List | Action::Version | Action::Read(_) | Action::Dump
        )
    }
}

/// Everything a session needs besides the action.
pub(super) struct Session {
    pub json: bool,
    pub ids: Option<IdSelection>,
    /// Serial to use when no `--id` is given. Empty = every scanner.
    pub preferred_serial: String,
    pub password: Option<[u8; 2]>,
    pub reset: bool,
}

impl Session {
    fn new(globals: &Globals, config: &Config) -> Result<Self> {
        let password = match &globals.password {
            Some(p) => Some(rfidscan_lib::config::parse_password(p)?),
            None => config.password_bytes()?,
        };
        let ids = globals.ids.as_deref().map(ids::parse_ids).transpose()?;
        Ok(Session {
            json: globals.json,
            ids,
            preferred_serial: config.device_serial.trim().to_string(),
            password,
            reset: globals.reset || config.apply_after_write,
        })
    }
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, globals: &Globals) -> Result<()> {
    let config = load_config(globals.config_path.as_deref());
    let action = match cmd {
        Command::Config => {
            return config_cmd::cmd_config(globals.json, globals.config_path.as_deref());
        }
        Command::List => Action::List,
        Command::Version => Action::Version,
        Command::Leds { modes, during } => Action::Leds {
            codes: rfidscan_lib::led::codes(rfidscan_lib::led::parse_triple(&modes)),
            during,
        },
        Command::LedsDefault => Action::Leds {
            codes: leds::DEFAULT_CODES,
            during: None,
        },
        Command::Beep { during } => {
            Action::Beep(during.filter(|&ms| ms > 0).unwrap_or(config.beep_ms))
        }
        Command::Layout { layout } => Action::Layout(layout),
        Command::Read { addr } => Action::Read(addr),
        Command::Write { assignment } => Action::Write(assignment),
        Command::Dump => Action::Dump,
        Command::WriteConf { file } => Action::WriteConf(Multiconf::load(&file)?),
        Command::Test => Action::Test(TEST_STEP),
    };
    if globals.json && !action.supports_json() {
        warn_json_unsupported(action.name());
    }

    let session = Session::new(globals, &config)?;
    let mut transport = HidApiTransport::new()?;
    run_session(&mut transport, &action, &session)
}

// ── Session ──

/// Enumerate, then run `action` on every selected scanner in turn.
///
/// Each scanner is closed before the next one is opened. The first
/// failure ends the session.
pub(super) fn run_session<T: HidTransport>(
    transport: &mut T,
    action: &Action,
    session: &Session,
) -> Result<()> {
    let mut registry = Registry::new();
    let count = registry.enumerate(transport)?;

    if let Action::List = action {
        return list::cmd_list(&registry, session.json);
    }
    if count == 0 {
        return Err(DeviceError::NotFound.into());
    }
    msg!(
        "{count} RFID Scanner{} found",
        if count == 1 { "" } else { "s" }
    );

    let targets = ids::resolve_targets(&registry, session.ids.as_ref(), &session.preferred_serial);
    let mut reports = Vec::new();
    for (n, selector) in targets.iter().enumerate() {
        log::debug!("target {}/{}: {selector}", n + 1, targets.len());
        let opened = registry.open(transport, selector)?;
        let serial = registry
            .serial_for_handle(opened.handle)
            .unwrap_or_default()
            .to_string();
        if targets.len() > 1 {
            msg!("Working on RFID Scanner {serial} ({}/{})", n + 1, targets.len());
        }
        let cached = opened.index.and_then(|i| registry.get(i)).map(|d| (d.vid, d.pid));
        let result = run_on_device(&*transport, opened.handle, cached, action, session);
        registry.close(transport, Some(opened.handle));
        if let Some(mut report) = result? {
            report.serial = serial;
            reports.push(report);
        }
    }

    if session.json && action.supports_json() {
        print_json(&ReportOutput { devices: reports })?;
    }
    Ok(())
}

fn require_access<T: HidTransport>(
    transport: &T,
    handle: HidHandle,
    password: Option<[u8; 2]>,
) -> Result<()> {
    let status = ops::check_access(transport, handle, password)?;
    log::debug!("access check on {handle}: {status:?}");
    if status == AccessStatus::Granted {
        msg!("{}", status.message());
    }
    if status.is_allowed() {
        Ok(())
    } else {
        Err(RfidscanError::Access(status.message().to_string()))
    }
}

/// `cached` is the VID/PID pair from enumeration, when the registry knows
/// the scanner.
fn run_on_device<T: HidTransport>(
    transport: &T,
    handle: HidHandle,
    cached: Option<(u16, u16)>,
    action: &Action,
    session: &Session,
) -> Result<Option<DeviceReport>> {
    if action.needs_access() {
        require_access(transport, handle, session.password)?;
    }

    let report = match action {
        Action::List => None,
        Action::Version => Some(version::cmd_version(transport, handle, cached, session.json)?),
        Action::Leds { codes, during } => {
            leds::cmd_leds(transport, handle, *codes, *during)?;
            None
        }
        Action::Beep(ms) => {
            leds::cmd_beep(transport, handle, *ms)?;
            None
        }
        Action::Layout(layout) => {
            layout_cmd::cmd_layout(transport, handle, *layout)?;
            None
        }
        Action::Read(addr) => Some(registers::cmd_read(transport, handle, *addr, session.json)?),
        Action::Write(assignment) => {
            registers::cmd_write(transport, handle, assignment)?;
            None
        }
        Action::Dump => Some(registers::cmd_dump(transport, handle, session.json)?),
        Action::WriteConf(conf) => {
            registers::cmd_write_conf(transport, handle, conf)?;
            None
        }
        Action::Test(step) => {
            leds::cmd_test(transport, handle, *step)?;
            None
        }
    };

    if session.reset {
        msg!("Applying the new configuration...");
        ops::apply_config(transport, handle)?;
    }
    Ok(report)
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn kv_width_top_only() {
        let w = kv_width(&["Short:", "Longer key:"], &[]);
        // "Longer key:" = 11 + PADDING = 13
        assert_eq!(w, 13);
    }

    #[test]
    fn kv_width_indent_drives_width() {
        let w = kv_width(&["A:"], &["Serial number:"]);
        // "Serial number:" = 14 + PADDING + 2 = 18
        assert_eq!(w, 18);
    }

    #[test]
    fn values_align_across_levels() {
        let w = kv_width(&["Config file:"], &["beep_ms:"]);
        let top = format_kv("Config file:", "V", w);
        let indent = format!("  {:<width$}{}", "beep_ms:", "V", width = w - 2);
        assert_eq!(top.find('V'), indent.find('V'));
    }

    #[test]
    fn format_kv_exact_width() {
        // Key longer than the width gets no padding
        assert_eq!(format_kv("ExactWidth:", "val", 10), "ExactWidth:val");
    }

    #[test]
    fn kv_width_empty_both() {
        assert_eq!(kv_width(&[], &[]), 0);
    }
}

#[cfg(test)]
mod json_struct_tests {
    use super::*;

    #[test]
    fn listed_device_flattens_descriptor() {
        let dev = ListedDevice {
            id: 0,
            model: "Prox'N'Roll RFID Scanner".into(),
            descriptor: DeviceDescriptor {
                path: "/dev/hidraw3".into(),
                serial: "1A2B3C4D".into(),
                vid: 0x1C34,
                pid: 0x7241,
                handle: None,
            },
        };
        let json = serde_json::to_value(&dev).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["serial"], "1A2B3C4D");
        assert_eq!(obj["vid"], 0x1C34);
        assert!(obj.contains_key("model"));
        assert!(obj.contains_key("path"));
    }

    #[test]
    fn device_report_omits_missing_parts() {
        let report = DeviceReport {
            serial: "1A2B3C4D".into(),
            identity: None,
            registers: Some(vec![RegisterEntry::new(0x10, &[0x01])]),
        };
        let json = serde_json::to_value(&report).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["registers"][0]["value"], "01");
    }
}

#[cfg(test)]
mod session_tests {
    use super::*;
    use rfidscan_lib::protocol::{REG_KEYBOARD_LAYOUT, REG_PASSWORD};
    use rfidscan_lib::transport::mock::MockTransport;

    fn session() -> Session {
        Session {
            json: false,
            ids: None,
            preferred_serial: String::new(),
            password: None,
            reset: false,
        }
    }

    fn two_readers() -> MockTransport {
        let mut t = MockTransport::new();
        t.attach("/dev/hidraw4", Some("2B000001"), 0x1C34, 0x7241);
        t.attach("/dev/hidraw1", Some("1A000001"), 0x1C34, 0x7241);
        t
    }

    #[test]
    fn no_scanner_is_not_found() {
        let mut t = MockTransport::new();
        let err = run_session(&mut t, &Action::Dump, &session()).unwrap_err();
        assert!(matches!(err, RfidscanError::Device(DeviceError::NotFound)));
    }

    #[test]
    fn list_without_scanner_succeeds() {
        let mut t = MockTransport::new();
        run_session(&mut t, &Action::List, &session()).unwrap();
    }

    #[test]
    fn runs_on_every_scanner_and_closes_them() {
        let mut t = two_readers();
        let action = Action::Layout(KeyboardLayout::Qwertz);
        run_session(&mut t, &action, &session()).unwrap();
        assert_eq!(t.register(REG_KEYBOARD_LAYOUT), Some(vec![0x02]));
        assert_eq!(t.closed.borrow().len(), 2);
        assert!(t.open.borrow().is_empty());
    }

    #[test]
    fn preferred_serial_limits_targets() {
        let mut t = two_readers();
        let s = Session {
            preferred_serial: "2B000001".into(),
            ..session()
        };
        run_session(&mut t, &Action::Beep(30), &s).unwrap();
        assert_eq!(t.request_count(), 1);
        assert_eq!(t.closed.borrow().len(), 1);
    }

    #[test]
    fn protected_scanner_refuses_without_password() {
        let mut t = two_readers();
        t.set_register(REG_PASSWORD, &[0x12, 0x34]);
        let err = run_session(&mut t, &Action::Dump, &session()).unwrap_err();
        assert!(matches!(err, RfidscanError::Access(_)));
        assert!(err.to_string().contains("--password"));
        // The scanner is still released
        assert!(t.open.borrow().is_empty());
    }

    #[test]
    fn protected_scanner_accepts_password() {
        let mut t = two_readers();
        t.set_register(REG_PASSWORD, &[0x12, 0x34]);
        let s = Session {
            password: Some([0x12, 0x34]),
            ..session()
        };
        let action = Action::Write("10=@ok".parse().unwrap());
        run_session(&mut t, &action, &s).unwrap();
        assert_eq!(t.register(0x10), Some(b"ok".to_vec()));
    }

    #[test]
    fn leds_skip_the_access_check() {
        let mut t = two_readers();
        t.set_register(REG_PASSWORD, &[0xFF, 0xFF]);
        let action = Action::Leds {
            codes: [4, 7, 0],
            during: None,
        };
        run_session(&mut t, &action, &session()).unwrap();
        // One LED request per scanner, no password read
        assert_eq!(t.request_count(), 2);
    }

    #[test]
    fn reset_applies_configuration_last() {
        let mut t = two_readers();
        let s = Session {
            ids: Some(IdSelection::List(vec![DeviceSelector::ByIndex(0)])),
            reset: true,
            ..session()
        };
        run_session(&mut t, &Action::Layout(KeyboardLayout::Qwerty), &s).unwrap();
        let req = t.last_request().unwrap();
        assert_eq!(&req[3..6], &[0x80, 0x00, 0xC0]);
    }

    #[test]
    fn unknown_serial_id_is_not_found() {
        let mut t = two_readers();
        let s = Session {
            ids: Some(IdSelection::List(vec![DeviceSelector::BySerial(
                "DEADBEEF".into(),
            )])),
            ..session()
        };
        let err = run_session(&mut t, &Action::Dump, &s).unwrap_err();
        assert!(matches!(err, RfidscanError::Device(DeviceError::NotFound)));
    }

    #[test]
    fn help_lists_every_subcommand() {
        use clap::CommandFactory;

        #[derive(clap::Parser)]
        struct Wrapper {
            #[command(subcommand)]
            command: Command,
        }

        let cmd = Wrapper::command();
        let names: Vec<&str> = cmd.get_subcommands().map(|c| c.get_name()).collect();
        for expected in [
            "list",
            "version",
            "leds",
            "leds-default",
            "beep",
            "layout",
            "read",
            "write",
            "dump",
            "write-conf",
            "test",
            "config",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
    }
}
