//! `read`, `write`, `dump` and `write-conf` subcommands.

use std::str::FromStr;

use rfidscan_lib::multiconf::{self, Step};
use rfidscan_lib::register;

use super::{
    DeviceReport, HidHandle, HidTransport, Multiconf, RegisterAddr, RegisterEntry, Result,
    RfidscanError,
};

/// `<addr>=<value>` as given to `write`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Assignment {
    pub addr: RegisterAddr,
    pub value: Vec<u8>,
}

impl FromStr for Assignment {
    type Err = RfidscanError;

    /// A missing `=value` part means an empty value.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (addr, value) = s.split_once('=').unwrap_or((s, ""));
        Ok(Assignment {
            addr: addr.parse()?,
            value: register::parse_value(value)?,
        })
    }
}

fn report(entries: Vec<RegisterEntry>) -> DeviceReport {
    DeviceReport {
        serial: String::new(),
        identity: None,
        registers: Some(entries),
    }
}

pub(super) fn cmd_read<T: HidTransport>(
    transport: &T,
    handle: HidHandle,
    addr: RegisterAddr,
    json: bool,
) -> Result<DeviceReport> {
    let entry = register::read_entry(transport, handle, addr.get())?;
    if !json {
        println!("{entry}");
    }
    Ok(report(vec![entry]))
}

pub(super) fn cmd_write<T: HidTransport>(
    transport: &T,
    handle: HidHandle,
    assignment: &Assignment,
) -> Result<()> {
    let entry =
        register::write_and_verify(transport, handle, assignment.addr.get(), &assignment.value)?;
    msg!("{entry}");
    Ok(())
}

pub(super) fn cmd_dump<T: HidTransport>(
    transport: &T,
    handle: HidHandle,
    json: bool,
) -> Result<DeviceReport> {
    let entries = register::dump_registers(transport, handle)?;
    if !json {
        if entries.is_empty() {
            println!("No register defined in this RFID Scanner");
        }
        for entry in &entries {
            println!("{entry}");
        }
    }
    Ok(report(entries))
}

pub(super) fn cmd_write_conf<T: HidTransport>(
    transport: &T,
    handle: HidHandle,
    conf: &Multiconf,
) -> Result<()> {
    if conf.is_empty() {
        log::warn!("configuration file holds no register");
        return Ok(());
    }
    multiconf::apply(transport, handle, conf, |step| match step {
        Step::Erased => msg!("All registers erased"),
        Step::Written(entry) => msg!("{entry}"),
    })
}
