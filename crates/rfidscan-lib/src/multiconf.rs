//! `.multiconf` configuration files.
//!
//! ```text
//! [general]
//! erase=1          ; wipe every register first
//!
//! [raw]
//! A0=03            # keyboard layout
//! 10=@hello
//! 20=              # erase register 0x20
//! ```
//!
//! Section names and `erase=1` are case-insensitive. Everything after `#`
//! or `;` is a comment. Lines outside `[general]` and `[raw]` are ignored,
//! as are raw lines whose key is not two characters long.

use std::path::Path;

use crate::error::{Result, RfidscanError};
use crate::register::{self, RegisterAddr, RegisterEntry};
use crate::transport::{HidHandle, HidTransport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Erase registers 0x00 to 0xFE.
    EraseAll,
    /// Write `value` to `addr` (an empty value erases it).
    Write { addr: RegisterAddr, value: Vec<u8> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Multiconf {
    pub directives: Vec<Directive>,
}

/// Progress reported by [`apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Erased,
    /// A register was written; the entry is what the reader returned on
    /// read-back.
    Written(RegisterEntry),
}

fn at_line(lineno: usize, e: RfidscanError) -> RfidscanError {
    match e {
        RfidscanError::Parse(msg) => RfidscanError::Parse(format!("line {}: {msg}", lineno + 1)),
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    General,
    Raw,
}

impl Multiconf {
    /// Parse the text of a multiconf file.
    pub fn parse(text: &str) -> Result<Self> {
        let mut section = Section::None;
        let mut directives = Vec::new();

        for (lineno, raw_line) in text.lines().enumerate() {
            let line = raw_line
                .split(['#', ';', '\r'])
                .next()
                .unwrap_or_default()
                .trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('[') {
                section = if line.eq_ignore_ascii_case("[general]") {
                    Section::General
                } else if line.eq_ignore_ascii_case("[raw]") {
                    Section::Raw
                } else {
                    log::debug!("line {}: skipping section {line}", lineno + 1);
                    Section::None
                };
                continue;
            }

            if section == Section::None {
                continue;
            }

            if line.eq_ignore_ascii_case("erase=1") {
                directives.push(Directive::EraseAll);
                continue;
            }

            if section == Section::Raw {
                let (key, value) = match line.split_once('=') {
                    Some((k, v)) => (k.trim(), v),
                    None => (line, ""),
                };
                if key.len() != 2 {
                    log::debug!("line {}: ignoring {line:?}", lineno + 1);
                    continue;
                }
                let addr: RegisterAddr = key.parse().map_err(|e| at_line(lineno, e))?;
                let value = register::parse_value(value).map_err(|e| at_line(lineno, e))?;
                directives.push(Directive::Write { addr, value });
            }
        }

        Ok(Multiconf { directives })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RfidscanError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open the configuration file '{}': {e}", path.display()),
            ))
        })?;
        Self::parse(&text)
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// Run every directive in file order, stopping at the first failure.
///
/// Each write is followed by a read-back, reported through `on_step`.
pub fn apply(
    transport: &impl HidTransport,
    handle: HidHandle,
    conf: &Multiconf,
    mut on_step: impl FnMut(&Step),
) -> Result<()> {
    for directive in &conf.directives {
        match directive {
            Directive::EraseAll => {
                register::erase_all(transport, handle)?;
                on_step(&Step::Erased);
            }
            Directive::Write { addr, value } => {
                let entry = register::write_and_verify(transport, handle, addr.get(), value)?;
                on_step(&Step::Written(entry));
            }
        }
    }
    Ok(())
}
