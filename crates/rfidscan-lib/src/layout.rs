//! Keyboard layouts the scanner can type badge numbers in.
//!
//! The layout is a single byte stored in register
//! [`REG_KEYBOARD_LAYOUT`](crate::protocol::REG_KEYBOARD_LAYOUT); the reader
//! picks it up after [`apply_config`](crate::ops::apply_config).

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RfidscanError;
use crate::protocol::REG_KEYBOARD_LAYOUT;
use crate::transport::{HidHandle, HidTransport, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyboardLayout {
    Qwerty,
    /// French desktop keyboard (full numeric row).
    AzertyDesktop,
    Qwertz,
    /// French laptop keyboard (shifted digits).
    AzertyLaptop,
}

impl KeyboardLayout {
    pub fn code(self) -> u8 {
        match self {
            KeyboardLayout::Qwerty => 0x00,
            KeyboardLayout::AzertyDesktop => 0x01,
            KeyboardLayout::Qwertz => 0x02,
            KeyboardLayout::AzertyLaptop => 0x03,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(KeyboardLayout::Qwerty),
            0x01 => Some(KeyboardLayout::AzertyDesktop),
            0x02 => Some(KeyboardLayout::Qwertz),
            0x03 => Some(KeyboardLayout::AzertyLaptop),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            KeyboardLayout::Qwerty => "qwerty",
            KeyboardLayout::AzertyDesktop => "azerty-desktop",
            KeyboardLayout::Qwertz => "qwertz",
            KeyboardLayout::AzertyLaptop => "azerty-laptop",
        }
    }
}

impl FromStr for KeyboardLayout {
    type Err = RfidscanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qwerty" => Ok(KeyboardLayout::Qwerty),
            "qwertz" => Ok(KeyboardLayout::Qwertz),
            "azerty-desktop" | "azerty-full" => Ok(KeyboardLayout::AzertyDesktop),
            "azerty" | "azerty-laptop" => Ok(KeyboardLayout::AzertyLaptop),
            _ => Err(RfidscanError::Parse(format!(
                "Invalid keyboard layout: {s} (use qwerty, azerty, azerty-desktop or qwertz)"
            ))),
        }
    }
}

impl fmt::Display for KeyboardLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Store `layout` in the layout register.
pub fn write_layout(
    transport: &impl HidTransport,
    handle: HidHandle,
    layout: KeyboardLayout,
) -> Result<()> {
    crate::ops::register_write(transport, handle, REG_KEYBOARD_LAYOUT, &[layout.code()])
}

/// Read the configured layout. `None` when unset or unrecognised.
pub fn read_layout(
    transport: &impl HidTransport,
    handle: HidHandle,
) -> Result<Option<KeyboardLayout>> {
    let value = crate::ops::register_read(transport, handle, REG_KEYBOARD_LAYOUT)?;
    Ok(value.first().copied().and_then(KeyboardLayout::from_code))
}
