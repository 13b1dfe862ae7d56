//! LED mode names.
//!
//! Every LED channel (red, green, blue) takes a mode code 0..=15. Users
//! name modes by word or short alias; unknown names fall back to
//! [`LedMode::Ignore`], which leaves that channel untouched.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LedMode {
    Off = 0,
    On = 1,
    Slow = 2,
    Auto = 3,
    Fast = 4,
    Heart = 5,
    SlowInv = 6,
    FastInv = 7,
    HeartInv = 8,
    Half = 9,
    HalfInv = 10,
    Type = 11,
    Field = 12,
    Default = 13,
    Float = 14,
    Ignore = 15,
}

/// `(mode, long name, short alias)`, in code order.
const MODES: [(LedMode, &str, &str); 16] = [
    (LedMode::Off, "off", "0"),
    (LedMode::On, "on", "1"),
    (LedMode::Slow, "slow", "s"),
    (LedMode::Auto, "auto", "a"),
    (LedMode::Fast, "fast", "f"),
    (LedMode::Heart, "heart", "h"),
    (LedMode::SlowInv, "slowinv", "si"),
    (LedMode::FastInv, "fastinv", "fi"),
    (LedMode::HeartInv, "heartinv", "hi"),
    (LedMode::Half, "half", "2"),
    (LedMode::HalfInv, "halfinv", "2i"),
    (LedMode::Type, "type", "t"),
    (LedMode::Field, "field", "rf"),
    (LedMode::Default, "default", "d"),
    (LedMode::Float, "float", "fl"),
    (LedMode::Ignore, "ignore", "_"),
];

impl LedMode {
    /// Look up a mode by name or alias (case-insensitive).
    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.trim();
        MODES
            .iter()
            .find(|(_, long, short)| s.eq_ignore_ascii_case(long) || s.eq_ignore_ascii_case(short))
            .map(|(mode, _, _)| *mode)
    }

    /// Like [`from_name`](Self::from_name), mapping unknown names to `Ignore`.
    pub fn parse_lenient(s: &str) -> Self {
        Self::from_name(s).unwrap_or_else(|| {
            log::warn!("unknown LED mode {s:?}, channel left unchanged");
            LedMode::Ignore
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        MODES[self as usize].1
    }

    /// Names accepted on the command line, for help text.
    pub fn all_names() -> impl Iterator<Item = &'static str> {
        MODES.iter().map(|(_, long, _)| *long)
    }
}

impl fmt::Display for LedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse `"<red>,<green>,<blue>"`.
///
/// Tokens may be separated by commas or spaces. Missing channels stay at
/// [`LedMode::Default`]; extra tokens are ignored.
pub fn parse_triple(s: &str) -> [LedMode; 3] {
    let mut modes = [LedMode::Default; 3];
    let tokens = s.split([',', ' ']).filter(|t| !t.is_empty());
    for (slot, token) in modes.iter_mut().zip(tokens) {
        *slot = LedMode::parse_lenient(token);
    }
    modes
}

/// Mode codes for `[red, green, blue]`, ready for [`crate::ops::set_leds`].
pub fn codes(modes: [LedMode; 3]) -> [u8; 3] {
    modes.map(LedMode::code)
}
