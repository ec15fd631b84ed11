//! Decoding of the `SYST:STAT?` status code.
//!
//! The laser reports its state as an 8-character code such as `C8001002`.
//! Only the codes in the table below are accepted; anything else is an
//! [`Error::UnrecognizedStatus`].
//!
//! | Code       | State                                               |
//! |------------|-----------------------------------------------------|
//! | `CE000100` | key out, internal warmup                            |
//! | `CE000008` | key out, internal standby / laser ready internal    |
//! | `CE000500` | key out, external warmup                            |
//! | `CE000408` | key out, laser ready external mode                  |
//! | `CE000001` | key out, fault                                      |
//! | `C8001100` | key on, internal warmup                             |
//! | `C8001500` | key on, external warmup                             |
//! | `C8001002` | key on, laser ready internal mode                   |
//! | `C8001402` | key on, laser ready external mode                   |
//! | `CC000008` | key on, laser ready internal mode, interlock open   |
//! | `CC000408` | key on, laser ready external mode, interlock open   |
//! | `C8001001` | key on, fault                                       |
//! | `C8000100` | key armed early, internal warmup                    |
//! | `C8000500` | key armed early, external warmup                    |
//! | `C8000008` | key armed early, laser ready internal mode          |
//! | `C8000408` | key armed early, laser ready external mode          |
//!
//! The "armed early" states appear when the laser is powered up with the key
//! already armed and autostart disabled.
//!
//! Whether the laser is warming up, faulted or ready is decided by the last
//! character of the code alone, see [`Readiness::classify`].

use std::fmt;

use obis_core::error::{Error, Result};

/// A named laser state decoded from a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    KeyOutIntWarmup,
    KeyOutIntStandby,
    KeyOutExtWarmup,
    KeyOutLaserReadyExtMode,
    KeyOutFault,
    KeyOnIntWarmup,
    KeyOnExtWarmup,
    KeyOnLaserReadyIntMode,
    KeyOnLaserReadyExtMode,
    /// An open interlock can only be detected with the key on.
    KeyOnLaserReadyIntModeInterlockOpen,
    KeyOnLaserReadyExtModeInterlockOpen,
    KeyOnFault,
    KeyArmedEarlyIntWarmup,
    KeyArmedEarlyExtWarmup,
    KeyArmedEarlyLaserReadyIntMode,
    KeyArmedEarlyLaserReadyExtMode,
}

const STATUS_TABLE: &[(&str, DeviceState)] = &[
    ("CE000100", DeviceState::KeyOutIntWarmup),
    ("CE000008", DeviceState::KeyOutIntStandby),
    ("CE000500", DeviceState::KeyOutExtWarmup),
    ("CE000408", DeviceState::KeyOutLaserReadyExtMode),
    ("CE000001", DeviceState::KeyOutFault),
    ("C8001100", DeviceState::KeyOnIntWarmup),
    ("C8001500", DeviceState::KeyOnExtWarmup),
    ("C8001002", DeviceState::KeyOnLaserReadyIntMode),
    ("C8001402", DeviceState::KeyOnLaserReadyExtMode),
    ("CC000008", DeviceState::KeyOnLaserReadyIntModeInterlockOpen),
    ("CC000408", DeviceState::KeyOnLaserReadyExtModeInterlockOpen),
    ("C8001001", DeviceState::KeyOnFault),
    ("C8000100", DeviceState::KeyArmedEarlyIntWarmup),
    ("C8000500", DeviceState::KeyArmedEarlyExtWarmup),
    ("C8000008", DeviceState::KeyArmedEarlyLaserReadyIntMode),
    ("C8000408", DeviceState::KeyArmedEarlyLaserReadyExtMode),
];

impl DeviceState {
    /// `CE000008` is reported both as internal standby and as ready in
    /// internal mode with the key out. Both names refer to the same state.
    pub const KEY_OUT_LASER_READY_INT_MODE: DeviceState = DeviceState::KeyOutIntStandby;

    /// Decode a raw status code. Surrounding whitespace is ignored.
    pub fn decode(raw: &str) -> Result<Self> {
        let code = raw.trim();
        STATUS_TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, state)| *state)
            .ok_or_else(|| Error::UnrecognizedStatus(code.to_string()))
    }

    /// The wire code for this state.
    pub fn code(self) -> &'static str {
        STATUS_TABLE
            .iter()
            .find(|(_, s)| *s == self)
            .map(|(c, _)| *c)
            .unwrap_or_default()
    }

    /// Readiness of this state, by the same rule as [`Readiness::classify`].
    pub fn readiness(self) -> Readiness {
        Readiness::classify(self.code())
    }

    /// Whether the key switch is in.
    pub fn key_on(self) -> bool {
        !matches!(
            self,
            DeviceState::KeyOutIntWarmup
                | DeviceState::KeyOutIntStandby
                | DeviceState::KeyOutExtWarmup
                | DeviceState::KeyOutLaserReadyExtMode
                | DeviceState::KeyOutFault
        )
    }

    /// Whether the safety interlock is reported open.
    pub fn interlock_open(self) -> bool {
        matches!(
            self,
            DeviceState::KeyOnLaserReadyIntModeInterlockOpen
                | DeviceState::KeyOnLaserReadyExtModeInterlockOpen
        )
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceState::KeyOutIntWarmup => "key out, internal warmup",
            DeviceState::KeyOutIntStandby => "key out, internal standby",
            DeviceState::KeyOutExtWarmup => "key out, external warmup",
            DeviceState::KeyOutLaserReadyExtMode => "key out, ready (external mode)",
            DeviceState::KeyOutFault => "key out, fault",
            DeviceState::KeyOnIntWarmup => "key on, internal warmup",
            DeviceState::KeyOnExtWarmup => "key on, external warmup",
            DeviceState::KeyOnLaserReadyIntMode => "key on, ready (internal mode)",
            DeviceState::KeyOnLaserReadyExtMode => "key on, ready (external mode)",
            DeviceState::KeyOnLaserReadyIntModeInterlockOpen => {
                "key on, ready (internal mode), interlock open"
            }
            DeviceState::KeyOnLaserReadyExtModeInterlockOpen => {
                "key on, ready (external mode), interlock open"
            }
            DeviceState::KeyOnFault => "key on, fault",
            DeviceState::KeyArmedEarlyIntWarmup => "key armed early, internal warmup",
            DeviceState::KeyArmedEarlyExtWarmup => "key armed early, external warmup",
            DeviceState::KeyArmedEarlyLaserReadyIntMode => {
                "key armed early, ready (internal mode)"
            }
            DeviceState::KeyArmedEarlyLaserReadyExtMode => {
                "key armed early, ready (external mode)"
            }
        };
        f.write_str(s)
    }
}

/// Coarse readiness derived from a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Readiness {
    /// Still warming up; poll again.
    WarmingUp,
    /// Faulted; stop waiting.
    Fault,
    /// Ready to emit.
    Ready,
}

impl Readiness {
    /// Classify a status code by its last character: `'0'` is warming up,
    /// `'1'` is a fault, anything else is ready.
    pub fn classify(code: &str) -> Self {
        match code.trim_end().chars().last() {
            Some('0') => Readiness::WarmingUp,
            Some('1') => Readiness::Fault,
            _ => Readiness::Ready,
        }
    }

    /// Whether polling should stop.
    pub fn is_terminal(self) -> bool {
        self != Readiness::WarmingUp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_code_decodes() {
        for (code, state) in STATUS_TABLE {
            assert_eq!(DeviceState::decode(code).unwrap(), *state, "{code}");
            assert_eq!(state.code(), *code);
        }
    }

    #[test]
    fn shared_code_alias() {
        assert_eq!(
            DeviceState::decode("CE000008").unwrap(),
            DeviceState::KEY_OUT_LASER_READY_INT_MODE
        );
        assert_eq!(
            DeviceState::KEY_OUT_LASER_READY_INT_MODE,
            DeviceState::KeyOutIntStandby
        );
    }

    #[test]
    fn unknown_code_is_rejected() {
        for raw in ["C8001003", "c8001002", "", "OK", "C800100"] {
            match DeviceState::decode(raw) {
                Err(Error::UnrecognizedStatus(code)) => assert_eq!(code, raw),
                other => panic!("{raw:?} decoded to {other:?}"),
            }
        }
    }

    #[test]
    fn decode_ignores_surrounding_whitespace() {
        assert_eq!(
            DeviceState::decode(" C8001402\r\n").unwrap(),
            DeviceState::KeyOnLaserReadyExtMode
        );
    }

    #[test]
    fn classify_by_last_character() {
        assert_eq!(Readiness::classify("C8001100"), Readiness::WarmingUp);
        assert_eq!(Readiness::classify("C8001500"), Readiness::WarmingUp);
        assert_eq!(Readiness::classify("C8001001"), Readiness::Fault);
        assert_eq!(Readiness::classify("CE000001"), Readiness::Fault);
        assert_eq!(Readiness::classify("C8001002"), Readiness::Ready);
        assert_eq!(Readiness::classify("C8001402"), Readiness::Ready);
        assert_eq!(Readiness::classify("CC000408"), Readiness::Ready);
        // Not in the table, but the rule still applies.
        assert_eq!(Readiness::classify("FFFFFFF0"), Readiness::WarmingUp);
    }

    #[test]
    fn state_readiness_matches_rule() {
        assert_eq!(DeviceState::KeyOnIntWarmup.readiness(), Readiness::WarmingUp);
        assert_eq!(DeviceState::KeyOnFault.readiness(), Readiness::Fault);
        assert_eq!(DeviceState::KeyOutIntStandby.readiness(), Readiness::Ready);
        assert!(Readiness::Fault.is_terminal());
        assert!(!Readiness::WarmingUp.is_terminal());
    }

    #[test]
    fn key_and_interlock_flags() {
        assert!(!DeviceState::KeyOutFault.key_on());
        assert!(DeviceState::KeyArmedEarlyIntWarmup.key_on());
        assert!(DeviceState::KeyOnLaserReadyExtModeInterlockOpen.interlock_open());
        assert!(!DeviceState::KeyOnLaserReadyExtMode.interlock_open());
    }

    #[test]
    fn display() {
        assert_eq!(DeviceState::KeyOnFault.to_string(), "key on, fault");
    }
}
