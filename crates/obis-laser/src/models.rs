//! OBIS model definitions.
//!
//! The LS (optically pumped semiconductor) and LX (diode) families share one
//! protocol and differ only in the modulation modes they accept. Each family
//! is described by an [`ObisModel`] returned from a factory function:
//!
//! | Model   | Baud | Modulation modes                                         |
//! |---------|------|----------------------------------------------------------|
//! | OBIS LS | 9600 | CWP, DIGITAL, ANALOG, MIXED                              |
//! | OBIS LX | 9600 | CWP, CWC, DIGITAL, DIGSO, ANALOG, MIXSO, MIXED           |

use std::fmt;
use std::str::FromStr;

use obis_core::error::{Error, Result};
use obis_transport::DEFAULT_BAUD_RATE;

/// Laser family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Ls,
    Lx,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Ls => write!(f, "LS"),
            Variant::Lx => write!(f, "LX"),
        }
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LS" => Ok(Variant::Ls),
            "LX" => Ok(Variant::Lx),
            _ => Err(Error::InvalidParameter(format!(
                "unknown OBIS variant {s:?} (expected LS or LX)"
            ))),
        }
    }
}

/// Which wire command carries a modulation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeClass {
    /// CW modes, set with `SOUR:AM:INT`.
    Internal,
    /// Modulated modes, set with `SOUR:AM:EXT`.
    External,
}

/// Modulation (operating) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModulationMode {
    /// Constant power.
    CwPower,
    /// Constant current (LX only).
    CwCurrent,
    Digital,
    /// Digital with power servo (LX only).
    DigitalPower,
    Analog,
    /// Mixed with power servo (LX only).
    MixedPower,
    Mixed,
}

impl ModulationMode {
    /// Every mode, in table order.
    pub const ALL: [ModulationMode; 7] = [
        ModulationMode::CwPower,
        ModulationMode::CwCurrent,
        ModulationMode::Digital,
        ModulationMode::DigitalPower,
        ModulationMode::Analog,
        ModulationMode::MixedPower,
        ModulationMode::Mixed,
    ];

    /// Wire value.
    pub fn as_wire(self) -> &'static str {
        match self {
            ModulationMode::CwPower => "CWP",
            ModulationMode::CwCurrent => "CWC",
            ModulationMode::Digital => "DIGITAL",
            ModulationMode::DigitalPower => "DIGSO",
            ModulationMode::Analog => "ANALOG",
            ModulationMode::MixedPower => "MIXSO",
            ModulationMode::Mixed => "MIXED",
        }
    }

    /// Parse a wire value, regardless of variant.
    pub fn from_wire(value: &str) -> Result<Self> {
        ModulationMode::ALL
            .iter()
            .copied()
            .find(|m| m.as_wire() == value)
            .ok_or_else(|| Error::Protocol(format!("unknown modulation mode: {value:?}")))
    }

    /// Internal (CW) or external.
    pub fn class(self) -> ModeClass {
        match self {
            ModulationMode::CwPower | ModulationMode::CwCurrent => ModeClass::Internal,
            _ => ModeClass::External,
        }
    }
}

impl fmt::Display for ModulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for ModulationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ModulationMode::from_wire(&s.to_ascii_uppercase())
    }
}

const LS_MODES: &[ModulationMode] = &[
    ModulationMode::CwPower,
    ModulationMode::Digital,
    ModulationMode::Analog,
    ModulationMode::Mixed,
];

const LX_MODES: &[ModulationMode] = &ModulationMode::ALL;

/// Static definition of an OBIS laser family.
#[derive(Debug, Clone)]
pub struct ObisModel {
    /// Human-readable name (e.g. "OBIS LX").
    pub name: &'static str,
    pub variant: Variant,
    /// Baud rate of the USB virtual COM port and RS-232 interface.
    pub default_baud_rate: u32,
    /// Modulation modes the family accepts.
    pub modes: &'static [ModulationMode],
}

impl ObisModel {
    /// Look up the model for a variant.
    pub fn for_variant(variant: Variant) -> ObisModel {
        match variant {
            Variant::Ls => obis_ls(),
            Variant::Lx => obis_lx(),
        }
    }

    /// Whether `mode` is accepted by this family.
    pub fn supports(&self, mode: ModulationMode) -> bool {
        self.modes.contains(&mode)
    }

    /// The subset of this family's modes set through `SOUR:AM:INT`.
    pub fn internal_modes(&self) -> impl Iterator<Item = ModulationMode> + '_ {
        self.modes
            .iter()
            .copied()
            .filter(|m| m.class() == ModeClass::Internal)
    }
}

/// OBIS LS.
pub fn obis_ls() -> ObisModel {
    ObisModel {
        name: "OBIS LS",
        variant: Variant::Ls,
        default_baud_rate: DEFAULT_BAUD_RATE,
        modes: LS_MODES,
    }
}

/// OBIS LX.
pub fn obis_lx() -> ObisModel {
    ObisModel {
        name: "OBIS LX",
        variant: Variant::Lx,
        default_baud_rate: DEFAULT_BAUD_RATE,
        modes: LX_MODES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values() {
        let wire: Vec<_> = ModulationMode::ALL.iter().map(|m| m.as_wire()).collect();
        assert_eq!(
            wire,
            ["CWP", "CWC", "DIGITAL", "DIGSO", "ANALOG", "MIXSO", "MIXED"]
        );
        for mode in ModulationMode::ALL {
            assert_eq!(ModulationMode::from_wire(mode.as_wire()).unwrap(), mode);
        }
    }

    #[test]
    fn unknown_wire_value() {
        assert!(matches!(
            ModulationMode::from_wire("PULSED"),
            Err(Error::Protocol(_))
        ));
        // Wire values are case-sensitive; FromStr is not.
        assert!(ModulationMode::from_wire("analog").is_err());
        assert_eq!("analog".parse::<ModulationMode>().unwrap(), ModulationMode::Analog);
    }

    #[test]
    fn classes() {
        assert_eq!(ModulationMode::CwPower.class(), ModeClass::Internal);
        assert_eq!(ModulationMode::CwCurrent.class(), ModeClass::Internal);
        for mode in [
            ModulationMode::Digital,
            ModulationMode::DigitalPower,
            ModulationMode::Analog,
            ModulationMode::MixedPower,
            ModulationMode::Mixed,
        ] {
            assert_eq!(mode.class(), ModeClass::External, "{mode}");
        }
    }

    #[test]
    fn ls_modes() {
        let ls = obis_ls();
        assert_eq!(ls.variant, Variant::Ls);
        assert_eq!(ls.default_baud_rate, 9600);
        assert_eq!(ls.modes.len(), 4);
        assert!(ls.supports(ModulationMode::Analog));
        assert!(!ls.supports(ModulationMode::CwCurrent));
        assert!(!ls.supports(ModulationMode::DigitalPower));
        assert!(!ls.supports(ModulationMode::MixedPower));
        assert_eq!(
            ls.internal_modes().collect::<Vec<_>>(),
            [ModulationMode::CwPower]
        );
    }

    #[test]
    fn lx_modes() {
        let lx = obis_lx();
        assert_eq!(lx.modes.len(), 7);
        assert!(ModulationMode::ALL.iter().all(|m| lx.supports(*m)));
        assert_eq!(
            lx.internal_modes().collect::<Vec<_>>(),
            [ModulationMode::CwPower, ModulationMode::CwCurrent]
        );
    }

    #[test]
    fn variant_parse() {
        assert_eq!("lx".parse::<Variant>().unwrap(), Variant::Lx);
        assert_eq!("LS".parse::<Variant>().unwrap(), Variant::Ls);
        assert!(matches!(
            "LZ".parse::<Variant>(),
            Err(Error::InvalidParameter(_))
        ));
        assert_eq!(ObisModel::for_variant(Variant::Lx).name, "OBIS LX");
        assert_eq!(Variant::Ls.to_string(), "LS");
    }
}
