//! OBIS command tables.
//!
//! The OBIS command set is SCPI-derived. Commands are grouped into five
//! categories (session control, system information, system state,
//! operational and optional), plus the IEEE-488 common command `*RST`.
//! Within each category a command is either a *write* (carries a value
//! argument, acknowledged by `OK`) or a *query* (no argument, token ends in
//! `?`, answered by a value line followed by `OK`).
//!
//! Writes and queries are separate types so that the codec can only send a
//! query through [`CommandCodec::read`](crate::codec::CommandCodec::read) and
//! a write through [`CommandCodec::write`](crate::codec::CommandCodec::write).

use std::fmt;
use std::str::FromStr;

use obis_core::{Error, Result};

/// The category a command token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// IEEE-488 common commands (`*RST`).
    Ieee488,
    /// Communication and session settings (`SYST:COMM:*`, `SYST:STAT?`, ...).
    SessionControl,
    /// Identity and calibration data (`SYST:INF:*`, power limits).
    SystemInfo,
    /// Read-only runtime counters and measurements.
    SystemState,
    /// Output state, modulation source and power setpoint.
    Operational,
    /// Features present only on some heads.
    Optional,
}

/// A command that carries a value argument and is acknowledged by `OK`.
pub trait WriteCommand: Copy + fmt::Debug {
    /// The wire token, e.g. `SOUR:AM:STAT`.
    fn token(self) -> &'static str;
    /// The category the token belongs to.
    fn category(self) -> Category;
    /// Whether the token is sent with a value. Bare actions such as `*RST`
    /// return `false`.
    fn takes_argument(self) -> bool {
        true
    }
}

/// A command that carries no argument and is answered by a value line.
pub trait QueryCommand: Copy + fmt::Debug {
    /// The wire token, ending in `?`, e.g. `SOUR:AM:STAT?`.
    fn token(self) -> &'static str;
    /// The category the token belongs to.
    fn category(self) -> Category;
}

// ---------------------------------------------------------------
// IEEE-488
// ---------------------------------------------------------------

/// IEEE-488 common commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ieee488Command {
    /// `*RST` -- warm boot the laser.
    WarmBoot,
}

impl WriteCommand for Ieee488Command {
    fn token(self) -> &'static str {
        match self {
            Ieee488Command::WarmBoot => "*RST",
        }
    }

    fn category(self) -> Category {
        Category::Ieee488
    }

    fn takes_argument(self) -> bool {
        false
    }
}

// ---------------------------------------------------------------
// Session control
// ---------------------------------------------------------------

/// Session-control settings that can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionControlCommand {
    /// `SYST:COMM:HAND` -- handshaking (the `OK` acknowledgement) on/off.
    Handshaking,
    /// `SYST:COMM:PROM` -- interactive prompt on/off.
    Prompt,
    /// `SYST:AUT` -- start emitting automatically after warmup.
    Autostart,
    /// `SYST:INF:AMOD:TYP` -- analog modulation input impedance.
    AnalogModulationType,
    /// `SYST:IND:LAS` -- laser emission indicator LED.
    LaserIndicator,
    /// `SYST:ERR:CLE` -- clear the error queue.
    ErrorClear,
}

impl WriteCommand for SessionControlCommand {
    fn token(self) -> &'static str {
        match self {
            SessionControlCommand::Handshaking => "SYST:COMM:HAND",
            SessionControlCommand::Prompt => "SYST:COMM:PROM",
            SessionControlCommand::Autostart => "SYST:AUT",
            SessionControlCommand::AnalogModulationType => "SYST:INF:AMOD:TYP",
            SessionControlCommand::LaserIndicator => "SYST:IND:LAS",
            SessionControlCommand::ErrorClear => "SYST:ERR:CLE",
        }
    }

    fn category(self) -> Category {
        Category::SessionControl
    }

    fn takes_argument(self) -> bool {
        !matches!(self, SessionControlCommand::ErrorClear)
    }
}

/// Session-control queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionControlQuery {
    Handshaking,
    Prompt,
    Autostart,
    AnalogModulationType,
    /// `SYST:STAT?` -- the 8-character status code.
    SystemStatus,
    /// `SYST:FAUL?` -- the 8-character fault code.
    SystemFault,
    LaserIndicator,
    /// `SYST:ERR:COUN?` -- number of queued errors.
    ErrorCount,
    /// `SYST:ERR:NEX?` -- pop the next queued error.
    ErrorNext,
}

impl QueryCommand for SessionControlQuery {
    fn token(self) -> &'static str {
        match self {
            SessionControlQuery::Handshaking => "SYST:COMM:HAND?",
            SessionControlQuery::Prompt => "SYST:COMM:PROM?",
            SessionControlQuery::Autostart => "SYST:AUT?",
            SessionControlQuery::AnalogModulationType => "SYST:INF:AMOD:TYP?",
            SessionControlQuery::SystemStatus => "SYST:STAT?",
            SessionControlQuery::SystemFault => "SYST:FAUL?",
            SessionControlQuery::LaserIndicator => "SYST:IND:LAS?",
            SessionControlQuery::ErrorCount => "SYST:ERR:COUN?",
            SessionControlQuery::ErrorNext => "SYST:ERR:NEX?",
        }
    }

    fn category(self) -> Category {
        Category::SessionControl
    }
}

// ---------------------------------------------------------------
// System information
// ---------------------------------------------------------------

/// System-information fields that can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemInfoCommand {
    /// `SYST:INF:USER` -- free-form user text.
    User,
    /// `SYST:INF:FCD` -- field calibration date.
    FieldCalibrationDate,
    /// `SYST:INF:POW` -- rated power.
    Power,
}

impl WriteCommand for SystemInfoCommand {
    fn token(self) -> &'static str {
        match self {
            SystemInfoCommand::User => "SYST:INF:USER",
            SystemInfoCommand::FieldCalibrationDate => "SYST:INF:FCD",
            SystemInfoCommand::Power => "SYST:INF:POW",
        }
    }

    fn category(self) -> Category {
        Category::SystemInfo
    }
}

/// System-information queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemInfoQuery {
    Model,
    ManufacturingDate,
    CalibrationDate,
    SerialNumber,
    PartNumber,
    FirmwareVersion,
    ProtocolVersion,
    /// `SYST:INF:WAV?` -- center wavelength in nanometers.
    Wavelength,
    /// `SYST:INF:POW?` -- rated power in Watts.
    Power,
    Type,
    /// `SOUR:POW:NOM?` -- nominal output power in Watts.
    NominalPower,
    /// `SOUR:POW:LIM:LOW?` -- minimum settable power in Watts.
    PowerLimitLow,
    /// `SOUR:POW:LIM:HIGH?` -- maximum settable power in Watts.
    PowerLimitHigh,
    User,
    FieldCalibrationDate,
}

impl QueryCommand for SystemInfoQuery {
    fn token(self) -> &'static str {
        match self {
            SystemInfoQuery::Model => "SYST:INF:MOD?",
            SystemInfoQuery::ManufacturingDate => "SYST:INF:MDAT?",
            SystemInfoQuery::CalibrationDate => "SYST:INF:CDAT?",
            SystemInfoQuery::SerialNumber => "SYST:INF:SNUM?",
            SystemInfoQuery::PartNumber => "SYST:INF:PNUM?",
            SystemInfoQuery::FirmwareVersion => "SYST:INF:FVER?",
            SystemInfoQuery::ProtocolVersion => "SYST:INF:PVER?",
            SystemInfoQuery::Wavelength => "SYST:INF:WAV?",
            SystemInfoQuery::Power => "SYST:INF:POW?",
            SystemInfoQuery::Type => "SYST:INF:TYP?",
            SystemInfoQuery::NominalPower => "SOUR:POW:NOM?",
            SystemInfoQuery::PowerLimitLow => "SOUR:POW:LIM:LOW?",
            SystemInfoQuery::PowerLimitHigh => "SOUR:POW:LIM:HIGH?",
            SystemInfoQuery::User => "SYST:INF:USER?",
            SystemInfoQuery::FieldCalibrationDate => "SYST:INF:FCD?",
        }
    }

    fn category(self) -> Category {
        Category::SystemInfo
    }
}

// ---------------------------------------------------------------
// System state (read only)
// ---------------------------------------------------------------

/// Read-only runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemStateQuery {
    /// `SYST:CYCL?` -- number of power cycles.
    Cycles,
    /// `SYST:HOUR?` -- hours powered on.
    Hours,
    /// `SYST:DIOD:HOUR?` -- hours the diode has emitted.
    DiodeHours,
    /// `SOUR:POW:LEV?` -- present output power in Watts.
    PowerLevel,
    /// `SOUR:POW:CURR?` -- present diode current in Amps.
    PowerCurrent,
    /// `SOUR:TEMP:BAS?` -- baseplate temperature, e.g. `24.9C`.
    BaseplateTemperature,
}

impl QueryCommand for SystemStateQuery {
    fn token(self) -> &'static str {
        match self {
            SystemStateQuery::Cycles => "SYST:CYCL?",
            SystemStateQuery::Hours => "SYST:HOUR?",
            SystemStateQuery::DiodeHours => "SYST:DIOD:HOUR?",
            SystemStateQuery::PowerLevel => "SOUR:POW:LEV?",
            SystemStateQuery::PowerCurrent => "SOUR:POW:CURR?",
            SystemStateQuery::BaseplateTemperature => "SOUR:TEMP:BAS?",
        }
    }

    fn category(self) -> Category {
        Category::SystemState
    }
}

// ---------------------------------------------------------------
// Operational
// ---------------------------------------------------------------

/// Operational settings that can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationalCommand {
    /// `SOUR:AM:INT` -- select an internal (CW) modulation mode.
    ModeInternalCw,
    /// `SOUR:AM:EXT` -- select an external modulation mode.
    ModeExternal,
    /// `SOUR:POW:LEV:IMM:AMPL` -- power setpoint in Watts.
    PowerLevelAmplitude,
    /// `SOUR:AM:STAT` -- laser emission on/off.
    LaserOutputState,
    /// `SYST:CDRH` -- CDRH emission delay on/off.
    EmissionDelay,
}

impl WriteCommand for OperationalCommand {
    fn token(self) -> &'static str {
        match self {
            OperationalCommand::ModeInternalCw => "SOUR:AM:INT",
            OperationalCommand::ModeExternal => "SOUR:AM:EXT",
            OperationalCommand::PowerLevelAmplitude => "SOUR:POW:LEV:IMM:AMPL",
            OperationalCommand::LaserOutputState => "SOUR:AM:STAT",
            OperationalCommand::EmissionDelay => "SYST:CDRH",
        }
    }

    fn category(self) -> Category {
        Category::Operational
    }
}

/// Operational queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationalQuery {
    /// `SOUR:AM:SOUR?` -- the active modulation mode token.
    OperatingMode,
    LaserOutputState,
    EmissionDelay,
    PowerLevelAmplitude,
}

impl QueryCommand for OperationalQuery {
    fn token(self) -> &'static str {
        match self {
            OperationalQuery::OperatingMode => "SOUR:AM:SOUR?",
            OperationalQuery::LaserOutputState => "SOUR:AM:STAT?",
            OperationalQuery::EmissionDelay => "SYST:CDRH?",
            OperationalQuery::PowerLevelAmplitude => "SOUR:POW:LEV:IMM:AMPL?",
        }
    }

    fn category(self) -> Category {
        Category::Operational
    }
}

// ---------------------------------------------------------------
// Optional
// ---------------------------------------------------------------

/// Optional-feature settings that can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionalCommand {
    /// `SOUR:TEMP:APR` -- diode temperature control on/off.
    DiodeTemperatureControl,
}

impl WriteCommand for OptionalCommand {
    fn token(self) -> &'static str {
        match self {
            OptionalCommand::DiodeTemperatureControl => "SOUR:TEMP:APR",
        }
    }

    fn category(self) -> Category {
        Category::Optional
    }
}

/// Optional-feature queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionalQuery {
    DiodeTemperatureControl,
}

impl QueryCommand for OptionalQuery {
    fn token(self) -> &'static str {
        match self {
            OptionalQuery::DiodeTemperatureControl => "SOUR:TEMP:APR?",
        }
    }

    fn category(self) -> Category {
        Category::Optional
    }
}

// ---------------------------------------------------------------
// Value enumerations
// ---------------------------------------------------------------

/// Boolean-like setting. The laser takes `ON` / `OFF`, not `1` / `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnOff {
    On,
    Off,
}

impl OnOff {
    /// Wire value.
    pub fn as_wire(self) -> &'static str {
        match self {
            OnOff::On => "ON",
            OnOff::Off => "OFF",
        }
    }

    /// Parse a wire value. Anything but `ON` or `OFF` is rejected.
    pub fn from_wire(value: &str) -> Result<Self> {
        match value {
            "ON" => Ok(OnOff::On),
            "OFF" => Ok(OnOff::Off),
            _ => Err(Error::Protocol(format!("expected ON or OFF, got {value:?}"))),
        }
    }

    /// `true` for [`OnOff::On`].
    pub fn is_on(self) -> bool {
        self == OnOff::On
    }
}

impl From<bool> for OnOff {
    fn from(on: bool) -> Self {
        if on { OnOff::On } else { OnOff::Off }
    }
}

impl fmt::Display for OnOff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for OnOff {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        OnOff::from_wire(&s.to_uppercase())
    }
}

/// Input impedance of the SMB analog modulation input. Same on LS and LX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalogInputImpedance {
    /// 50 Ω, wire value `1`.
    FiftyOhm,
    /// 2 kΩ, wire value `2`.
    TwoThousandOhm,
}

impl AnalogInputImpedance {
    /// Wire value.
    pub fn as_wire(self) -> &'static str {
        match self {
            AnalogInputImpedance::FiftyOhm => "1",
            AnalogInputImpedance::TwoThousandOhm => "2",
        }
    }

    /// Parse a wire value.
    pub fn from_wire(value: &str) -> Result<Self> {
        match value {
            "1" => Ok(AnalogInputImpedance::FiftyOhm),
            "2" => Ok(AnalogInputImpedance::TwoThousandOhm),
            _ => Err(Error::Protocol(format!(
                "unknown analog input impedance code: {value:?}"
            ))),
        }
    }

    /// Impedance in ohms.
    pub fn ohms(self) -> u32 {
        match self {
            AnalogInputImpedance::FiftyOhm => 50,
            AnalogInputImpedance::TwoThousandOhm => 2000,
        }
    }

    /// Look up the setting for a resistance in ohms (50 or 2000).
    pub fn from_ohms(ohms: u32) -> Result<Self> {
        match ohms {
            50 => Ok(AnalogInputImpedance::FiftyOhm),
            2000 => Ok(AnalogInputImpedance::TwoThousandOhm),
            _ => Err(Error::InvalidParameter(format!(
                "analog input impedance must be 50 or 2000 ohms, got {ohms}"
            ))),
        }
    }
}

impl fmt::Display for AnalogInputImpedance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ohm", self.ohms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_QUERY_TOKENS: &[&str] = &[
        "SYST:COMM:HAND?",
        "SYST:STAT?",
        "SYST:FAUL?",
        "SYST:INF:WAV?",
        "SOUR:POW:LIM:HIGH?",
        "SYST:DIOD:HOUR?",
        "SOUR:TEMP:BAS?",
        "SOUR:AM:SOUR?",
        "SOUR:TEMP:APR?",
    ];

    #[test]
    fn query_tokens_end_in_question_mark() {
        let tokens = [
            SessionControlQuery::Handshaking.token(),
            SessionControlQuery::SystemStatus.token(),
            SessionControlQuery::SystemFault.token(),
            SystemInfoQuery::Wavelength.token(),
            SystemInfoQuery::PowerLimitHigh.token(),
            SystemStateQuery::DiodeHours.token(),
            SystemStateQuery::BaseplateTemperature.token(),
            OperationalQuery::OperatingMode.token(),
            OptionalQuery::DiodeTemperatureControl.token(),
        ];
        assert_eq!(tokens, ALL_QUERY_TOKENS);
        assert!(tokens.iter().all(|t| t.ends_with('?')));
    }

    #[test]
    fn write_tokens_have_no_question_mark() {
        let tokens = [
            Ieee488Command::WarmBoot.token(),
            SessionControlCommand::AnalogModulationType.token(),
            SystemInfoCommand::User.token(),
            OperationalCommand::ModeInternalCw.token(),
            OperationalCommand::ModeExternal.token(),
            OperationalCommand::LaserOutputState.token(),
            OptionalCommand::DiodeTemperatureControl.token(),
        ];
        assert!(tokens.iter().all(|t| !t.contains('?')));
    }

    #[test]
    fn bare_actions_take_no_argument() {
        assert!(!Ieee488Command::WarmBoot.takes_argument());
        assert!(!SessionControlCommand::ErrorClear.takes_argument());
        assert!(SessionControlCommand::Autostart.takes_argument());
        assert!(SystemInfoCommand::User.takes_argument());
        assert!(OperationalCommand::LaserOutputState.takes_argument());
    }

    #[test]
    fn write_and_query_share_stem() {
        assert_eq!(
            format!("{}?", OperationalCommand::LaserOutputState.token()),
            OperationalQuery::LaserOutputState.token()
        );
        assert_eq!(
            format!("{}?", OperationalCommand::EmissionDelay.token()),
            OperationalQuery::EmissionDelay.token()
        );
        assert_eq!(
            format!("{}?", SessionControlCommand::Autostart.token()),
            SessionControlQuery::Autostart.token()
        );
    }

    #[test]
    fn categories() {
        assert_eq!(Ieee488Command::WarmBoot.category(), Category::Ieee488);
        assert_eq!(
            SessionControlQuery::SystemStatus.category(),
            Category::SessionControl
        );
        assert_eq!(SystemInfoQuery::PowerLimitLow.category(), Category::SystemInfo);
        assert_eq!(SystemStateQuery::Hours.category(), Category::SystemState);
        assert_eq!(
            OperationalCommand::ModeExternal.category(),
            Category::Operational
        );
        assert_eq!(OptionalQuery::DiodeTemperatureControl.category(), Category::Optional);
    }

    #[test]
    fn on_off_wire() {
        assert_eq!(OnOff::On.as_wire(), "ON");
        assert_eq!(OnOff::from_wire("OFF").unwrap(), OnOff::Off);
        assert!(OnOff::from_wire("1").is_err());
        assert_eq!(OnOff::from(true), OnOff::On);
        assert_eq!("off".parse::<OnOff>().unwrap(), OnOff::Off);
    }

    #[test]
    fn impedance_wire() {
        assert_eq!(AnalogInputImpedance::FiftyOhm.as_wire(), "1");
        assert_eq!(AnalogInputImpedance::TwoThousandOhm.as_wire(), "2");
        assert_eq!(
            AnalogInputImpedance::from_wire("2").unwrap(),
            AnalogInputImpedance::TwoThousandOhm
        );
        assert!(matches!(
            AnalogInputImpedance::from_wire("3"),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn impedance_ohms() {
        assert_eq!(
            AnalogInputImpedance::from_ohms(50).unwrap(),
            AnalogInputImpedance::FiftyOhm
        );
        assert_eq!(AnalogInputImpedance::TwoThousandOhm.ohms(), 2000);
        assert!(matches!(
            AnalogInputImpedance::from_ohms(100),
            Err(Error::InvalidParameter(_))
        ));
    }
}
