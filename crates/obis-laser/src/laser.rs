//! ObisLaser -- a connected OBIS LS or LX head.
//!
//! The handle owns the [`CommandCodec`] (and through it the transport) for
//! its whole lifetime. Every operation takes `&mut self` and awaits the full
//! reply, so commands are never interleaved.
//!
//! Power values cross the wire in Watts and are exposed in milliwatts.
//! Temperatures are reported with a trailing unit character (`24.9C`) which
//! is stripped.
//!
//! Modulation mode routing lives in [`modulation`](crate::modulation) and
//! readiness polling in [`readiness`](crate::readiness).

use tracing::{debug, info};

use obis_core::error::{Error, Result};

use crate::codec::CommandCodec;
use crate::commands::{
    AnalogInputImpedance, Ieee488Command, OnOff, OperationalCommand, OperationalQuery,
    OptionalCommand, OptionalQuery, QueryCommand, SessionControlCommand, SessionControlQuery,
    SystemInfoCommand, SystemInfoQuery, SystemStateQuery, WriteCommand,
};
use crate::models::{ObisModel, Variant};
use crate::status::DeviceState;

/// Identity data gathered from the system-information queries.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub model: String,
    pub serial_number: String,
    pub part_number: String,
    pub firmware_version: String,
    pub protocol_version: String,
    pub manufacturing_date: String,
    pub calibration_date: String,
    /// Center wavelength in nanometers.
    pub wavelength_nm: f64,
}

/// A connected OBIS laser.
///
/// Constructed via [`ObisBuilder`](crate::builder::ObisBuilder).
pub struct ObisLaser {
    pub(crate) codec: CommandCodec,
    model: ObisModel,
}

/// Parse a numeric reply, dropping a trailing unit suffix (`24.9C`, `12 h`).
fn parse_number(raw: &str, what: &str) -> Result<f64> {
    let trimmed = raw
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c.is_whitespace());
    trimmed
        .parse::<f64>()
        .map_err(|_| Error::Protocol(format!("invalid {what} reply: {raw:?}")))
}

fn parse_count(raw: &str, what: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| Error::Protocol(format!("invalid {what} reply: {raw:?}")))
}

fn watts_to_mw(raw: &str, what: &str) -> Result<f64> {
    Ok(parse_number(raw, what)? * 1000.0)
}

impl ObisLaser {
    pub(crate) fn new(codec: CommandCodec, model: ObisModel) -> Self {
        ObisLaser { codec, model }
    }

    /// The model definition this handle was built for.
    pub fn model(&self) -> &ObisModel {
        &self.model
    }

    pub fn variant(&self) -> Variant {
        self.model.variant
    }

    /// The unit prefix, if this handle addresses a daisy-chained head.
    pub fn prefix(&self) -> Option<&str> {
        self.codec.prefix()
    }

    /// Whether the transport is still open.
    pub fn is_connected(&self) -> bool {
        self.codec.is_connected()
    }

    /// Send any query from the command tables and return the raw value.
    pub async fn query<Q: QueryCommand>(&mut self, query: Q) -> Result<String> {
        self.codec.read(query).await
    }

    /// Send any write from the command tables. Pass an empty `value` for
    /// commands that take none.
    pub async fn command<C: WriteCommand>(&mut self, cmd: C, value: &str) -> Result<()> {
        if cmd.takes_argument() {
            self.codec.write(cmd, value).await
        } else if value.is_empty() {
            self.codec.execute(cmd).await
        } else {
            Err(Error::InvalidParameter(format!(
                "{} takes no value",
                cmd.token()
            )))
        }
    }

    // -----------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------

    /// Turn laser emission on.
    ///
    /// The laser acknowledges immediately; it does not report when emission
    /// actually starts.
    pub async fn enable(&mut self) -> Result<()> {
        info!("enabling laser output");
        self.codec
            .write(OperationalCommand::LaserOutputState, OnOff::On.as_wire())
            .await
    }

    /// Turn laser emission off.
    pub async fn disable(&mut self) -> Result<()> {
        info!("disabling laser output");
        self.codec
            .write(OperationalCommand::LaserOutputState, OnOff::Off.as_wire())
            .await
    }

    pub async fn laser_output_enabled(&mut self) -> Result<bool> {
        let raw = self.codec.read(OperationalQuery::LaserOutputState).await?;
        Ok(OnOff::from_wire(&raw)?.is_on())
    }

    /// CDRH five second emission delay.
    pub async fn cdrh(&mut self) -> Result<OnOff> {
        let raw = self.codec.read(OperationalQuery::EmissionDelay).await?;
        OnOff::from_wire(&raw)
    }

    pub async fn set_cdrh(&mut self, state: OnOff) -> Result<()> {
        self.codec
            .write(OperationalCommand::EmissionDelay, state.as_wire())
            .await
    }

    // -----------------------------------------------------------------
    // Power
    // -----------------------------------------------------------------

    /// Power setpoint in mW.
    pub async fn power_setpoint(&mut self) -> Result<f64> {
        let raw = self.codec.read(OperationalQuery::PowerLevelAmplitude).await?;
        watts_to_mw(&raw, "power setpoint")
    }

    /// Set the power setpoint in mW.
    pub async fn set_power_setpoint(&mut self, milliwatts: f64) -> Result<()> {
        if !milliwatts.is_finite() || milliwatts < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "power setpoint must be a non-negative number of mW, got {milliwatts}"
            )));
        }
        let watts = milliwatts / 1000.0;
        debug!(milliwatts, watts, "setting power");
        self.codec
            .write(OperationalCommand::PowerLevelAmplitude, &watts.to_string())
            .await
    }

    /// Highest settable power in mW.
    pub async fn max_power(&mut self) -> Result<f64> {
        let raw = self.codec.read(SystemInfoQuery::PowerLimitHigh).await?;
        watts_to_mw(&raw, "maximum power")
    }

    /// Lowest settable power in mW.
    pub async fn min_power(&mut self) -> Result<f64> {
        let raw = self.codec.read(SystemInfoQuery::PowerLimitLow).await?;
        watts_to_mw(&raw, "minimum power")
    }

    /// Nominal (rated) power in mW.
    pub async fn nominal_power(&mut self) -> Result<f64> {
        let raw = self.codec.read(SystemInfoQuery::NominalPower).await?;
        watts_to_mw(&raw, "nominal power")
    }

    /// Present output power in mW.
    pub async fn output_power(&mut self) -> Result<f64> {
        let raw = self.codec.read(SystemStateQuery::PowerLevel).await?;
        watts_to_mw(&raw, "output power")
    }

    /// Present diode current in Amps.
    pub async fn output_current(&mut self) -> Result<f64> {
        let raw = self.codec.read(SystemStateQuery::PowerCurrent).await?;
        parse_number(&raw, "output current")
    }

    // -----------------------------------------------------------------
    // Measurements and identity
    // -----------------------------------------------------------------

    /// Baseplate temperature in °C.
    pub async fn temperature(&mut self) -> Result<f64> {
        let raw = self
            .codec
            .read(SystemStateQuery::BaseplateTemperature)
            .await?;
        parse_number(&raw, "temperature")
    }

    /// Center wavelength in nm.
    pub async fn wavelength(&mut self) -> Result<f64> {
        let raw = self.codec.read(SystemInfoQuery::Wavelength).await?;
        parse_number(&raw, "wavelength")
    }

    /// Read the identity block.
    pub async fn device_info(&mut self) -> Result<DeviceInfo> {
        Ok(DeviceInfo {
            model: self.codec.read(SystemInfoQuery::Model).await?,
            serial_number: self.codec.read(SystemInfoQuery::SerialNumber).await?,
            part_number: self.codec.read(SystemInfoQuery::PartNumber).await?,
            firmware_version: self.codec.read(SystemInfoQuery::FirmwareVersion).await?,
            protocol_version: self.codec.read(SystemInfoQuery::ProtocolVersion).await?,
            manufacturing_date: self.codec.read(SystemInfoQuery::ManufacturingDate).await?,
            calibration_date: self.codec.read(SystemInfoQuery::CalibrationDate).await?,
            wavelength_nm: self.wavelength().await?,
        })
    }

    pub async fn user_text(&mut self) -> Result<String> {
        self.codec.read(SystemInfoQuery::User).await
    }

    pub async fn set_user_text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() || !text.is_ascii() || text.contains(['\r', '\n']) {
            return Err(Error::InvalidParameter(
                "user text must be a non-empty single line of ASCII".into(),
            ));
        }
        self.codec.write(SystemInfoCommand::User, text).await
    }

    /// Hours the laser has been powered.
    pub async fn system_hours(&mut self) -> Result<f64> {
        let raw = self.codec.read(SystemStateQuery::Hours).await?;
        parse_number(&raw, "system hours")
    }

    /// Hours the diode has emitted.
    pub async fn diode_hours(&mut self) -> Result<f64> {
        let raw = self.codec.read(SystemStateQuery::DiodeHours).await?;
        parse_number(&raw, "diode hours")
    }

    pub async fn power_cycles(&mut self) -> Result<u64> {
        let raw = self.codec.read(SystemStateQuery::Cycles).await?;
        parse_count(&raw, "power cycle count")
    }

    // -----------------------------------------------------------------
    // Status and errors
    // -----------------------------------------------------------------

    /// Query and decode `SYST:STAT?`.
    pub async fn system_status(&mut self) -> Result<DeviceState> {
        let raw = self.codec.read(SessionControlQuery::SystemStatus).await?;
        DeviceState::decode(&raw)
    }

    /// Raw `SYST:FAUL?` code. `00000000` means no fault.
    pub async fn fault_code(&mut self) -> Result<String> {
        self.codec.read(SessionControlQuery::SystemFault).await
    }

    pub async fn error_count(&mut self) -> Result<u64> {
        let raw = self.codec.read(SessionControlQuery::ErrorCount).await?;
        parse_count(&raw, "error count")
    }

    /// Pop the oldest entry from the error queue.
    pub async fn next_error(&mut self) -> Result<String> {
        self.codec.read(SessionControlQuery::ErrorNext).await
    }

    pub async fn clear_errors(&mut self) -> Result<()> {
        self.codec.execute(SessionControlCommand::ErrorClear).await
    }

    // -----------------------------------------------------------------
    // Session settings
    // -----------------------------------------------------------------

    pub async fn analog_input_impedance(&mut self) -> Result<AnalogInputImpedance> {
        let raw = self
            .codec
            .read(SessionControlQuery::AnalogModulationType)
            .await?;
        AnalogInputImpedance::from_wire(&raw)
    }

    /// Set the impedance of the SMB analog modulation input.
    pub async fn set_analog_input_impedance(
        &mut self,
        impedance: AnalogInputImpedance,
    ) -> Result<()> {
        self.codec
            .write(SessionControlCommand::AnalogModulationType, impedance.as_wire())
            .await
    }

    /// Whether the laser starts emitting on its own after warmup.
    pub async fn autostart(&mut self) -> Result<OnOff> {
        let raw = self.codec.read(SessionControlQuery::Autostart).await?;
        OnOff::from_wire(&raw)
    }

    pub async fn set_autostart(&mut self, state: OnOff) -> Result<()> {
        self.codec
            .write(SessionControlCommand::Autostart, state.as_wire())
            .await
    }

    /// Diode temperature control. Not every head implements it.
    pub async fn diode_temperature_control(&mut self) -> Result<OnOff> {
        let raw = self
            .codec
            .read(OptionalQuery::DiodeTemperatureControl)
            .await?;
        OnOff::from_wire(&raw)
    }

    pub async fn set_diode_temperature_control(&mut self, state: OnOff) -> Result<()> {
        self.codec
            .write(OptionalCommand::DiodeTemperatureControl, state.as_wire())
            .await
    }

    /// Warm boot (`*RST`). The laser goes back through warmup.
    pub async fn warm_boot(&mut self) -> Result<()> {
        info!("warm boot");
        self.codec.execute(Ieee488Command::WarmBoot).await
    }

    /// Close the transport and drop the handle.
    pub async fn disconnect(mut self) -> Result<()> {
        debug!(model = self.model.name, "disconnecting");
        self.codec.close().await
    }
}
