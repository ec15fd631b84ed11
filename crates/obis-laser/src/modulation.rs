//! Modulation mode routing.
//!
//! A mode is set with one of two wire commands depending on its class: CW
//! modes go through `SOUR:AM:INT`, modulated modes through `SOUR:AM:EXT`.
//! The routing is the same for every family; only the table of legal modes
//! differs (see [`ObisModel::modes`]).

use tracing::debug;

use obis_core::error::{Error, Result};

use crate::commands::{OperationalCommand, OperationalQuery, WriteCommand};
use crate::laser::ObisLaser;
use crate::models::{ModeClass, ModulationMode, ObisModel};

/// Pick the write command that carries `mode` on `model`.
pub fn route(model: &ObisModel, mode: ModulationMode) -> Result<OperationalCommand> {
    if !model.supports(mode) {
        return Err(Error::InvalidParameter(format!(
            "{} does not support modulation mode {mode}",
            model.name
        )));
    }
    Ok(match mode.class() {
        ModeClass::Internal => OperationalCommand::ModeInternalCw,
        ModeClass::External => OperationalCommand::ModeExternal,
    })
}

/// Parse a `SOUR:AM:SOUR?` reply into a mode legal for `model`.
pub fn parse_mode(model: &ObisModel, raw: &str) -> Result<ModulationMode> {
    let mode = ModulationMode::from_wire(raw.trim())?;
    if !model.supports(mode) {
        return Err(Error::Protocol(format!(
            "{} reported modulation mode {mode}, which it does not support",
            model.name
        )));
    }
    Ok(mode)
}

impl ObisLaser {
    /// Select the modulation mode.
    pub async fn set_modulation_mode(&mut self, mode: ModulationMode) -> Result<()> {
        let cmd = route(self.model(), mode)?;
        debug!(%mode, token = cmd.token(), "setting modulation mode");
        self.codec.write(cmd, mode.as_wire()).await
    }

    /// Read the active modulation mode.
    pub async fn modulation_mode(&mut self) -> Result<ModulationMode> {
        let raw = self.codec.read(OperationalQuery::OperatingMode).await?;
        parse_mode(self.model(), &raw)
    }

    /// Whether the active mode is one of the external (modulated) modes.
    pub async fn is_external_mode(&mut self) -> Result<bool> {
        Ok(self.modulation_mode().await?.class() == ModeClass::External)
    }
}
