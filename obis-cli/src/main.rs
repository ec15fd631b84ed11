// obis-cli -- command-line tool for driving a Coherent OBIS LS/LX laser
// against real hardware or a mock transport.
//
// Usage:
//   obis-cli --port /dev/ttyACM0 enable
//   obis-cli --port /dev/ttyACM0 --model lx mode set analog
//   obis-cli --port /dev/ttyACM0 power set 25
//   obis-cli --port /dev/ttyACM0 wait --timeout 120
//   obis-cli --port /dev/ttyACM0 --prefix 2 status
//   obis-cli --mock info
//
// Logging goes to stderr. -v enables debug output for the protocol engine,
// -vv enables trace output including raw bytes. RUST_LOG overrides both.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use obis_laser::{
    AnalogInputImpedance, ModulationMode, ObisBuilder, ObisLaser, OnOff, Variant, WaitOptions,
};
use obis_laser::models::{ModeClass, ObisModel};
use obis_test_harness::MockTransport;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// obis-cli -- control an OBIS laser from the command line.
#[derive(Parser)]
#[command(name = "obis-cli", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyACM0, COM3).
    #[arg(long, default_value = "/dev/ttyACM0")]
    port: String,

    /// Laser family.
    #[arg(long, value_enum, default_value_t = ModelArg::Ls)]
    model: ModelArg,

    /// Override the default baud rate (9600).
    #[arg(long)]
    baud: Option<u32>,

    /// Address a daisy-chained head (sent before every command).
    #[arg(long)]
    prefix: Option<String>,

    /// Per-read reply timeout in milliseconds.
    #[arg(long, default_value_t = 1000)]
    response_timeout_ms: u64,

    /// Use a mock transport instead of a real serial port.
    /// Useful for verifying CLI parsing and builder wiring without hardware.
    #[arg(long)]
    mock: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Ls,
    Lx,
}

impl From<ModelArg> for Variant {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Ls => Variant::Ls,
            ModelArg::Lx => Variant::Lx,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Turn laser emission on.
    Enable {
        /// Do not wait for warmup to finish first.
        #[arg(long)]
        no_wait: bool,
    },

    /// Turn laser emission off.
    Disable {
        /// Do not wait for warmup to finish first.
        #[arg(long)]
        no_wait: bool,
    },

    /// Wait until the laser is ready (or faulted).
    Wait {
        /// Give up after this many seconds (default: wait indefinitely).
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Print the decoded system status.
    Status,

    /// Print identity, limits and counters.
    Info,

    /// Modulation mode operations.
    Mode {
        #[command(subcommand)]
        action: ModeAction,
    },

    /// Power setpoint operations (mW).
    Power {
        #[command(subcommand)]
        action: PowerAction,
    },

    /// Analog input impedance operations.
    Impedance {
        #[command(subcommand)]
        action: ImpedanceAction,
    },

    /// CDRH emission delay operations.
    Cdrh {
        #[command(subcommand)]
        action: OnOffAction,
    },

    /// Warm boot the laser (*RST).
    WarmBoot,
}

#[derive(Subcommand)]
enum ModeAction {
    /// Read the active modulation mode.
    Get,
    /// Set the modulation mode (CWP, CWC, DIGITAL, DIGSO, ANALOG, MIXSO, MIXED).
    Set {
        mode: String,
    },
}

#[derive(Subcommand)]
enum PowerAction {
    /// Read the setpoint, limits and present output power.
    Get,
    /// Set the power setpoint in mW.
    Set {
        milliwatts: f64,
    },
}

#[derive(Subcommand)]
enum ImpedanceAction {
    /// Read the analog input impedance.
    Get,
    /// Set the analog input impedance (50 or 2000 ohms).
    Set {
        ohms: u32,
    },
}

#[derive(Subcommand)]
enum OnOffAction {
    Get,
    Set {
        /// on or off
        state: String,
    },
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "warn,obis_laser=debug,obis_transport=debug,obis_text_io=debug",
        _ => "warn,obis_laser=trace,obis_transport=trace,obis_text_io=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Construct the laser handle from CLI arguments.
async fn connect(cli: &Cli) -> Result<ObisLaser> {
    let model = ObisModel::for_variant(cli.model.into());
    let name = model.name;

    let mut builder = ObisBuilder::new(model)
        .response_timeout(Duration::from_millis(cli.response_timeout_ms));
    if let Some(baud) = cli.baud {
        builder = builder.baud_rate(baud);
    }
    if let Some(prefix) = cli.prefix.as_deref() {
        builder = builder.prefix(prefix);
    }

    if cli.mock {
        let laser = builder
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .context("failed to build laser with mock transport")?;
        println!("Connected (mock transport) -- {name}");
        return Ok(laser);
    }

    let laser = builder
        .serial_port(&cli.port)
        .build()
        .await
        .with_context(|| format!("failed to connect to {name} on {}", cli.port))?;
    println!("Connected to {name} on {}", cli.port);
    Ok(laser)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn wait_ready(laser: &mut ObisLaser, timeout: Option<u64>) -> Result<()> {
    let mut options = WaitOptions::default();
    if let Some(secs) = timeout {
        options = options.timeout(Duration::from_secs(secs));
    }
    println!("Waiting for warmup to complete...");
    let state = laser
        .wait_until_ready_with(options)
        .await
        .context("laser did not become ready")?;
    println!("Ready: {state}");
    Ok(())
}

async fn cmd_output(laser: &mut ObisLaser, on: bool, wait: bool) -> Result<()> {
    if wait {
        wait_ready(laser, None).await?;
    }
    if on {
        laser.enable().await?;
        println!("Laser output enabled.");
    } else {
        laser.disable().await?;
        println!("Laser output disabled.");
    }
    Ok(())
}

async fn cmd_status(laser: &mut ObisLaser) -> Result<()> {
    let state = laser.system_status().await?;
    let fault = laser.fault_code().await?;
    let output = laser.laser_output_enabled().await?;
    println!("Status:        {} ({state})", state.code());
    println!("Readiness:     {:?}", state.readiness());
    println!("Key on:        {}", state.key_on());
    println!("Interlock:     {}", if state.interlock_open() { "open" } else { "closed" });
    println!("Fault code:    {fault}");
    println!("Output:        {}", if output { "ON" } else { "OFF" });
    Ok(())
}

async fn cmd_info(laser: &mut ObisLaser) -> Result<()> {
    let info = laser.device_info().await?;
    println!("Laser Information");
    println!("  Model:          {}", info.model);
    println!("  Serial number:  {}", info.serial_number);
    println!("  Part number:    {}", info.part_number);
    println!("  Firmware:       {}", info.firmware_version);
    println!("  Protocol:       {}", info.protocol_version);
    println!("  Manufactured:   {}", info.manufacturing_date);
    println!("  Calibrated:     {}", info.calibration_date);
    println!("  Wavelength:     {} nm", info.wavelength_nm);
    println!();
    println!("Limits");
    println!("  Nominal power:  {:.3} mW", laser.nominal_power().await?);
    println!("  Min power:      {:.3} mW", laser.min_power().await?);
    println!("  Max power:      {:.3} mW", laser.max_power().await?);
    println!(
        "  Modes:          {}",
        laser
            .model()
            .modes
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();
    println!("Counters");
    println!("  System hours:   {}", laser.system_hours().await?);
    println!("  Diode hours:    {}", laser.diode_hours().await?);
    println!("  Power cycles:   {}", laser.power_cycles().await?);
    println!("  Temperature:    {} C", laser.temperature().await?);
    Ok(())
}

async fn cmd_mode(laser: &mut ObisLaser, action: &ModeAction) -> Result<()> {
    match action {
        ModeAction::Get => {
            let mode = laser.modulation_mode().await?;
            let class = match mode.class() {
                ModeClass::Internal => "internal",
                ModeClass::External => "external",
            };
            println!("Mode: {mode} ({class})");
        }
        ModeAction::Set { mode } => {
            let mode: ModulationMode = mode.parse()?;
            laser.set_modulation_mode(mode).await?;
            println!("Mode set to {mode}");
        }
    }
    Ok(())
}

async fn cmd_power(laser: &mut ObisLaser, action: &PowerAction) -> Result<()> {
    match action {
        PowerAction::Get => {
            println!("Setpoint:  {:.3} mW", laser.power_setpoint().await?);
            println!("Output:    {:.3} mW", laser.output_power().await?);
            println!("Current:   {:.4} A", laser.output_current().await?);
        }
        PowerAction::Set { milliwatts } => {
            let max = laser.max_power().await?;
            let min = laser.min_power().await?;
            check_power_bounds(*milliwatts, min, max)?;
            laser.set_power_setpoint(*milliwatts).await?;
            println!("Setpoint set to {milliwatts} mW");
        }
    }
    Ok(())
}

fn check_power_bounds(milliwatts: f64, min: f64, max: f64) -> Result<()> {
    if milliwatts > max {
        bail!("{milliwatts} mW exceeds the laser's maximum of {max:.3} mW");
    }
    if milliwatts < min {
        bail!("{milliwatts} mW is below the laser's minimum of {min:.3} mW");
    }
    Ok(())
}

async fn cmd_impedance(laser: &mut ObisLaser, action: &ImpedanceAction) -> Result<()> {
    match action {
        ImpedanceAction::Get => {
            println!("Analog input impedance: {}", laser.analog_input_impedance().await?);
        }
        ImpedanceAction::Set { ohms } => {
            let impedance = AnalogInputImpedance::from_ohms(*ohms)?;
            laser.set_analog_input_impedance(impedance).await?;
            println!("Analog input impedance set to {impedance}");
        }
    }
    Ok(())
}

async fn cmd_cdrh(laser: &mut ObisLaser, action: &OnOffAction) -> Result<()> {
    match action {
        OnOffAction::Get => println!("CDRH delay: {}", laser.cdrh().await?),
        OnOffAction::Set { state } => {
            let state: OnOff = state.parse()?;
            laser.set_cdrh(state).await?;
            println!("CDRH delay set to {state}");
        }
    }
    Ok(())
}

async fn run(laser: &mut ObisLaser, command: &Command) -> Result<()> {
    match command {
        Command::Enable { no_wait } => cmd_output(laser, true, !no_wait).await,
        Command::Disable { no_wait } => cmd_output(laser, false, !no_wait).await,
        Command::Wait { timeout } => wait_ready(laser, *timeout).await,
        Command::Status => cmd_status(laser).await,
        Command::Info => cmd_info(laser).await,
        Command::Mode { action } => cmd_mode(laser, action).await,
        Command::Power { action } => cmd_power(laser, action).await,
        Command::Impedance { action } => cmd_impedance(laser, action).await,
        Command::Cdrh { action } => cmd_cdrh(laser, action).await,
        Command::WarmBoot => {
            laser.warm_boot().await?;
            println!("Warm boot started.");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut laser = connect(&cli).await?;
    let result = run(&mut laser, &cli.command).await;
    laser.disconnect().await.ok();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_enable_defaults_to_waiting() {
        let cli = Cli::try_parse_from(["obis-cli", "enable"]).unwrap();
        assert_eq!(cli.port, "/dev/ttyACM0");
        assert!(matches!(cli.command, Command::Enable { no_wait: false }));
        assert!(matches!(cli.model, ModelArg::Ls));
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "obis-cli", "--port", "COM4", "--model", "lx", "--prefix", "2", "--baud", "19200",
            "-vv", "mode", "set", "digso",
        ])
        .unwrap();
        assert_eq!(cli.port, "COM4");
        assert_eq!(Variant::from(cli.model), Variant::Lx);
        assert_eq!(cli.prefix.as_deref(), Some("2"));
        assert_eq!(cli.baud, Some(19200));
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Mode { action: ModeAction::Set { mode } } => assert_eq!(mode, "digso"),
            _ => panic!("expected mode set"),
        }
    }

    #[test]
    fn parse_wait_timeout() {
        let cli = Cli::try_parse_from(["obis-cli", "wait", "--timeout", "90"]).unwrap();
        assert!(matches!(cli.command, Command::Wait { timeout: Some(90) }));
    }

    #[test]
    fn unknown_model_rejected() {
        assert!(Cli::try_parse_from(["obis-cli", "--model", "lz", "status"]).is_err());
    }

    #[tokio::test]
    async fn mock_connect_uses_cli_settings() {
        let cli = Cli::try_parse_from(["obis-cli", "--mock", "--model", "lx", "--prefix", "3", "status"])
            .unwrap();
        let laser = connect(&cli).await.unwrap();
        assert_eq!(laser.variant(), Variant::Lx);
        assert_eq!(laser.prefix(), Some("3"));
    }

    #[test]
    fn power_bounds_checked_both_ways() {
        assert!(check_power_bounds(50.0, 0.5, 110.0).is_ok());
        assert!(check_power_bounds(0.5, 0.5, 110.0).is_ok());
        assert!(check_power_bounds(110.0, 0.5, 110.0).is_ok());
        assert!(check_power_bounds(120.0, 0.5, 110.0).is_err());
        assert!(check_power_bounds(0.1, 0.5, 110.0).is_err());
    }

    #[tokio::test]
    async fn power_below_minimum_is_not_sent() {
        let mut mock = MockTransport::new();
        mock.expect(b"SOUR:POW:LIM:HIGH?\r\n", b"0.11000\r\nOK\r\n");
        mock.expect(b"SOUR:POW:LIM:LOW?\r\n", b"0.00050\r\nOK\r\n");
        mock.expect(b"SOUR:POW:LIM:HIGH?\r\n", b"0.11000\r\nOK\r\n");
        mock.expect(b"SOUR:POW:LIM:LOW?\r\n", b"0.00050\r\nOK\r\n");
        mock.expect(b"SOUR:POW:LEV:IMM:AMPL 0.03\r\n", b"OK\r\n");

        let mut laser = ObisBuilder::new(ObisModel::for_variant(Variant::Ls))
            .build_with_transport(Box::new(mock))
            .await
            .unwrap();
        let err = cmd_power(&mut laser, &PowerAction::Set { milliwatts: 0.1 })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("minimum"), "{err}");
        cmd_power(&mut laser, &PowerAction::Set { milliwatts: 30.0 })
            .await
            .unwrap();
    }
}
