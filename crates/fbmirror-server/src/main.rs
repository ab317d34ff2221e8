//! fbmirror service entry point.
//!
//! Wires the framebuffer, the input devices, the session handler and the
//! transport together, then runs the service loop until Ctrl+C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ Cli::parse() + load_config()       -- file defaults, CLI overrides
//!  └─ LinuxFramebuffer::open()           -- fatal on failure
//!  └─ EvdevSink::open() (keyboard, touch) -- warn and continue without
//!  └─ ServiceLoop::run()  (blocking task)
//!       ├─ process_events -> SessionHandler (auth / key / pointer)
//!       └─ Mirror::refresh -> publish dirty rect
//! ```
//!
//! # Failure policy (for beginners)
//!
//! - No framebuffer means nothing to mirror: the process exits non-zero.
//! - A missing keyboard or touch device only disables that input channel;
//!   viewers can still watch the panel.
//! - A single failed event write is logged and dropped inside the injector.

use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fbmirror_core::DeviceVariant;
use fbmirror_server::infrastructure::storage::config::{
    load_config, save_config, AppConfig, FrameRate, DEFAULT_CONFIG_PATH,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Panel variant as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VariantArg {
    Standard,
    SoftButtons,
}

impl From<VariantArg> for DeviceVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Standard => DeviceVariant::Standard,
            VariantArg::SoftButtons => DeviceVariant::SoftButtons,
        }
    }
}

/// Mirror a touch-panel framebuffer to a remote viewer.
///
/// Flags override the matching values in the configuration file.
#[derive(Debug, Parser)]
#[command(name = "fbmirror", version)]
struct Cli {
    /// Path of the TOML configuration file.
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_PATH, env = "FBMIRROR_CONFIG")]
    config: PathBuf,

    /// Use the 50 ms frame budget instead of 330 ms.
    #[arg(long, short = 'f')]
    fast: bool,

    /// Panel variant.
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,

    /// Clockwise rotation of the mirrored image in degrees (0, 90, 180, 270).
    #[arg(long)]
    rotate: Option<u32>,

    /// Log at debug level regardless of RUST_LOG and the config file.
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Write the effective configuration (file plus flags) back to
    /// `--config` and exit without starting the service.
    #[arg(long)]
    write_config: bool,
}

impl Cli {
    /// Overlays the command-line flags onto `config`.
    fn apply(&self, config: &mut AppConfig) {
        if self.fast {
            config.server.frame_rate = FrameRate::Fast;
        }
        if let Some(variant) = self.variant {
            config.server.variant = variant.into();
        }
        if let Some(rotate) = self.rotate {
            config.devices.rotation = rotate;
        }
    }
}

/// Saves a validated `config` to `path`.
fn write_config(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;
    save_config(path, config).with_context(|| format!("cannot write {}", path.display()))?;
    info!("configuration written to {}", path.display());
    Ok(())
}

fn env_filter(config_level: &str, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level))
}

// ── Device wiring ─────────────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
fn build_injector(
    config: &AppConfig,
    geometry: &fbmirror_core::DisplayGeometry,
) -> fbmirror_core::InputInjector {
    use fbmirror_core::{InputInjector, InputSink, TouchBounds};
    use fbmirror_server::infrastructure::input_device::EvdevSink;
    use tracing::warn;

    let keyboard = match config.devices.keyboard_path() {
        Some(path) => match EvdevSink::open(path) {
            Ok(sink) => Some(Arc::new(sink) as Arc<dyn InputSink>),
            Err(e) => {
                warn!("keyboard input disabled: {e}");
                None
            }
        },
        None => {
            info!("keyboard input disabled by configuration");
            None
        }
    };

    let mut device_bounds = TouchBounds::for_display(geometry.width, geometry.height);
    let touch = match config.devices.touch_path() {
        Some(path) => match EvdevSink::open(path).and_then(|sink| Ok((sink.abs_bounds()?, sink))) {
            Ok((bounds, sink)) => {
                device_bounds = bounds;
                Some(Arc::new(sink) as Arc<dyn InputSink>)
            }
            Err(e) => {
                warn!("touch input disabled: {e}");
                None
            }
        },
        None => {
            info!("touch input disabled by configuration");
            None
        }
    };

    let mut injector = InputInjector::new(config.injector_config(device_bounds));
    if let Some(sink) = keyboard {
        injector = injector.with_keyboard(sink);
    }
    if let Some(sink) = touch {
        injector = injector.with_touch(sink);
    }
    injector
}

#[cfg(target_os = "linux")]
async fn run_service(config: AppConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    use fbmirror_server::application::service_loop::{Mirror, ServiceLoop};
    use fbmirror_server::application::session::SessionHandler;
    use fbmirror_server::infrastructure::framebuffer::{DisplaySource, LinuxFramebuffer};
    use fbmirror_server::infrastructure::transport::HeadlessTransport;

    let rotation = config.devices.rotation()?;
    let display = LinuxFramebuffer::open(&config.devices.framebuffer, rotation)
        .with_context(|| format!("cannot use framebuffer {}", config.devices.framebuffer.display()))?;
    let injector = build_injector(&config, display.geometry());
    let mirror = Mirror::new(display).context("unsupported framebuffer format")?;

    let session = SessionHandler::new(injector, config.auth.credential_set(), config.auth.capacity);
    let transport = HeadlessTransport::new(
        config.server.desktop_name.clone(),
        format!("{}:{}", config.network.bind_address, config.network.port),
    );
    let mut service = ServiceLoop::new(
        transport,
        mirror,
        session,
        config.server.frame_rate.budget(),
        running,
    );

    tokio::task::spawn_blocking(move || service.run())
        .await
        .context("service loop task failed")??;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
async fn run_service(_config: AppConfig, _running: Arc<AtomicBool>) -> anyhow::Result<()> {
    anyhow::bail!("fbmirror needs a Linux framebuffer device")
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config)
        .with_context(|| format!("cannot load {}", cli.config.display()))?;
    cli.apply(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.server.log_level, cli.verbose))
        .init();

    if cli.write_config {
        return write_config(&cli.config, &config);
    }

    config.validate().context("invalid configuration")?;
    info!(
        "fbmirror starting (config {}, {:?} frame rate, {:?} panel)",
        cli.config.display(),
        config.server.frame_rate,
        config.server.variant
    );

    // ── Graceful shutdown flag ─────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run_service(config, running).await?;

    info!("fbmirror stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
