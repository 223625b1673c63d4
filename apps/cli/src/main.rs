//! Mod Uploader entry point.

mod app;
mod cli;
mod config;
mod console;
mod instance;
mod interactive;
mod logging;
#[cfg(feature = "steamworks")]
mod steamworks_service;

use std::time::Duration;

use moduploader_steam::InstalledGameLocator;
use moduploader_workshop::{FixedVersion, GameVersionSource, WorkshopService};
use tokio_util::sync::CancellationToken;

use crate::app::App;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::instance::InstanceLock;

const LOCK_FILE: &str = "moduploader.lock";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_normalized();
    let command = cli.command()?;

    let config = Config::load()?;
    let _log_guard = logging::init(&config.log_dir(), cli.verbose)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        command = ?command,
        "starting Mod Uploader"
    );

    if let Command::NewMod {
        content, preview, ..
    }
    | Command::Update {
        content, preview, ..
    } = &command
    {
        app::check_paths(content, preview.as_deref())?;
    }

    let instance = InstanceLock::acquire(&config::data_dir().join(LOCK_FILE))?;
    tracing::debug!(lock = %instance.path().display(), "single instance confirmed");

    let service = connect(&config)?;
    let versions: Box<dyn GameVersionSource> = match &config.game_version {
        Some(version) => Box::new(FixedVersion(version.clone())),
        None => Box::new(InstalledGameLocator::new(config.app_id())),
    };

    // The SDK is not thread safe, so everything runs on this thread.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let cancel = CancellationToken::new();

    let result = rt.block_on(async {
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, cancelling");
                on_interrupt.cancel();
            }
        });

        let app = App::new(service.as_ref(), versions.as_ref(), &config, cancel.clone());
        app.run(command).await
    });
    // Pending stdin reads would otherwise hold the runtime open.
    rt.shutdown_timeout(Duration::from_millis(200));

    match &result {
        Ok(()) => tracing::info!("Mod Uploader exited"),
        // The error itself is printed by the runtime when main returns.
        Err(e) => tracing::info!(error = %e, "Mod Uploader exited with an error"),
    }
    result
}

#[cfg(feature = "steamworks")]
fn connect(config: &Config) -> anyhow::Result<Box<dyn WorkshopService>> {
    let service = steamworks_service::SteamworksService::init(config.app_id())?;
    Ok(Box::new(service))
}

#[cfg(not(feature = "steamworks"))]
fn connect(_config: &Config) -> anyhow::Result<Box<dyn WorkshopService>> {
    anyhow::bail!(
        "this build has no Steam support; rebuild with `cargo build --features steamworks`"
    )
}
