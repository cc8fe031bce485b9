use crate::api::{ApiClient, ClientSettings, TlsMode};
use crate::auth::{Decision, Identity, Workflow};
use crate::cache::FsReplayCache;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct Args {
    pub control: PathBuf,
    pub identity: Identity,
    pub settings: ClientSettings,
    pub cache_dir: PathBuf,
}

/// Execute one authentication attempt and write the verdict.
///
/// The gateway only reads the control file, so a verdict is written on every
/// path: configuration failures write a denial before the error surfaces.
///
/// # Errors
/// Returns an error if the client cannot be constructed or the control file
/// cannot be written.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let decision = match attempt(&args).await {
        Ok(decision) => decision,
        Err(err) => {
            // Fatal before any network call, but the gateway still needs
            // its verdict.
            if let Err(werr) = write_control(&args.control, Decision::Error) {
                warn!("{werr:#}");
            }
            return Err(err);
        }
    };

    write_control(&args.control, decision)?;

    if decision.permitted() {
        info!("connection allowed for {}", args.identity.username);
    } else {
        warn!(
            "connection denied for {} ({decision:?})",
            args.identity.username
        );
    }

    Ok(())
}

async fn attempt(args: &Args) -> Result<Decision> {
    let client = ApiClient::from_settings(args.settings.clone())
        .context("could not configure the API client")?;
    let cache = FsReplayCache::new(&args.cache_dir);

    Ok(Workflow::new(&client, &cache).run(&args.identity).await)
}

fn write_control(path: &Path, decision: Decision) -> Result<()> {
    let verdict = if decision.permitted() { "1" } else { "0" };
    debug!("writing {verdict} to {}", path.display());
    fs::write(path, verdict)
        .with_context(|| format!("failed to write control file {}", path.display()))
}

fn log_startup_args(args: &Args) {
    let tls_mode = match &args.settings.tls {
        TlsMode::Pinned { bundle } => format!("pinned:{}", bundle.display()),
        TlsMode::Insecure => "insecure".to_string(),
        TlsMode::Plaintext => "plaintext".to_string(),
    };
    debug!(
        host = %args.settings.host,
        tls = %tls_mode,
        proxy = args.settings.proxy.is_some(),
        timeout_secs = args.settings.timeout.as_secs(),
        cache_dir = %args.cache_dir.display(),
        control = %args.control.display(),
        username = %args.identity.username,
        password_set = args.identity.password.is_some(),
        ipaddr = %args.identity.ipaddr,
        "startup configuration"
    );
}
