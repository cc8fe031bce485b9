use crate::api::{ClientSettings, ProxyConfig, SignatureVersion, TlsMode};
use crate::auth::Identity;
use crate::cli::actions::{Action, login};
use crate::cli::commands;
use anyhow::{Context, Result, anyhow};
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

/// Turn parsed arguments into an executable action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent, or
/// the signature version is unsupported.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    commands::validate(matches).map_err(|e| anyhow!(e))?;

    let control = matches
        .get_one::<String>("control")
        .map(PathBuf::from)
        .context("missing required argument: --control")?;

    let identity = Identity {
        username: matches
            .get_one::<String>("username")
            .cloned()
            .context("missing required argument: --username")?,
        password: matches
            .get_one::<String>("password")
            .map(|p| SecretString::from(p.clone())),
        ipaddr: matches
            .get_one::<String>("ipaddr")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0".to_string()),
    };

    let sig_version =
        SignatureVersion::from_config(matches.get_one::<u8>("sig-version").copied().unwrap_or(1))?;

    let tls = matches
        .get_one::<String>("ca")
        .map(|ca| TlsMode::parse(ca))
        .context("missing required argument: --ca")?;

    let proxy = match matches.get_one::<String>("proxy-host") {
        Some(host) => {
            let port = matches
                .get_one::<u16>("proxy-port")
                .copied()
                .context("missing required argument: --proxy-port")?;
            let headers = matches
                .get_many::<String>("proxy-header")
                .map(|values| {
                    values
                        .map(|raw| commands::parse_header(raw).map_err(|e| anyhow!(e)))
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default();
            Some(ProxyConfig {
                host: host.clone(),
                port,
                headers,
            })
        }
        None => None,
    };

    let settings = ClientSettings {
        ikey: matches
            .get_one::<String>("ikey")
            .cloned()
            .context("missing required argument: --ikey")?,
        skey: matches
            .get_one::<String>("skey")
            .map(|s| SecretString::from(s.clone()))
            .context("missing required argument: --skey")?,
        host: matches
            .get_one::<String>("host")
            .cloned()
            .context("missing required argument: --host")?,
        port: matches.get_one::<u16>("port").copied(),
        tls,
        sig_version,
        proxy,
        timeout: Duration::from_secs(matches.get_one::<u64>("timeout").copied().unwrap_or(60)),
        user_agent: crate::APP_USER_AGENT.to_string(),
    };

    Ok(Action::Login(login::Args {
        control,
        identity,
        settings,
        cache_dir: matches
            .get_one::<String>("cache-dir")
            .map(PathBuf::from)
            .context("missing required argument: --cache-dir")?,
    }))
}
