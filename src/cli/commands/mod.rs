mod cache;
mod logging;
mod proxy;
mod service;

pub use logging::ARG_VERBOSITY;
pub use proxy::parse_header;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

/// Validate argument combinations clap cannot express declaratively.
///
/// # Errors
/// Returns an error string if a proxy host is configured without a port.
pub fn validate(matches: &clap::ArgMatches) -> Result<(), String> {
    if matches.contains_id("proxy-host") && !matches.contains_id("proxy-port") {
        return Err(
            "Missing required argument: --proxy-port (required with --proxy-host)".to_string(),
        );
    }
    Ok(())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("vigilo")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("control")
                .short('c')
                .long("control")
                .help("Gateway control file where the 1/0 verdict is written")
                .env("VIGILO_CONTROL")
                .required(true),
        )
        .arg(
            Arg::new("username")
                .short('u')
                .long("username")
                .help("Username of the connecting user")
                .env("VIGILO_USERNAME")
                .required(true),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Password or factor supplied by the user (falls back to the service's default out-of-band factor)")
                .env("VIGILO_PASSWORD"),
        )
        .arg(
            Arg::new("ipaddr")
                .long("ipaddr")
                .help("Source address of the connection attempt")
                .env("VIGILO_IPADDR")
                .default_value("0.0.0.0"),
        );

    let command = service::with_args(command);
    let command = proxy::with_args(command);
    let command = cache::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<String> {
        [
            "vigilo",
            "--control",
            "/tmp/vigilo-control",
            "--username",
            "alice",
            "--ikey",
            "DIWJ8X6AEYOR5OMC6TQ1",
            "--skey",
            "Zh5eGmUq9zpfQnyUIu5OL9iWoMMv5ZNmk3zLJ4Ep",
            "--host",
            "api.example.com",
        ]
        .iter()
        .map(ToString::to_string)
        .collect()
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "vigilo");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some(env!("CARGO_PKG_DESCRIPTION").to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_required_args_and_defaults() {
        let command = new();
        let matches = command.get_matches_from(base_args());

        assert_eq!(
            matches.get_one::<String>("username").cloned(),
            Some("alice".to_string())
        );
        assert_eq!(
            matches.get_one::<String>("host").cloned(),
            Some("api.example.com".to_string())
        );
        assert_eq!(
            matches.get_one::<String>("ipaddr").cloned(),
            Some("0.0.0.0".to_string())
        );
        assert_eq!(
            matches.get_one::<String>("ca").cloned(),
            Some("ca_certs.pem".to_string())
        );
        assert_eq!(
            matches.get_one::<String>("cache-dir").cloned(),
            Some("/opt/auth_cache".to_string())
        );
        assert_eq!(matches.get_one::<u8>("sig-version").copied(), Some(1));
        assert_eq!(matches.get_one::<u64>("timeout").copied(), Some(60));
        assert_eq!(matches.get_one::<u16>("port").copied(), None);
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("VIGILO_CONTROL", Some("/tmp/vigilo-control")),
                ("VIGILO_USERNAME", Some("alice")),
                ("VIGILO_PASSWORD", Some("s3cr3t")),
                ("VIGILO_IPADDR", Some("10.0.0.5")),
                ("VIGILO_IKEY", Some("DIWJ8X6AEYOR5OMC6TQ1")),
                ("VIGILO_SKEY", Some("Zh5eGmUq9zpfQnyUIu5OL9iWoMMv5ZNmk3zLJ4Ep")),
                ("VIGILO_HOST", Some("api.example.com")),
                ("VIGILO_CA", Some("DISABLE")),
                ("VIGILO_SIG_VERSION", Some("2")),
                ("VIGILO_TIMEOUT", Some("15")),
                ("VIGILO_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["vigilo"]);
                assert_eq!(
                    matches.get_one::<String>("username").cloned(),
                    Some("alice".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>("password").cloned(),
                    Some("s3cr3t".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>("ipaddr").cloned(),
                    Some("10.0.0.5".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>("ca").cloned(),
                    Some("DISABLE".to_string())
                );
                assert_eq!(matches.get_one::<u8>("sig-version").copied(), Some(2));
                assert_eq!(matches.get_one::<u64>("timeout").copied(), Some(15));
                assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("VIGILO_LOG_LEVEL", Some(level))], || {
                let command = new();
                let matches = command.get_matches_from(base_args());
                assert_eq!(
                    matches.get_one::<u8>(ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("VIGILO_LOG_LEVEL", None::<String>)], || {
                let mut args = base_args();

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();

                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_proxy_requires_port() {
        let mut args = base_args();
        args.push("--proxy-host".to_string());
        args.push("proxy.example.com".to_string());

        let command = new();
        let matches = command.get_matches_from(args);
        let err = validate(&matches).expect_err("proxy host without port should fail validation");
        assert!(err.contains("--proxy-port"));
    }

    #[test]
    fn test_proxy_with_port_validates() {
        let mut args = base_args();
        args.extend([
            "--proxy-host".to_string(),
            "proxy.example.com".to_string(),
            "--proxy-port".to_string(),
            "3128".to_string(),
        ]);

        let command = new();
        let matches = command.get_matches_from(args);
        assert_eq!(validate(&matches), Ok(()));
        assert_eq!(matches.get_one::<u16>("proxy-port").copied(), Some(3128));
    }

    #[test]
    fn test_proxy_headers_accumulate() {
        let mut args = base_args();
        args.extend([
            "--proxy-header".to_string(),
            "Proxy-Authorization=Basic Zm9v".to_string(),
            "--proxy-header".to_string(),
            "X-Trace=abc".to_string(),
        ]);

        let command = new();
        let matches = command.get_matches_from(args);
        let headers: Vec<String> = matches
            .get_many::<String>("proxy-header")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0], "Proxy-Authorization=Basic Zm9v");
    }
}
