use clap::{Arg, ArgAction, Command};

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("proxy-host")
                .long("proxy-host")
                .help("HTTP CONNECT proxy host (requires --proxy-port)")
                .env("VIGILO_PROXY_HOST"),
        )
        .arg(
            Arg::new("proxy-port")
                .long("proxy-port")
                .help("HTTP CONNECT proxy port")
                .env("VIGILO_PROXY_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("proxy-header")
                .long("proxy-header")
                .help("Extra header for proxy requests as KEY=VALUE (repeatable)")
                .env("VIGILO_PROXY_HEADERS")
                .action(ArgAction::Append)
                .value_delimiter(','),
        )
}

/// Split one `KEY=VALUE` proxy header argument.
///
/// # Errors
/// Returns an error string if the argument has no `=` or an empty key.
pub fn parse_header(raw: &str) -> Result<(String, String), String> {
    let mut parts = raw.splitn(2, '=');
    let key = parts.next().unwrap_or_default().trim().to_string();
    let value = parts
        .next()
        .ok_or_else(|| format!("invalid proxy header {raw:?}: expected KEY=VALUE"))?
        .trim()
        .to_string();
    if key.is_empty() {
        return Err(format!("invalid proxy header {raw:?}: empty header name"));
    }
    Ok((key, value))
}
