use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("ikey")
                .long("ikey")
                .help("Integration key identifying this client to the service")
                .env("VIGILO_IKEY")
                .required(true),
        )
        .arg(
            Arg::new("skey")
                .long("skey")
                .help("Secret key used to sign API requests (never logged)")
                .env("VIGILO_SKEY")
                .required(true),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .help("Authentication service API host")
                .env("VIGILO_HOST")
                .required(true),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .help("Service port override (default: 443, or 80 in plaintext mode)")
                .env("VIGILO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("ca")
                .long("ca")
                .help("Path to the CA trust bundle (PEM); HTTP selects plaintext mode, DISABLE skips certificate validation")
                .env("VIGILO_CA")
                .default_value("ca_certs.pem"),
        )
        .arg(
            Arg::new("sig-version")
                .long("sig-version")
                .help("Request signature version (1 or 2)")
                .env("VIGILO_SIG_VERSION")
                .default_value("1")
                .value_parser(clap::value_parser!(u8)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Timeout in seconds bounding each API call")
                .env("VIGILO_TIMEOUT")
                .default_value("60")
                .value_parser(clap::value_parser!(u64)),
        )
}
