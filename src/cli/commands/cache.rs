use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new("cache-dir")
            .long("cache-dir")
            .help("Shared directory holding replay cache markers")
            .env("VIGILO_CACHE_DIR")
            .default_value("/opt/auth_cache"),
    )
}
