use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `levels` takes the `EnvFilter` directive syntax, e.g. `info` or
/// `bmc_scraper=debug,framework=info`. Invalid directives fall back to `info`.
/// Calling it twice is harmless, the second call is ignored.
pub fn init(color: bool, json: bool, levels: &str) {
    let filter = EnvFilter::try_new(levels).unwrap_or_else(|err| {
        eprintln!("invalid log level {levels:?}, {err}, fallback to info");
        EnvFilter::new("info")
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(color);

    let result = if json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        debug!(message = "global subscriber already installed");
    }
}

/// Expands a bare level like `debug` to directives for this project's crates,
/// keeping noisy dependencies such as `hyper` at their default.
pub fn levels_for(level: &str) -> String {
    if level == "off" {
        return "off".to_string();
    }

    // already a directive list
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }

    ["bmc_scraper", "framework", "event"]
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}
