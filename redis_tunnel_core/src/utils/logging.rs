use log::LevelFilter;

/// Initialize logging using env_logger.
/// `RUST_LOG` still wins, e.g. `RUST_LOG=redis_tunnel=debug redis-tunnel connect`;
/// without it `verbose` selects between Debug and Info.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
