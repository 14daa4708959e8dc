mod ui;

use clap::Parser;
use crate::ui::cli;
use redis_tunnel_core::utils::logging::init_logging;

fn main() {
    let args = cli::Args::parse();
    init_logging(args.verbose);
    match cli::run_cli(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("CLI error: {e}");
            std::process::exit(1);
        }
    }
}
