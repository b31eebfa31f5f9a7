use clap::Parser;
use log::{error, info};

use zinnia::cli::Cli;
use zinnia::run;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{:#}", e);
        error!("Exited with error: {:#}", e);
        std::process::exit(1);
    }
    info!("Exited normally");
}
