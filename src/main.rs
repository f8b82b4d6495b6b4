extern crate env_logger;
#[macro_use]
extern crate log;

use anyhow::Result;
use clap::Parser;

mod bucket;
mod classify;
mod cli;
mod io;
mod matcher;
mod output;
mod reader;
mod reference;
mod summary;

use cli::{Cli, Commands};

fn try_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let cli = Cli::parse();

    info!("readsort v{}", cli::VERSION);

    let stats = match &cli.command {
        Commands::Bin {
            input,
            output,
            offset,
            width,
            force,
            json,
        } => {
            let params = bucket::BinParams::new(*offset, *width)?;
            info!("Binning reads with offset {offset} and width {width}");

            bucket::bin_reads(input, output, params, *force, *json)?
        }
        Commands::Match {
            input,
            reference,
            output,
            force,
            json,
        } => matcher::match_reads(input, reference, output, *force, *json)?,
    };

    info!(
        "Completed successfully: {} reads in, {} reads out, {}",
        stats.input_reads,
        stats.total_output,
        stats.verdict()
    );
    Ok(())
}

fn main() {
    if let Err(err) = try_main() {
        error!("{}", err);

        // report any errors that are produced
        err.chain()
            .skip(1)
            .for_each(|cause| error!("  because: {}", cause));

        std::process::exit(1);
    }
}
