mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    // Logging is initialized inside the run, once the output directory is known.
    if let Err(err) = Cli::run_from_args().await {
        eprintln!("seqbatch error: {:#}", err);
        std::process::exit(1);
    }
}
