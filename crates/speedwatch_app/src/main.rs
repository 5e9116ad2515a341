use clap::Parser;
use speedwatch_app::cli;
use speedwatch_logging::watch_error;

fn main() {
    let args = cli::Args::parse();
    if let Err(err) = cli::dispatch(args) {
        watch_error!("{:#}", err);
        std::process::exit(1);
    }
}
