use std::process;

mod cli;
mod logging;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let parsed = match cli::parse_args(&args) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{err}");
            cli::print_help();
            process::exit(2);
        }
    };

    logging::setup_tracing(parsed.log_level);
    tracing::debug!("meshbake starting");

    if let Err(err) = cli::run(parsed) {
        eprintln!("meshbake error: {err}");
        process::exit(1);
    }
}
