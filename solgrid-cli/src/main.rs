//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = solgrid_cli::run() {
        eprintln!("solgrid: {err}");
        std::process::exit(1);
    }
}
