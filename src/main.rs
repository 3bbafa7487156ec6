//! Covenant entry point — thin shim over the CLI dispatcher.

fn main() {
    if let Err(e) = covenant::cli::run_cli() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
