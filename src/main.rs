//! Burrow binary entry point.
//!
//! All logic lives in the library; this translates errors into an exit code.

fn main() {
    if let Err(err) = burrow::cli::run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
