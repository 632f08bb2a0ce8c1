//! Entry point for the `swapi-loader` binary.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = swapi_cli::run() {
        eprintln!("swapi-loader: {err}");
        std::process::exit(1);
    }
}
