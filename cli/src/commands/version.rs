//! Version command

/// Run the version command.
pub fn run() {
    println!("nomad-deploy {}", env!("CARGO_PKG_VERSION"));
}
