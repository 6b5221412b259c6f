// Build script for hubctl - embeds version at compile time

fn main() {
    let version = std::env::var("HUB_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=HUB_VERSION={}", version);

    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=HUB_VERSION");
}
