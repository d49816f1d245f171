fn main() {
    // Tell cargo to recompile when the customer view changes.
    // The include_dir! macro embeds view/ at compile time,
    // but cargo doesn't track non-Rust files automatically.
    println!("cargo:rerun-if-changed=view");
}
