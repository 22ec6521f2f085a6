use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=SWISSEPH_LIB_DIR");
    println!("cargo:rerun-if-changed=build/build.rs");

    // The Swiss Ephemeris is only linked when the provider is compiled in.
    if env::var_os("CARGO_FEATURE_SWISSEPH").is_none() {
        return;
    }

    if let Some(dir) = env::var_os("SWISSEPH_LIB_DIR") {
        let lib_path = PathBuf::from(dir);
        println!("cargo:rustc-link-search=native={}", lib_path.to_string_lossy());
    }

    println!("cargo:rustc-link-lib=swe");
}
