//! Build script for sonic-sai-dash-ha.
//!
//! The `#[repr(C)]` definitions in `src/ffi/types.rs` cover only the union
//! members these headers use. When the full SAI headers are installed, the
//! `generate-bindings` feature can replace them with bindgen output so that
//! `sai_attribute_value_t` has the vendor's exact size.

fn main() {
    // #[cfg(feature = "generate-bindings")]
    // {
    //     use std::env;
    //     use std::path::PathBuf;
    //
    //     let bindings = bindgen::Builder::default()
    //         .header("/usr/include/sai/saitypes.h")
    //         .header("/usr/include/sai/experimental/saiexperimentaldashha.h")
    //         .header("/usr/include/sai/experimental/saiswitchextensions.h")
    //         .allowlist_type("sai_dash_ha_.*")
    //         .allowlist_type("sai_ha_.*")
    //         .allowlist_type("sai_switch_attr_extensions_t")
    //         .allowlist_var("SAI_(DASH_HA|HA_SESSION|HA_SCOPE|SWITCH_ATTR_HA)_.*")
    //         .derive_debug(true)
    //         .derive_default(true)
    //         .generate()
    //         .expect("Unable to generate DASH HA bindings");
    //
    //     let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    //     bindings
    //         .write_to_file(out_path.join("dash_ha_bindings.rs"))
    //         .expect("Couldn't write DASH HA bindings");
    // }

    println!("cargo:rerun-if-changed=build.rs");
}
