//! Build script for cryptobroker-proto.
//!
//! Compiles the protobuf schema into Rust code using tonic-prost-build.
//! Packaged crates don't ship the schema and build hosts may lack `protoc`,
//! so pre-generated code from src/generated/ is used in either case.

use std::{path::Path, process::Command};

const PROTO_FILE: &str = "../../proto/cryptobroker/v1/cryptobroker.proto";
const PROTO_ROOT: &str = "../../proto";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Declare custom cfg for conditional compilation
    println!("cargo::rustc-check-cfg=cfg(use_pregenerated_proto)");
    println!("cargo::rerun-if-env-changed=PROTOC");

    if Path::new(PROTO_FILE).exists() && protoc_available() {
        println!("cargo::rerun-if-changed={PROTO_FILE}");

        tonic_prost_build::configure()
            .build_server(true)
            .build_client(true)
            .emit_rerun_if_changed(true)
            .compile_protos(&[PROTO_FILE], &[PROTO_ROOT])?;
    } else {
        // Signal that we're using pre-generated code
        println!("cargo::rustc-cfg=use_pregenerated_proto");
    }

    Ok(())
}

/// Returns true when a `protoc` binary can be located.
fn protoc_available() -> bool {
    let protoc = std::env::var_os("PROTOC").unwrap_or_else(|| "protoc".into());
    Command::new(protoc).arg("--version").output().is_ok_and(|out| out.status.success())
}
