//! Build script to compile protobuf definitions.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use the vendored protoc so builds do not depend on the host toolchain
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    // Only the client side of ArbiterScaler is used here
    tonic_build::configure()
        .build_server(false)
        .compile_protos(&["proto/arbiter.proto"], &["proto"])?;
    Ok(())
}
