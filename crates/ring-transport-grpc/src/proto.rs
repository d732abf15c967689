//! Generated protobuf types and client for `loop.ArbiterScaler`.

include!(concat!(env!("OUT_DIR"), "/r#loop.rs"));
