//! Descriptor parsing for protoc-gen-rpcx
//!
//! This crate turns protoc output into the descriptor model defined in
//! `protoc-gen-rpcx-common`. Descriptors are loaded into a prost-reflect
//! `DescriptorPool` first, so dangling type references are reported here
//! rather than during generation.

mod protobuf;

pub use protobuf::{convert_file, convert_pool, ProtobufParser, RequestParser};
