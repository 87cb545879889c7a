//! Common types and utilities for protoc-gen-rpcx
//!
//! This crate contains the descriptor model handed from the parser to the
//! generator, the plugin options, naming helpers and the shared error type.

pub mod descriptor;
pub mod naming;
pub mod options;

pub use descriptor::{
    DescriptorSet, FileDescriptor, MethodDescriptor, ServiceDescriptor, TypeRef,
};
pub use options::{PathsMode, PluginOptions};

use thiserror::Error;

/// Errors that can occur while parsing descriptors or generating bindings
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("unresolved type reference: {name}")]
    UnresolvedType { name: String },

    #[error("invalid {kind} name {name:?}")]
    InvalidName { kind: &'static str, name: String },

    #[error("invalid plugin parameter: {0}")]
    InvalidParameter(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;
