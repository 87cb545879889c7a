//! Protobuf descriptor parsing
//!
//! Two entry points produce the same [`DescriptorSet`]:
//! - **CodeGeneratorRequest**: what protoc writes to a plugin's stdin
//! - **FileDescriptorSet**: what `protoc -o out.pb` writes to disk
//!
//! ## Example
//! ```rust,ignore
//! use protoc_gen_rpcx_parser::RequestParser;
//!
//! let parser = RequestParser::from_bytes(&stdin_bytes)?;
//! let set = parser.parse()?;
//! let options = parser.options()?;
//! ```
//!
//! [`DescriptorSet`]: protoc_gen_rpcx_common::DescriptorSet

mod converter;
mod parser;
mod request;

pub use converter::{convert_file, convert_pool};
pub use parser::ProtobufParser;
pub use request::RequestParser;
