//! Protobuf FileDescriptorSet parser

use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::FileDescriptorSet;
use protoc_gen_rpcx_common::{DescriptorSet, GeneratorError, Result};
use std::fs;
use std::path::Path;

/// Parser for a FileDescriptorSet written by `protoc -o`
///
/// Unless narrowed with [`ProtobufParser::with_files_to_generate`], every
/// file in the set is a generation target.
pub struct ProtobufParser {
    /// Descriptor pool for reflection
    pool: DescriptorPool,

    /// Proto paths to generate for; empty means all files
    files_to_generate: Vec<String>,
}

impl ProtobufParser {
    /// Load FileDescriptorSet from binary file
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = ProtobufParser::from_file("greeter.pb")?;
    /// let set = parser.parse()?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref()).map_err(|e| {
            GeneratorError::Parse(format!(
                "Failed to read FileDescriptorSet file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_file_descriptor_set(&bytes)
    }

    /// Parse FileDescriptorSet from bytes
    pub fn from_file_descriptor_set(bytes: &[u8]) -> Result<Self> {
        let file_descriptor_set = FileDescriptorSet::decode(bytes).map_err(|e| {
            GeneratorError::Parse(format!("Failed to decode FileDescriptorSet: {}", e))
        })?;

        let pool = build_pool(file_descriptor_set)?;

        Ok(Self {
            pool,
            files_to_generate: Vec::new(),
        })
    }

    /// Restrict generation to the given proto paths
    pub fn with_files_to_generate(mut self, files: Vec<String>) -> Self {
        self.files_to_generate = files;
        self
    }

    /// Parse the descriptor set into the rpcx descriptor model
    pub fn parse(&self) -> Result<DescriptorSet> {
        let targets = if self.files_to_generate.is_empty() {
            self.pool.files().map(|f| f.name().to_string()).collect()
        } else {
            self.files_to_generate.clone()
        };

        super::converter::convert_pool(&self.pool, &targets)
    }

    /// Get reference to the underlying descriptor pool
    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

/// Build a descriptor pool, reporting unresolvable references as parse errors
pub(crate) fn build_pool(file_descriptor_set: FileDescriptorSet) -> Result<DescriptorPool> {
    DescriptorPool::from_file_descriptor_set(file_descriptor_set)
        .map_err(|e| GeneratorError::Parse(format!("Failed to create DescriptorPool: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_descriptor_set() {
        let file_descriptor_set = FileDescriptorSet { file: vec![] };
        let bytes = file_descriptor_set.encode_to_vec();

        let parser = ProtobufParser::from_file_descriptor_set(&bytes).unwrap();
        let set = parser.parse().unwrap();
        assert!(set.files.is_empty());
        assert!(set.files_to_generate.is_empty());
    }

    #[test]
    fn test_garbage_bytes_are_a_parse_error() {
        let result = ProtobufParser::from_file_descriptor_set(&[0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(GeneratorError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_a_parse_error() {
        let result = ProtobufParser::from_file("/definitely/not/here.pb");
        assert!(matches!(result, Err(GeneratorError::Parse(_))));
    }
}
