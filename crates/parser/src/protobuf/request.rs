//! protoc plugin request decoding
//!
//! protoc runs a plugin with a serialized `CodeGeneratorRequest` on stdin.
//! The request carries every file needed to resolve the targets, in
//! dependency order, plus the raw `--rpcx_opt` parameter string.

use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::compiler::CodeGeneratorRequest;
use prost_types::FileDescriptorSet;
use protoc_gen_rpcx_common::{DescriptorSet, GeneratorError, PluginOptions, Result};

/// Decoded `CodeGeneratorRequest`
pub struct RequestParser {
    pool: DescriptorPool,
    files_to_generate: Vec<String>,
    parameter: Option<String>,
    compiler_version: Option<String>,
}

impl RequestParser {
    /// Decode a serialized `CodeGeneratorRequest`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let request = CodeGeneratorRequest::decode(bytes).map_err(|e| {
            GeneratorError::Parse(format!("Failed to decode CodeGeneratorRequest: {}", e))
        })?;

        let compiler_version = request.compiler_version.as_ref().map(|v| {
            let mut version = format!(
                "{}.{}.{}",
                v.major.unwrap_or_default(),
                v.minor.unwrap_or_default(),
                v.patch.unwrap_or_default()
            );
            if let Some(suffix) = v.suffix.as_deref().filter(|s| !s.is_empty()) {
                version.push('-');
                version.push_str(suffix);
            }
            version
        });

        let pool = super::parser::build_pool(FileDescriptorSet {
            file: request.proto_file,
        })?;

        tracing::debug!(
            files = pool.files().count(),
            targets = request.file_to_generate.len(),
            compiler = compiler_version.as_deref().unwrap_or("unknown"),
            "decoded code generator request"
        );

        Ok(Self {
            pool,
            files_to_generate: request.file_to_generate,
            parameter: request.parameter,
            compiler_version,
        })
    }

    /// Parse the request into the rpcx descriptor model
    pub fn parse(&self) -> Result<DescriptorSet> {
        super::converter::convert_pool(&self.pool, &self.files_to_generate)
    }

    /// Parse the `--rpcx_opt` parameter string
    pub fn options(&self) -> Result<PluginOptions> {
        PluginOptions::parse(self.parameter.as_deref())
    }

    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    /// protoc version as `major.minor.patch[-suffix]`, when protoc sent it
    pub fn compiler_version(&self) -> Option<&str> {
        self.compiler_version.as_deref()
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::compiler::Version;

    #[test]
    fn test_empty_request() {
        let request = CodeGeneratorRequest {
            parameter: Some("paths=source_relative".to_string()),
            compiler_version: Some(Version {
                major: Some(25),
                minor: Some(1),
                patch: Some(0),
                suffix: Some(String::new()),
            }),
            ..Default::default()
        };

        let parser = RequestParser::from_bytes(&request.encode_to_vec()).unwrap();
        assert_eq!(parser.compiler_version(), Some("25.1.0"));
        assert_eq!(parser.parameter(), Some("paths=source_relative"));
        assert!(parser.parse().unwrap().files.is_empty());
        assert_eq!(
            parser.options().unwrap().paths,
            protoc_gen_rpcx_common::PathsMode::SourceRelative
        );
    }

    #[test]
    fn test_unknown_target_file() {
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["missing.proto".to_string()],
            ..Default::default()
        };

        let parser = RequestParser::from_bytes(&request.encode_to_vec()).unwrap();
        assert!(matches!(parser.parse(), Err(GeneratorError::Parse(_))));
    }
}
