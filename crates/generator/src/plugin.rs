//! Plugin contract
//!
//! A plugin turns the descriptors of one file into Go declarations. The
//! [`Generator`](crate::Generator) constructs the host for each file and
//! calls the plugin; plugins are registered explicitly, there is no global
//! registry.

use crate::host::GeneratorHost;
use protoc_gen_rpcx_common::{FileDescriptor, PluginOptions, Result};

/// Read-only context handed to plugins at initialisation
#[derive(Debug, Clone, Default)]
pub struct GeneratorContext {
    pub options: PluginOptions,
    /// protoc version, when known
    pub compiler_version: Option<String>,
}

pub trait Plugin {
    /// Unique plugin name
    fn name(&self) -> &str;

    /// Called once when the plugin is registered
    fn init(&mut self, context: &GeneratorContext);

    /// Declare imports the file needs regardless of its contents
    fn generate_imports(&mut self, _file: &FileDescriptor, _host: &mut dyn GeneratorHost) {}

    /// Generate code for one file
    fn generate(&mut self, file: &FileDescriptor, host: &mut dyn GeneratorHost) -> Result<()>;
}
