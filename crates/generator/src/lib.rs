//! Go code generation for rpcx services
//!
//! This crate turns the descriptor model into Go source. The [`Generator`]
//! drives registered [`Plugin`]s over each requested file, giving every
//! plugin a [`FileGenerator`] host for symbol resolution, imports and
//! output, then wraps the result in the Go file envelope.

pub mod go;
mod host;
mod plugin;
mod rpcx;
mod templates;

pub use host::{
    FileGenerator, FileParts, GeneratorHost, GoObject, GoPackage, ImportSpec, SymbolTable,
};
pub use plugin::{GeneratorContext, Plugin};
pub use rpcx::RpcxPlugin;

use protoc_gen_rpcx_common::{
    DescriptorSet, FileDescriptor, GeneratorError, PluginOptions, Result,
};
use std::fs;
use std::path::{Path, PathBuf};
use tera::Tera;

/// A generated output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path relative to the output directory
    pub name: String,
    pub content: String,
}

impl GeneratedFile {
    /// Write the file below `output_dir`, creating directories as needed
    pub fn write_to(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(&self.name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                GeneratorError::Generation(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        fs::write(&path, &self.content).map_err(|e| {
            GeneratorError::Generation(format!("Failed to write {}: {}", path.display(), e))
        })?;
        Ok(path)
    }
}

/// Plugin driver
///
/// Plugins are registered explicitly:
///
/// ```rust,ignore
/// let mut generator = Generator::new(options)?;
/// generator.register(Box::new(RpcxPlugin::new()))?;
/// let files = generator.generate(&descriptor_set)?;
/// ```
pub struct Generator {
    context: GeneratorContext,
    plugins: Vec<Box<dyn Plugin>>,
    tera: Tera,
}

impl Generator {
    /// Create a generator with no plugins registered
    pub fn new(options: PluginOptions) -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self {
            context: GeneratorContext {
                options,
                compiler_version: None,
            },
            plugins: Vec::new(),
            tera,
        })
    }

    /// Create a generator with the rpcx plugin registered
    pub fn with_default_plugins(options: PluginOptions) -> Result<Self> {
        let mut generator = Self::new(options)?;
        generator.register(Box::new(RpcxPlugin::new()))?;
        Ok(generator)
    }

    /// Record the protoc version for the file header.
    ///
    /// Must be called before plugins are registered to be visible to them.
    pub fn with_compiler_version(mut self, version: Option<String>) -> Self {
        self.context.compiler_version = version;
        self
    }

    /// Register a plugin and run its initialisation callback
    pub fn register(&mut self, mut plugin: Box<dyn Plugin>) -> Result<()> {
        if self.plugins.iter().any(|p| p.name() == plugin.name()) {
            return Err(GeneratorError::Generation(format!(
                "plugin `{}` is already registered",
                plugin.name()
            )));
        }
        plugin.init(&self.context);
        tracing::debug!(plugin = plugin.name(), "registered plugin");
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn options(&self) -> &PluginOptions {
        &self.context.options
    }

    /// Generate output for every requested file, in request order
    ///
    /// Files for which no plugin emitted anything produce no output file.
    pub fn generate(&mut self, set: &DescriptorSet) -> Result<Vec<GeneratedFile>> {
        let symbols = SymbolTable::build(set, &self.context.options);

        let mut generated = Vec::new();
        for file in set.targets() {
            if let Some(output) = self.generate_file(file, &symbols)? {
                generated.push(output);
            }
        }

        tracing::info!(
            requested = set.files_to_generate.len(),
            generated = generated.len(),
            "generation finished"
        );
        Ok(generated)
    }

    /// Run all plugins over one file
    ///
    /// The host buffer is discarded on error, so a failing file never yields
    /// partial output.
    pub fn generate_file(
        &mut self,
        file: &FileDescriptor,
        symbols: &SymbolTable,
    ) -> Result<Option<GeneratedFile>> {
        let mut host = FileGenerator::new(file, symbols)?;

        for plugin in &mut self.plugins {
            plugin.generate_imports(file, &mut host);
            plugin.generate(file, &mut host).map_err(|e| {
                tracing::error!(file = %file.name, plugin = plugin.name(), error = %e, "plugin failed");
                e
            })?;
        }

        if host.is_empty() {
            tracing::debug!(file = %file.name, "nothing generated");
            return Ok(None);
        }

        let name = host.output_name(self.context.options.paths);
        let parts = host.finish();
        let content = templates::render_file(
            &self.tera,
            &parts,
            self.context.compiler_version.as_deref(),
        )?;

        tracing::debug!(file = %file.name, output = %name, bytes = content.len(), "generated file");
        Ok(Some(GeneratedFile { name, content }))
    }
}

/// Generate and write rpcx bindings for a descriptor set (convenience function)
pub fn generate_to_directory(
    set: &DescriptorSet,
    options: PluginOptions,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut generator = Generator::with_default_plugins(options)?;
    generator
        .generate(set)?
        .iter()
        .map(|file| file.write_to(output_dir))
        .collect()
}
