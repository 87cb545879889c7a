//! The host side of a generation pass
//!
//! Plugins never see Go package layout directly. They ask the host for the
//! printable name of a proto type and for imports, and hand it declarations
//! to append. [`FileGenerator`] is the host for one output file; it is
//! created fresh for every file and dropped once the file is rendered.

use crate::go::{CodeWriter, GoDecl};
use protoc_gen_rpcx_common::naming::{go_message_name, go_package_name};
use protoc_gen_rpcx_common::{
    DescriptorSet, FileDescriptor, GeneratorError, PathsMode, PluginOptions, Result,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// The plugin's view of the generator
#[cfg_attr(test, mockall::automock)]
pub trait GeneratorHost {
    /// Note that a proto type is referenced so its package gets imported
    fn record_type_use(&mut self, proto_name: &str);

    /// Printable Go name for a fully-qualified proto type
    fn type_name(&mut self, proto_name: &str) -> Result<String>;

    /// Add an import and return the package name to qualify references with
    fn add_import(&mut self, import_path: &str) -> String;

    /// Append a declaration to the output
    fn emit(&mut self, decl: &GoDecl);
}

/// Go package a proto file is generated into
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoPackage {
    pub import_path: String,
    pub name: String,
}

impl GoPackage {
    /// Resolve the Go package of a file
    ///
    /// Precedence: `M` override, then `option go_package` (with an optional
    /// `;name` suffix), then the proto directory and package.
    pub fn for_file(file: &FileDescriptor, options: &PluginOptions) -> Self {
        if let Some(import_path) = options.import_overrides.get(&file.name) {
            return Self {
                import_path: import_path.clone(),
                name: go_package_name(import_path),
            };
        }

        if let Some(go_package) = &file.go_package {
            return match go_package.split_once(';') {
                Some((import_path, name)) => Self {
                    import_path: import_path.to_string(),
                    name: name.to_string(),
                },
                None => Self {
                    import_path: go_package.clone(),
                    name: go_package_name(go_package),
                },
            };
        }

        let import_path = if file.dir().is_empty() {
            file.base_name().to_string()
        } else {
            file.dir().to_string()
        };
        let name = if file.package.is_empty() {
            go_package_name(file.base_name())
        } else {
            go_package_name(&file.package.replace('.', "_"))
        };
        Self { import_path, name }
    }
}

/// A generated Go type a proto message maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoObject {
    pub go_name: String,
    pub package: GoPackage,
}

/// Maps fully-qualified proto message names to Go types
#[derive(Debug, Default)]
pub struct SymbolTable {
    objects: HashMap<String, GoObject>,
    packages: HashMap<String, GoPackage>,
}

impl SymbolTable {
    /// Index every message of every file in the set
    pub fn build(set: &DescriptorSet, options: &PluginOptions) -> Self {
        let mut table = Self::default();

        for file in &set.files {
            let package = GoPackage::for_file(file, options);
            let prefix = if file.package.is_empty() {
                ".".to_string()
            } else {
                format!(".{}.", file.package)
            };

            for message in &file.messages {
                let relative = message.strip_prefix(&prefix).unwrap_or(message);
                table.objects.insert(
                    message.clone(),
                    GoObject {
                        go_name: go_message_name(relative),
                        package: package.clone(),
                    },
                );
            }
            table.packages.insert(file.name.clone(), package);
        }

        tracing::debug!(
            messages = table.objects.len(),
            files = table.packages.len(),
            "built symbol table"
        );
        table
    }

    pub fn lookup(&self, proto_name: &str) -> Option<&GoObject> {
        self.objects.get(proto_name)
    }

    pub fn package_of(&self, file: &str) -> Option<&GoPackage> {
        self.packages.get(file)
    }
}

/// One entry of the import block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSpec {
    /// Set only when the name differs from the last path element
    pub alias: Option<String>,
    pub path: String,
}

#[derive(Debug)]
struct ImportEntry {
    name: String,
    std: bool,
}

/// Import paths of one file, each bound to a distinct package name
#[derive(Debug, Default)]
struct ImportSet {
    by_path: BTreeMap<String, ImportEntry>,
}

impl ImportSet {
    /// Bind `path` to `name`, or to `name1`, `name2`, ... when `name` is
    /// taken. An already imported path keeps its first binding.
    fn add(&mut self, path: &str, name: &str, std: bool, reserved: &str) -> String {
        if let Some(entry) = self.by_path.get(path) {
            return entry.name.clone();
        }

        let mut candidate = name.to_string();
        let mut n = 1;
        while candidate == reserved || self.by_path.values().any(|e| e.name == candidate) {
            candidate = format!("{}{}", name, n);
            n += 1;
        }

        self.by_path.insert(
            path.to_string(),
            ImportEntry {
                name: candidate.clone(),
                std,
            },
        );
        candidate
    }

    /// Standard library imports, then everything else, each sorted by path
    fn specs(&self) -> (Vec<ImportSpec>, Vec<ImportSpec>) {
        let mut std = Vec::new();
        let mut other = Vec::new();
        for (path, entry) in &self.by_path {
            let spec = ImportSpec {
                alias: (entry.name != last_element(path)).then(|| entry.name.clone()),
                path: path.clone(),
            };
            if entry.std {
                std.push(spec);
            } else {
                other.push(spec);
            }
        }
        (std, other)
    }

    fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

fn last_element(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Standard library paths have no dot in their first element
fn is_std_import(path: &str) -> bool {
    !path.split('/').next().unwrap_or(path).contains('.')
}

/// Host for generating one Go file
pub struct FileGenerator<'a> {
    file: &'a FileDescriptor,
    symbols: &'a SymbolTable,
    package: GoPackage,
    imports: ImportSet,
    body: CodeWriter,
}

impl<'a> FileGenerator<'a> {
    pub fn new(file: &'a FileDescriptor, symbols: &'a SymbolTable) -> Result<Self> {
        let package = symbols.package_of(&file.name).cloned().ok_or_else(|| {
            GeneratorError::Generation(format!("file `{}` is not in the symbol table", file.name))
        })?;

        Ok(Self {
            file,
            symbols,
            package,
            imports: ImportSet::default(),
            body: CodeWriter::new(),
        })
    }

    pub fn package(&self) -> &GoPackage {
        &self.package
    }

    /// Whether any plugin emitted a declaration
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn has_imports(&self) -> bool {
        !self.imports.is_empty()
    }

    /// Output path of the generated file
    pub fn output_name(&self, paths: PathsMode) -> String {
        let file_name = format!("{}.rpcx.pb.go", self.file.base_name());
        let dir = match paths {
            PathsMode::Import => self.package.import_path.as_str(),
            PathsMode::SourceRelative => self.file.dir(),
        };
        if dir.is_empty() {
            file_name
        } else {
            format!("{}/{}", dir.trim_end_matches('/'), file_name)
        }
    }

    /// Import the Go package of a message under its declared name
    fn import_package(&mut self, package: &GoPackage) -> String {
        self.imports
            .add(&package.import_path, &package.name, false, &self.package.name)
    }

    /// Split into the pieces the file template needs
    pub fn finish(self) -> FileParts {
        let (std_imports, other_imports) = self.imports.specs();
        FileParts {
            source: self.file.name.clone(),
            package: self.package.name,
            std_imports,
            other_imports,
            body: self.body.into_string(),
        }
    }
}

/// Rendered body plus the data for the file envelope
#[derive(Debug, Clone, Serialize)]
pub struct FileParts {
    pub source: String,
    pub package: String,
    pub std_imports: Vec<ImportSpec>,
    pub other_imports: Vec<ImportSpec>,
    pub body: String,
}

impl GeneratorHost for FileGenerator<'_> {
    fn record_type_use(&mut self, proto_name: &str) {
        let Some(object) = self.symbols.lookup(proto_name) else {
            return;
        };
        if object.package.import_path != self.package.import_path {
            let package = object.package.clone();
            self.import_package(&package);
        }
    }

    fn type_name(&mut self, proto_name: &str) -> Result<String> {
        let object = self
            .symbols
            .lookup(proto_name)
            .ok_or_else(|| GeneratorError::UnresolvedType {
                name: proto_name.to_string(),
            })?;

        if object.package.import_path == self.package.import_path {
            return Ok(object.go_name.clone());
        }
        let go_name = object.go_name.clone();
        let package = object.package.clone();
        let qualifier = self.import_package(&package);
        Ok(format!("{}.{}", qualifier, go_name))
    }

    fn add_import(&mut self, import_path: &str) -> String {
        let std = is_std_import(import_path);
        let name = if std {
            last_element(import_path).to_string()
        } else {
            go_package_name(import_path)
        };
        self.imports
            .add(import_path, &name, std, &self.package.name)
    }

    fn emit(&mut self, decl: &GoDecl) {
        if !self.body.is_empty() {
            self.body.blank_line();
        }
        decl.render(&mut self.body);
    }
}
