//! Descriptor model
//!
//! A read-only view of the parts of a `.proto` file the rpcx plugin cares
//! about: services, their methods and the message types they reference.
//! Declaration order is preserved everywhere; generated output depends on it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Everything the generator needs for one protoc invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorSet {
    /// All files known to the compiler, dependencies first
    pub files: Vec<FileDescriptor>,

    /// Proto paths of the files output should be generated for
    pub files_to_generate: Vec<String>,
}

impl DescriptorSet {
    pub fn file(&self, name: &str) -> Option<&FileDescriptor> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Files selected for generation, in the requested order
    pub fn targets(&self) -> impl Iterator<Item = &FileDescriptor> + '_ {
        self.files_to_generate
            .iter()
            .filter_map(move |name| self.file(name))
    }
}

/// A parsed `.proto` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Proto path as given to protoc (e.g. `helloworld/greeter.proto`)
    pub name: String,

    /// Proto package, empty when the file declares none
    #[serde(default)]
    pub package: String,

    /// `option go_package`, if present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub go_package: Option<String>,

    /// Services in declaration order
    #[serde(default)]
    pub services: Vec<ServiceDescriptor>,

    /// Fully-qualified names of all messages declared in this file,
    /// nested messages included
    #[serde(default)]
    pub messages: Vec<String>,
}

impl FileDescriptor {
    /// Create an empty file descriptor with the given proto path and package
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            ..Default::default()
        }
    }

    /// Whether the file declares any service
    pub fn has_services(&self) -> bool {
        !self.services.is_empty()
    }

    /// File name without directory and `.proto` extension
    pub fn base_name(&self) -> &str {
        let file = Path::new(&self.name)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(&self.name);
        file.strip_suffix(".proto").unwrap_or(file)
    }

    /// Directory part of the proto path, empty for top-level files
    pub fn dir(&self) -> &str {
        match self.name.rfind('/') {
            Some(idx) => &self.name[..idx],
            None => "",
        }
    }
}

/// A service declared in a `.proto` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,

    /// RPC methods in declaration order
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// Append a method, builder style
    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }
}

/// A single RPC method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Wire method name, exactly as declared
    pub name: String,
    pub input_type: TypeRef,
    pub output_type: TypeRef,
    #[serde(default)]
    pub client_streaming: bool,
    #[serde(default)]
    pub server_streaming: bool,
}

impl MethodDescriptor {
    /// Create a unary method
    pub fn unary(
        name: impl Into<String>,
        input_type: impl Into<TypeRef>,
        output_type: impl Into<TypeRef>,
    ) -> Self {
        Self {
            name: name.into(),
            input_type: input_type.into(),
            output_type: output_type.into(),
            client_streaming: false,
            server_streaming: false,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.client_streaming || self.server_streaming
    }
}

/// Reference to a message type by fully-qualified proto name (`.pkg.Message`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    /// Build a reference, adding the leading dot protoc uses for
    /// fully-qualified names if it is missing
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.starts_with('.') {
            Self(name)
        } else {
            Self(format!(".{}", name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_normalizes_leading_dot() {
        assert_eq!(TypeRef::new("pkg.Msg").as_str(), ".pkg.Msg");
        assert_eq!(TypeRef::new(".pkg.Msg").as_str(), ".pkg.Msg");
    }

    #[test]
    fn test_file_paths() {
        let file = FileDescriptor::new("helloworld/greeter.proto", "helloworld");
        assert_eq!(file.base_name(), "greeter");
        assert_eq!(file.dir(), "helloworld");

        let top = FileDescriptor::new("echo.proto", "");
        assert_eq!(top.base_name(), "echo");
        assert_eq!(top.dir(), "");
    }

    #[test]
    fn test_service_builder_preserves_order() {
        let service = ServiceDescriptor::new("Greeter")
            .with_method(MethodDescriptor::unary("a", ".p.A", ".p.A"))
            .with_method(MethodDescriptor::unary("b", ".p.B", ".p.B"))
            .with_method(MethodDescriptor::unary("c", ".p.C", ".p.C"));

        let names: Vec<&str> = service.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_json_shape() {
        let method = MethodDescriptor::unary("sayHello", ".hw.HelloRequest", ".hw.HelloReply");
        let json = serde_json::to_value(&method).unwrap();
        assert_eq!(json["name"], "sayHello");
        assert_eq!(json["input_type"], ".hw.HelloRequest");
    }
}
