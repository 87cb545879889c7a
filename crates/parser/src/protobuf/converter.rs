//! Converts prost-reflect descriptors to the rpcx descriptor model

use prost_reflect::{DescriptorPool, MessageDescriptor, MethodDescriptor, ServiceDescriptor};
use protoc_gen_rpcx_common::{
    descriptor, DescriptorSet, FileDescriptor, GeneratorError, Result, TypeRef,
};

/// Convert every file in the pool, dependencies first
///
/// `files_to_generate` lists the proto paths output is requested for; each
/// must be present in the pool.
pub fn convert_pool(pool: &DescriptorPool, files_to_generate: &[String]) -> Result<DescriptorSet> {
    let files = pool.files().map(|f| convert_file(&f)).collect::<Vec<_>>();

    for name in files_to_generate {
        if !files.iter().any(|f| &f.name == name) {
            return Err(GeneratorError::Parse(format!(
                "file to generate `{}` is not part of the descriptor set",
                name
            )));
        }
    }

    Ok(DescriptorSet {
        files,
        files_to_generate: files_to_generate.to_vec(),
    })
}

/// Convert a single file descriptor
pub fn convert_file(file: &prost_reflect::FileDescriptor) -> FileDescriptor {
    let go_package = file
        .file_descriptor_proto()
        .options
        .as_ref()
        .and_then(|o| o.go_package.clone())
        .filter(|p| !p.is_empty());

    let mut messages = Vec::new();
    for message in file.messages() {
        collect_messages(&message, &mut messages);
    }

    tracing::debug!(
        file = file.name(),
        services = file.services().count(),
        messages = messages.len(),
        "converted file descriptor"
    );

    FileDescriptor {
        name: file.name().to_string(),
        package: file.package_name().to_string(),
        go_package,
        services: file.services().map(|s| convert_service(&s)).collect(),
        messages,
    }
}

fn convert_service(service: &ServiceDescriptor) -> descriptor::ServiceDescriptor {
    descriptor::ServiceDescriptor {
        name: service.name().to_string(),
        methods: service.methods().map(|m| convert_method(&m)).collect(),
    }
}

fn convert_method(method: &MethodDescriptor) -> descriptor::MethodDescriptor {
    descriptor::MethodDescriptor {
        name: method.name().to_string(),
        input_type: TypeRef::new(method.input().full_name()),
        output_type: TypeRef::new(method.output().full_name()),
        client_streaming: method.is_client_streaming(),
        server_streaming: method.is_server_streaming(),
    }
}

/// Depth-first walk over a message and its nested messages.
///
/// Synthetic map entry messages never get a Go type, so they are skipped.
fn collect_messages(message: &MessageDescriptor, out: &mut Vec<String>) {
    if message.is_map_entry() {
        return;
    }
    out.push(format!(".{}", message.full_name()));
    for child in message.child_messages() {
        collect_messages(&child, out);
    }
}
