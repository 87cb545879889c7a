//! protoc-gen-rpcx
//!
//! Run by protoc with no arguments, the binary acts as a protoc plugin:
//! a `CodeGeneratorRequest` is read from stdin and a `CodeGeneratorResponse`
//! written to stdout. The subcommands work on a `FileDescriptorSet` produced
//! with `protoc --descriptor_set_out` and are meant for inspection and
//! debugging.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use prost::Message;
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::CodeGeneratorResponse;
use protoc_gen_rpcx_common::{DescriptorSet, PluginOptions};
use protoc_gen_rpcx_generator::{Generator, RpcxPlugin};
use protoc_gen_rpcx_parser::{ProtobufParser, RequestParser};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "protoc-gen-rpcx")]
#[command(
    version,
    about = "Generate rpcx service bindings for Go from protobuf definitions",
    long_about = None,
    after_help = "When run without a subcommand, acts as a protoc plugin:\n  \
        protoc --rpcx_out=. --rpcx_opt=paths=source_relative helloworld.proto"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a FileDescriptorSet and display its services
    #[command(after_help = "EXAMPLES:\n  \
        # Build a descriptor set with protoc\n  \
        protoc --include_imports --descriptor_set_out=api.pb helloworld.proto\n\n  \
        # Summarize it\n  \
        protoc-gen-rpcx parse --descriptor-set api.pb\n\n  \
        # Dump the descriptor model as JSON\n  \
        protoc-gen-rpcx parse --descriptor-set api.pb --json")]
    Parse {
        /// Path to the FileDescriptorSet
        #[arg(short, long)]
        descriptor_set: PathBuf,

        /// Print the parsed model as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate rpcx bindings from a FileDescriptorSet
    #[command(after_help = "EXAMPLES:\n  \
        # Generate for every file in the set\n  \
        protoc-gen-rpcx generate \\\n    \
        --descriptor-set api.pb \\\n    \
        --out ./gen\n\n  \
        # Generate one file, laid out next to its source\n  \
        protoc-gen-rpcx generate \\\n    \
        --descriptor-set api.pb \\\n    \
        --file helloworld/greeter.proto \\\n    \
        --opt paths=source_relative \\\n    \
        --out ./gen")]
    Generate {
        /// Path to the FileDescriptorSet
        #[arg(short, long)]
        descriptor_set: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "./gen")]
        out: PathBuf,

        /// Proto file to generate (repeatable, default: every file in the set)
        #[arg(short, long = "file")]
        files: Vec<String>,

        /// Plugin option as key=value, same as --rpcx_opt (repeatable)
        #[arg(long = "opt")]
        opts: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        None => plugin_command(),
        Some(Commands::Parse {
            descriptor_set,
            json,
        }) => parse_command(&descriptor_set, json, cli.verbose),
        Some(Commands::Generate {
            descriptor_set,
            out,
            files,
            opts,
        }) => generate_command(&descriptor_set, &out, files, &opts, cli.verbose),
    }
}

/// Logs go to stderr; stdout carries the plugin response
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn plugin_command() -> Result<()> {
    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .context("Failed to read CodeGeneratorRequest from stdin")?;

    let response = run_plugin(&input);

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&response.encode_to_vec())
        .context("Failed to write CodeGeneratorResponse")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Handle one plugin invocation
///
/// Generation failures are reported through the response's `error` field,
/// which protoc shows to the user; the process itself still succeeds.
fn run_plugin(input: &[u8]) -> CodeGeneratorResponse {
    let mut response = CodeGeneratorResponse {
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    };

    match generate_response_files(input) {
        Ok(files) => response.file = files,
        Err(e) => {
            tracing::error!(error = %e, "generation failed");
            response.error = Some(e.to_string());
        }
    }
    response
}

fn generate_response_files(input: &[u8]) -> protoc_gen_rpcx_common::Result<Vec<File>> {
    let request = RequestParser::from_bytes(input)?;
    let options = request.options()?;
    let set = request.parse()?;

    let mut generator = Generator::new(options)?
        .with_compiler_version(request.compiler_version().map(str::to_string));
    generator.register(Box::new(RpcxPlugin::new()))?;

    Ok(generator
        .generate(&set)?
        .into_iter()
        .map(|file| File {
            name: Some(file.name),
            content: Some(file.content),
            ..Default::default()
        })
        .collect())
}

fn parse_command(descriptor_set: &Path, json: bool, verbose: bool) -> Result<()> {
    let set = load_descriptor_set(descriptor_set, Vec::new())?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&set).context("Failed to serialize descriptor set")?
        );
        return Ok(());
    }

    println!("{}", "✓ Parse successful!".green().bold());
    println!("\n{}", "Files:".bold());
    for file in set.targets() {
        println!(
            "  • {} (package {})",
            file.name.cyan(),
            if file.package.is_empty() {
                "<none>".dimmed().to_string()
            } else {
                file.package.yellow().to_string()
            }
        );
        if verbose {
            if let Some(go_package) = &file.go_package {
                println!("    go_package: {}", go_package);
            }
            println!("    Messages: {}", file.messages.len());
        }
        for service in &file.services {
            println!(
                "    Service {} ({} methods)",
                service.name.green(),
                service.methods.len()
            );
            if verbose {
                for method in &service.methods {
                    let streaming = if method.is_streaming() {
                        " [streaming]".yellow().to_string()
                    } else {
                        String::new()
                    };
                    println!(
                        "      {}({}) returns ({}){}",
                        method.name, method.input_type, method.output_type, streaming
                    );
                }
            }
        }
    }

    let services: usize = set.targets().map(|f| f.services.len()).sum();
    println!(
        "\n{} {} files, {} services",
        "→".cyan(),
        set.files_to_generate.len(),
        services
    );
    Ok(())
}

fn generate_command(
    descriptor_set: &Path,
    out: &Path,
    files: Vec<String>,
    opts: &[String],
    verbose: bool,
) -> Result<()> {
    println!(
        "{} Generating rpcx bindings from: {}",
        "→".cyan(),
        descriptor_set.display()
    );

    let options = options_from_args(opts)?;
    if verbose {
        println!("  rpcx module: {}", options.rpcx_module);
        println!("  paths: {}", options.paths);
        println!("  Output: {}", out.display());
    }

    let set = load_descriptor_set(descriptor_set, files)?;
    let written = write_generated(&set, options, out)?;

    println!("\n{}", "✓ Generation complete!".green().bold());
    if written.is_empty() {
        println!("  No services found, nothing written");
    } else {
        println!("\n{}", "Generated files:".bold());
        for path in &written {
            println!("  📄 {}", path.display());
        }
    }
    Ok(())
}

fn load_descriptor_set(path: &Path, files: Vec<String>) -> Result<DescriptorSet> {
    let parser = ProtobufParser::from_file(path)
        .context("Failed to load FileDescriptorSet")?
        .with_files_to_generate(files);
    parser
        .parse()
        .context("Failed to parse FileDescriptorSet")
}

/// Join `--opt` values into the parameter string protoc would pass
fn options_from_args(opts: &[String]) -> Result<PluginOptions> {
    let parameter = opts.join(",");
    PluginOptions::parse(Some(&parameter)).context("Invalid plugin option")
}

fn write_generated(set: &DescriptorSet, options: PluginOptions, out: &Path) -> Result<Vec<PathBuf>> {
    protoc_gen_rpcx_generator::generate_to_directory(set, options, out)
        .context("Failed to generate rpcx bindings")
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::compiler::CodeGeneratorRequest;
    use prost_types::{
        DescriptorProto, FileDescriptorProto, MethodDescriptorProto, ServiceDescriptorProto,
    };

    fn greeter_proto() -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some("helloworld/greeter.proto".to_string()),
            package: Some("helloworld".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![
                DescriptorProto {
                    name: Some("HelloRequest".to_string()),
                    ..Default::default()
                },
                DescriptorProto {
                    name: Some("HelloReply".to_string()),
                    ..Default::default()
                },
            ],
            service: vec![ServiceDescriptorProto {
                name: Some("Greeter".to_string()),
                method: vec![MethodDescriptorProto {
                    name: Some("sayHello".to_string()),
                    input_type: Some(".helloworld.HelloRequest".to_string()),
                    output_type: Some(".helloworld.HelloReply".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn request(parameter: Option<&str>) -> Vec<u8> {
        CodeGeneratorRequest {
            file_to_generate: vec!["helloworld/greeter.proto".to_string()],
            parameter: parameter.map(str::to_string),
            proto_file: vec![greeter_proto()],
            ..Default::default()
        }
        .encode_to_vec()
    }

    #[test]
    fn test_plugin_generates_one_file() {
        let response = run_plugin(&request(None));

        assert!(response.error.is_none());
        assert_eq!(response.supported_features, Some(Feature::Proto3Optional as u64));
        assert_eq!(response.file.len(), 1);
        assert_eq!(
            response.file[0].name.as_deref(),
            Some("helloworld/greeter.rpcx.pb.go")
        );
        let content = response.file[0].content.as_deref().unwrap();
        assert!(content.starts_with("// Code generated by protoc-gen-rpcx. DO NOT EDIT.\n"));
        assert!(content.contains("func RegisterForGreeter(s *server.Server, meta string) error {"));
    }

    #[test]
    fn test_plugin_reports_bad_parameter_in_response() {
        let response = run_plugin(&request(Some("frobnicate=yes")));

        assert!(response.file.is_empty());
        assert!(response.error.unwrap().contains("frobnicate"));
    }

    #[test]
    fn test_plugin_reports_undecodable_input() {
        let response = run_plugin(&[0xff, 0xff, 0xff]);
        assert!(response.error.is_some());
        assert!(response.file.is_empty());
    }

    #[test]
    fn test_options_from_args() {
        let options = options_from_args(&[
            "paths=source_relative".to_string(),
            "rpcx_module=example.com/rpcx".to_string(),
        ])
        .unwrap();
        assert_eq!(options.rpcx_module, "example.com/rpcx");
        assert!(options_from_args(&[]).is_ok());
        assert!(options_from_args(&["nope".to_string()]).is_err());
    }

    #[test]
    fn test_generate_command_writes_files() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let descriptor_path = temp_dir.path().join("api.pb");
        let set = prost_types::FileDescriptorSet {
            file: vec![greeter_proto()],
        };
        std::fs::write(&descriptor_path, set.encode_to_vec()).unwrap();

        let out = temp_dir.path().join("gen");
        generate_command(
            &descriptor_path,
            &out,
            Vec::new(),
            &["paths=source_relative".to_string()],
            false,
        )
        .unwrap();

        assert!(out.join("helloworld/greeter.rpcx.pb.go").exists());
    }
}
