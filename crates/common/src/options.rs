//! Plugin options
//!
//! protoc hands plugin options over as a single comma-separated parameter
//! string (`--rpcx_opt=paths=source_relative,rpcx_module=...`). The CLI
//! builds the same string from its `--opt` flags so both entry points share
//! one parser.

use crate::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default rpcx module the generated imports point at
pub const DEFAULT_RPCX_MODULE: &str = "github.com/smallnest/rpcx/v5";

/// Where generated files are placed relative to the output directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathsMode {
    /// Under the Go import path of the file (protoc-gen-go default)
    #[default]
    Import,
    /// Next to the `.proto` file, mirroring its directory
    SourceRelative,
}

impl FromStr for PathsMode {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "import" => Ok(PathsMode::Import),
            "source_relative" => Ok(PathsMode::SourceRelative),
            other => Err(GeneratorError::InvalidParameter(format!(
                "paths must be `import` or `source_relative`, got `{}`",
                other
            ))),
        }
    }
}

impl fmt::Display for PathsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathsMode::Import => write!(f, "import"),
            PathsMode::SourceRelative => write!(f, "source_relative"),
        }
    }
}

/// Options controlling generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginOptions {
    /// Module prefix for the rpcx `server`, `client` and `protocol` packages
    pub rpcx_module: String,

    pub paths: PathsMode,

    /// Go import path overrides keyed by proto file (`M` parameters)
    pub import_overrides: BTreeMap<String, String>,

    /// Fail on empty or non-identifier service/method names instead of
    /// emitting degenerate Go
    pub reject_empty_names: bool,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            rpcx_module: DEFAULT_RPCX_MODULE.to_string(),
            paths: PathsMode::default(),
            import_overrides: BTreeMap::new(),
            reject_empty_names: true,
        }
    }
}

impl PluginOptions {
    /// Parse a protoc parameter string. `None` or an empty string yields the
    /// defaults.
    pub fn parse(parameter: Option<&str>) -> Result<Self> {
        let mut options = Self::default();
        let Some(parameter) = parameter else {
            return Ok(options);
        };

        for part in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                GeneratorError::InvalidParameter(format!("expected key=value, got `{}`", part))
            })?;

            match key {
                "rpcx_module" => {
                    let module = value.trim_end_matches('/');
                    if module.is_empty() {
                        return Err(GeneratorError::InvalidParameter(
                            "rpcx_module must not be empty".to_string(),
                        ));
                    }
                    options.rpcx_module = module.to_string();
                }
                "paths" => options.paths = value.parse()?,
                "reject_empty_names" => {
                    options.reject_empty_names = value.parse().map_err(|_| {
                        GeneratorError::InvalidParameter(format!(
                            "reject_empty_names must be true or false, got `{}`",
                            value
                        ))
                    })?;
                }
                _ if key.len() > 1 && key.starts_with('M') => {
                    options
                        .import_overrides
                        .insert(key[1..].to_string(), value.to_string());
                }
                _ => {
                    return Err(GeneratorError::InvalidParameter(format!(
                        "unknown option `{}`",
                        key
                    )))
                }
            }
        }

        Ok(options)
    }

    pub fn server_package(&self) -> String {
        format!("{}/server", self.rpcx_module)
    }

    pub fn client_package(&self) -> String {
        format!("{}/client", self.rpcx_module)
    }

    pub fn protocol_package(&self) -> String {
        format!("{}/protocol", self.rpcx_module)
    }
}
