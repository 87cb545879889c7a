//! Template loading and rendering of the Go file envelope

use crate::go::go_quote;
use crate::host::FileParts;
use protoc_gen_rpcx_common::{GeneratorError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

const FILE_TEMPLATE: &str = "file.go";

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("go_quote", go_quote_filter);

    tera.add_raw_template(FILE_TEMPLATE, include_str!("../templates/file.go.tera"))
        .map_err(|e| GeneratorError::Template(format!("Failed to load file.go template: {}", e)))?;

    Ok(tera)
}

/// Render a complete Go file: header, package clause, imports and body
pub fn render_file(
    tera: &Tera,
    parts: &FileParts,
    compiler_version: Option<&str>,
) -> Result<String> {
    let mut context = tera::Context::from_serialize(parts)
        .map_err(|e| GeneratorError::Template(format!("Invalid template context: {}", e)))?;
    context.insert("compiler_version", &compiler_version);

    let rendered = tera
        .render(FILE_TEMPLATE, &context)
        .map_err(|e| GeneratorError::Template(format!("{:?}", e)))?;

    let mut out = rendered.trim_end().to_string();
    out.push('\n');
    Ok(out)
}

/// Filter to quote a value as a Go string literal
fn go_quote_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("go_quote filter expects a string"))?;

    Ok(Value::String(go_quote(s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ImportSpec;

    fn parts(std: Vec<ImportSpec>, other: Vec<ImportSpec>) -> FileParts {
        FileParts {
            source: "helloworld.proto".to_string(),
            package: "helloworld".to_string(),
            std_imports: std,
            other_imports: other,
            body: "type A struct {\n}\n".to_string(),
        }
    }

    fn import(path: &str) -> ImportSpec {
        ImportSpec {
            alias: None,
            path: path.to_string(),
        }
    }

    #[test]
    fn test_render_with_import_groups() {
        let tera = load_templates().unwrap();
        let mut server = import("github.com/smallnest/rpcx/v5/server");
        server.alias = Some("rpcxserver".to_string());

        let out = render_file(
            &tera,
            &parts(vec![import("context")], vec![server]),
            Some("25.1.0"),
        )
        .unwrap();

        let expected = "\
// Code generated by protoc-gen-rpcx. DO NOT EDIT.
// versions:
// \tprotoc v25.1.0
// source: helloworld.proto

package helloworld

import (
\t\"context\"

\trpcxserver \"github.com/smallnest/rpcx/v5/server\"
)

type A struct {
}
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_render_without_imports() {
        let tera = load_templates().unwrap();
        let out = render_file(&tera, &parts(vec![], vec![]), None).unwrap();

        let expected = "\
// Code generated by protoc-gen-rpcx. DO NOT EDIT.
// source: helloworld.proto

package helloworld

type A struct {
}
";
        assert_eq!(out, expected);
    }
}
