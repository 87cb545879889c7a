//! Typed Go declarations
//!
//! Plugins describe what to emit as values of these types and the host
//! renders them through a [`CodeWriter`]. Only the subset of Go the rpcx
//! bindings need is modelled.

use super::CodeWriter;

/// A top-level declaration
#[derive(Debug, Clone, PartialEq)]
pub enum GoDecl {
    /// Free-standing comment block, one entry per line
    Comment(Vec<String>),
    Interface(Interface),
    Struct(Struct),
    Func(Func),
    /// `var name = value`
    Var {
        doc: Vec<String>,
        name: String,
        value: Expr,
    },
}

/// `type Name interface { ... }`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interface {
    pub doc: Vec<String>,
    pub name: String,
    pub methods: Vec<InterfaceMethod>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceMethod {
    pub doc: Vec<String>,
    pub name: String,
    pub signature: Signature,
}

/// `type Name struct { ... }`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Struct {
    pub doc: Vec<String>,
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: String,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// A function or method declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Func {
    pub doc: Vec<String>,
    pub receiver: Option<Param>,
    pub name: String,
    pub signature: Signature,
    pub body: Vec<Stmt>,
}

/// Parameter and result lists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

impl Signature {
    pub fn new(params: Vec<Param>, results: Vec<Param>) -> Self {
        Self { params, results }
    }
}

/// A parameter or result; results may be unnamed
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Option<String>,
    pub ty: String,
}

impl Param {
    pub fn named(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ty: ty.into(),
        }
    }

    pub fn unnamed(ty: impl Into<String>) -> Self {
        Self {
            name: None,
            ty: ty.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name := value`
    Define(String, Expr),
    /// `lhs = value`
    Assign(String, Expr),
    /// `_ = value`
    Discard(Expr),
    Return(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    /// Go string literal of the contained text
    Str(String),
    /// `new(T)`
    New(String),
    /// `&expr`
    AddrOf(Box<Expr>),
    /// `T{key: value, ...}`
    Composite {
        ty: String,
        fields: Vec<(String, Expr)>,
    },
    /// `expr.name`
    Selector(Box<Expr>, String),
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    /// `&T{}`
    pub fn zero_ptr(ty: impl Into<String>) -> Self {
        Expr::AddrOf(Box::new(Expr::Composite {
            ty: ty.into(),
            fields: Vec::new(),
        }))
    }

    /// Dotted path such as `c.xclient.Call`
    pub fn path(path: &str) -> Self {
        let mut parts = path.split('.');
        let mut expr = Expr::ident(parts.next().unwrap_or_default());
        for part in parts {
            expr = Expr::Selector(Box::new(expr), part.to_string());
        }
        expr
    }

    pub fn call(func: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            func: Box::new(func),
            args,
        }
    }

    fn is_multiline(&self) -> bool {
        match self {
            Expr::Composite { fields, .. } => !fields.is_empty(),
            Expr::AddrOf(inner) => inner.is_multiline(),
            Expr::Selector(inner, _) => inner.is_multiline(),
            Expr::Call { func, args } => func.is_multiline() || args.iter().any(Expr::is_multiline),
            _ => false,
        }
    }
}

/// Quote text as a Go interpreted string literal
pub fn go_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

impl GoDecl {
    pub fn render(&self, w: &mut CodeWriter) {
        match self {
            GoDecl::Comment(lines) => write_doc(w, lines),
            GoDecl::Interface(iface) => iface.render(w),
            GoDecl::Struct(st) => st.render(w),
            GoDecl::Func(func) => func.render(w),
            GoDecl::Var { doc, name, value } => {
                write_doc(w, doc);
                w.write(&format!("var {} = ", name));
                value.render(w);
                w.writeln("");
            }
        }
    }
}

impl Interface {
    fn render(&self, w: &mut CodeWriter) {
        write_doc(w, &self.doc);
        w.block(&format!("type {} interface", self.name), |w| {
            for method in &self.methods {
                write_doc(w, &method.doc);
                w.write(&method.name);
                method.signature.render(w);
                w.writeln("");
            }
        });
    }
}

impl Struct {
    fn render(&self, w: &mut CodeWriter) {
        write_doc(w, &self.doc);
        let width = self.fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
        w.block(&format!("type {} struct", self.name), |w| {
            for field in &self.fields {
                w.writeln(&format!("{:<width$} {}", field.name, field.ty, width = width));
            }
        });
    }
}

impl Func {
    fn render(&self, w: &mut CodeWriter) {
        write_doc(w, &self.doc);
        w.write("func ");
        if let Some(receiver) = &self.receiver {
            w.write("(");
            receiver.render(w);
            w.write(") ");
        }
        w.write(&self.name);
        self.signature.render(w);
        w.writeln(" {");
        {
            let _indent = w.indent();
            for stmt in &self.body {
                stmt.render(w);
            }
        }
        w.writeln("}");
    }
}

impl Signature {
    fn render(&self, w: &mut CodeWriter) {
        w.write("(");
        w.write_separated(&self.params, ", ", |w, p| p.render(w));
        w.write(")");

        match self.results.as_slice() {
            [] => {}
            [single] if single.name.is_none() => {
                w.write(" ");
                w.write(&single.ty);
            }
            results => {
                w.write(" (");
                w.write_separated(results, ", ", |w, p| p.render(w));
                w.write(")");
            }
        }
    }
}

impl Param {
    fn render(&self, w: &mut CodeWriter) {
        match &self.name {
            Some(name) => w.write(&format!("{} {}", name, self.ty)),
            None => w.write(&self.ty),
        }
    }
}

impl Stmt {
    fn render(&self, w: &mut CodeWriter) {
        match self {
            Stmt::Define(name, value) => {
                w.write(&format!("{} := ", name));
                value.render(w);
            }
            Stmt::Assign(lhs, value) => {
                w.write(&format!("{} = ", lhs));
                value.render(w);
            }
            Stmt::Discard(value) => {
                w.write("_ = ");
                value.render(w);
            }
            Stmt::Return(values) => {
                w.write("return");
                if !values.is_empty() {
                    w.write(" ");
                    w.write_separated(values, ", ", |w, v| v.render(w));
                }
            }
        }
        w.writeln("");
    }
}

impl Expr {
    fn render(&self, w: &mut CodeWriter) {
        match self {
            Expr::Ident(name) => w.write(name),
            Expr::Str(value) => w.write(&go_quote(value)),
            Expr::New(ty) => w.write(&format!("new({})", ty)),
            Expr::AddrOf(inner) => {
                w.write("&");
                inner.render(w);
            }
            Expr::Composite { ty, fields } => {
                w.write(ty);
                if fields.is_empty() {
                    w.write("{}");
                    return;
                }
                w.writeln("{");
                // Keys line up unless a value spans several lines
                let width = if fields.iter().any(|(_, v)| v.is_multiline()) {
                    0
                } else {
                    fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0)
                };
                {
                    let _indent = w.indent();
                    for (key, value) in fields {
                        w.write(&format!("{:<width$} ", format!("{}:", key), width = width + 1));
                        value.render(w);
                        w.writeln(",");
                    }
                }
                w.write("}");
            }
            Expr::Selector(inner, name) => {
                inner.render(w);
                w.write(".");
                w.write(name);
            }
            Expr::Call { func, args } => {
                func.render(w);
                w.write("(");
                w.write_separated(args, ", ", |w, a| a.render(w));
                w.write(")");
            }
        }
    }
}

fn write_doc(w: &mut CodeWriter, lines: &[String]) {
    for line in lines {
        w.comment(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(decl: &GoDecl) -> String {
        let mut w = CodeWriter::new();
        decl.render(&mut w);
        w.into_string()
    }

    #[test]
    fn test_go_quote() {
        assert_eq!(go_quote("sayHello"), "\"sayHello\"");
        assert_eq!(go_quote("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(go_quote("line\n"), "\"line\\n\"");
    }

    #[test]
    fn test_interface() {
        let decl = GoDecl::Interface(Interface {
            doc: vec![],
            name: "Greeter".to_string(),
            methods: vec![InterfaceMethod {
                doc: vec!["SayHello is server rpc method as defined".to_string()],
                name: "SayHello".to_string(),
                signature: Signature::new(
                    vec![
                        Param::named("ctx", "context.Context"),
                        Param::named("args", "*HelloRequest"),
                    ],
                    vec![Param::unnamed("error")],
                ),
            }],
        });

        assert_eq!(
            render(&decl),
            "type Greeter interface {\n\t// SayHello is server rpc method as defined\n\tSayHello(ctx context.Context, args *HelloRequest) error\n}\n"
        );
    }

    #[test]
    fn test_empty_interface() {
        let decl = GoDecl::Interface(Interface {
            name: "Empty".to_string(),
            ..Default::default()
        });
        assert_eq!(render(&decl), "type Empty interface {\n}\n");
    }

    #[test]
    fn test_struct_fields_are_aligned() {
        let decl = GoDecl::Struct(Struct {
            doc: vec!["GreeterClient is a client wrapped XClient.".to_string()],
            name: "GreeterClient".to_string(),
            fields: vec![
                Field::new("xclient", "client.XClient"),
                Field::new("fx", "GreeterMethods"),
            ],
        });

        assert_eq!(
            render(&decl),
            "// GreeterClient is a client wrapped XClient.\ntype GreeterClient struct {\n\txclient client.XClient\n\tfx      GreeterMethods\n}\n"
        );
    }

    #[test]
    fn test_method_with_named_results() {
        let decl = GoDecl::Func(Func {
            doc: vec![],
            receiver: Some(Param::named("c", "*GreeterClient")),
            name: "SayHello".to_string(),
            signature: Signature::new(
                vec![
                    Param::named("ctx", "context.Context"),
                    Param::named("args", "*HelloRequest"),
                ],
                vec![
                    Param::named("reply", "*HelloReply"),
                    Param::named("err", "error"),
                ],
            ),
            body: vec![
                Stmt::Assign("reply".to_string(), Expr::zero_ptr("HelloReply")),
                Stmt::Assign(
                    "err".to_string(),
                    Expr::call(
                        Expr::path("c.xclient.Call"),
                        vec![
                            Expr::ident("ctx"),
                            Expr::str("sayHello"),
                            Expr::ident("args"),
                            Expr::ident("reply"),
                        ],
                    ),
                ),
                Stmt::Return(vec![Expr::ident("reply"), Expr::ident("err")]),
            ],
        });

        assert_eq!(
            render(&decl),
            "func (c *GreeterClient) SayHello(ctx context.Context, args *HelloRequest) (reply *HelloReply, err error) {\n\
             \treply = &HelloReply{}\n\
             \terr = c.xclient.Call(ctx, \"sayHello\", args, reply)\n\
             \treturn reply, err\n\
             }\n"
        );
    }

    #[test]
    fn test_nested_composite_literal() {
        let decl = GoDecl::Func(Func {
            name: "MakeGreeterClient".to_string(),
            signature: Signature::new(
                vec![Param::named("xclient", "client.XClient")],
                vec![Param::unnamed("*GreeterClient")],
            ),
            body: vec![Stmt::Return(vec![Expr::AddrOf(Box::new(Expr::Composite {
                ty: "GreeterClient".to_string(),
                fields: vec![
                    ("xclient".to_string(), Expr::ident("xclient")),
                    (
                        "fx".to_string(),
                        Expr::Composite {
                            ty: "GreeterMethods".to_string(),
                            fields: vec![
                                ("SayHello".to_string(), Expr::str("sayHello")),
                                ("Ping".to_string(), Expr::str("ping")),
                            ],
                        },
                    ),
                ],
            }))])],
            ..Default::default()
        });

        let expected = "\
func MakeGreeterClient(xclient client.XClient) *GreeterClient {
\treturn &GreeterClient{
\t\txclient: xclient,
\t\tfx: GreeterMethods{
\t\t\tSayHello: \"sayHello\",
\t\t\tPing:     \"ping\",
\t\t},
\t}
}
";
        assert_eq!(render(&decl), expected);
    }

    #[test]
    fn test_var_and_comment() {
        let var = GoDecl::Var {
            doc: vec!["keep protocol imported".to_string()],
            name: "_".to_string(),
            value: Expr::path("protocol.NewMessage"),
        };
        assert_eq!(
            render(&var),
            "// keep protocol imported\nvar _ = protocol.NewMessage\n"
        );

        let comment = GoDecl::Comment(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(render(&comment), "// a\n// b\n");
    }
}
