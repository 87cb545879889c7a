//! rpcx service bindings
//!
//! For every service in a file the plugin emits:
//! - a server interface the implementation must satisfy
//! - `RegisterFor<S>`, which registers `<S>Impl` with an rpcx server
//! - `<S>Client`, a typed wrapper around a shared `client.XClient`, with a
//!   synchronous and an asynchronous (`...Go`) method per RPC
//! - `<S>Methods`, a string table mapping exported method names to the wire
//!   method names

use crate::go::{
    Expr, Field, Func, GoDecl, Interface, InterfaceMethod, Param, Signature, Stmt, Struct,
};
use crate::host::GeneratorHost;
use crate::plugin::{GeneratorContext, Plugin};
use protoc_gen_rpcx_common::naming::{is_go_identifier, upper_first};
use protoc_gen_rpcx_common::{
    FileDescriptor, GeneratorError, MethodDescriptor, PluginOptions, Result, ServiceDescriptor,
};

/// Package names the generated code qualifies rpcx and context references with
struct Runtime {
    server: String,
    client: String,
    context: String,
}

impl Runtime {
    fn context_type(&self) -> String {
        format!("{}.Context", self.context)
    }

    fn call_type(&self) -> String {
        format!("*{}.Call", self.client)
    }

    fn xclient_type(&self) -> String {
        format!("{}.XClient", self.client)
    }
}

/// A method with its resolved Go names
struct ResolvedMethod<'a> {
    method: &'a MethodDescriptor,
    go_name: String,
    input: String,
    output: String,
}

/// Generates rpcx server and client bindings
#[derive(Debug, Default)]
pub struct RpcxPlugin {
    options: PluginOptions,
}

impl RpcxPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_name(&self, kind: &'static str, name: &str) -> Result<()> {
        if self.options.reject_empty_names && !is_go_identifier(&upper_first(name)) {
            return Err(GeneratorError::InvalidName {
                kind,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Resolve a proto type through the host, recording the use first so
    /// the defining package gets imported
    fn type_name(host: &mut dyn GeneratorHost, proto_name: &str) -> Result<String> {
        host.record_type_use(proto_name);
        host.type_name(proto_name)
    }

    fn generate_service(
        &self,
        file: &FileDescriptor,
        service: &ServiceDescriptor,
        index: usize,
        runtime: &Runtime,
        host: &mut dyn GeneratorHost,
    ) -> Result<()> {
        self.check_name("service", &service.name)?;
        let service_name = upper_first(&service.name);

        // Resolve everything before emitting so a failure leaves no
        // half-written service behind
        let mut methods = Vec::with_capacity(service.methods.len());
        for method in &service.methods {
            self.check_name("method", &method.name)?;
            if method.is_streaming() {
                tracing::warn!(
                    service = %service.name,
                    method = %method.name,
                    "rpcx has no streaming calls, generating a unary stub"
                );
            }
            methods.push(ResolvedMethod {
                method,
                go_name: upper_first(&method.name),
                input: Self::type_name(host, method.input_type.as_str())?,
                output: Self::type_name(host, method.output_type.as_str())?,
            });
        }

        tracing::debug!(
            service = %service_name,
            index,
            methods = methods.len(),
            "generating rpcx service"
        );

        host.emit(&GoDecl::Comment(vec![
            "The following code was generated by rpcx".to_string(),
            format!("Generated from {}", file.name),
        ]));
        host.emit(&GoDecl::Comment(vec![
            "================== server skeleton ===================".to_string(),
        ]));
        host.emit(&server_interface(&service_name, &methods, runtime));
        host.emit(&register_func(&service_name, &methods, runtime));

        host.emit(&GoDecl::Comment(vec![
            "================== client stub ===================".to_string(),
        ]));
        host.emit(&client_struct(&service_name, runtime));
        host.emit(&methods_struct(&service_name, &methods));
        host.emit(&client_constructor(&service_name, &methods, runtime));
        for method in &methods {
            host.emit(&client_call(&service_name, method, runtime));
            host.emit(&client_go(&service_name, method, runtime));
        }

        Ok(())
    }
}

impl Plugin for RpcxPlugin {
    fn name(&self) -> &str {
        "rpcx"
    }

    fn init(&mut self, context: &GeneratorContext) {
        self.options = context.options.clone();
    }

    fn generate(&mut self, file: &FileDescriptor, host: &mut dyn GeneratorHost) -> Result<()> {
        if !file.has_services() {
            tracing::debug!(file = %file.name, "no services, skipping");
            return Ok(());
        }

        let server = host.add_import(&self.options.server_package());
        let client = host.add_import(&self.options.client_package());
        let protocol = host.add_import(&self.options.protocol_package());
        let context = host.add_import("context");
        let runtime = Runtime {
            server,
            client,
            context,
        };

        for (index, service) in file.services.iter().enumerate() {
            self.generate_service(file, service, index, &runtime, host)?;
        }

        host.emit(&GoDecl::Var {
            doc: vec![
                "Reference imports to suppress errors if they are not otherwise used.".to_string(),
            ],
            name: "_".to_string(),
            value: Expr::path(&format!("{}.NewMessage", protocol)),
        });

        Ok(())
    }
}

/// `type S interface { M(ctx, args, reply) error ... }`
fn server_interface(service_name: &str, methods: &[ResolvedMethod], runtime: &Runtime) -> GoDecl {
    GoDecl::Interface(Interface {
        doc: vec![format!(
            "{} is the server interface of the {} service.",
            service_name, service_name
        )],
        name: service_name.to_string(),
        methods: methods
            .iter()
            .map(|m| InterfaceMethod {
                doc: vec![format!("{} is server rpc method as defined", m.go_name)],
                name: m.go_name.clone(),
                signature: Signature::new(
                    vec![
                        Param::named("ctx", runtime.context_type()),
                        Param::named("args", format!("*{}", m.input)),
                        Param::named("reply", format!("*{}", m.output)),
                    ],
                    vec![Param::unnamed("error")],
                ),
            })
            .collect(),
    })
}

/// `RegisterForS` instantiates `SImpl` and touches every method so a
/// missing one is a compile error in the user's package
fn register_func(service_name: &str, methods: &[ResolvedMethod], runtime: &Runtime) -> GoDecl {
    let mut body = vec![Stmt::Define(
        "impl".to_string(),
        Expr::New(format!("{}Impl", service_name)),
    )];
    body.extend(
        methods
            .iter()
            .map(|m| Stmt::Discard(Expr::path(&format!("impl.{}", m.go_name)))),
    );
    body.push(Stmt::Return(vec![Expr::call(
        Expr::path("s.RegisterName"),
        vec![
            Expr::str(service_name),
            Expr::ident("impl"),
            Expr::ident("meta"),
        ],
    )]));

    GoDecl::Func(Func {
        doc: vec![
            format!(
                "RegisterFor{} register the '{}' service to a server.",
                service_name, service_name
            ),
            format!(
                "And will check all methods of '{}' which must be implemented.",
                service_name
            ),
        ],
        receiver: None,
        name: format!("RegisterFor{}", service_name),
        signature: Signature::new(
            vec![
                Param::named("s", format!("*{}.Server", runtime.server)),
                Param::named("meta", "string"),
            ],
            vec![Param::unnamed("error")],
        ),
        body,
    })
}

fn client_struct(service_name: &str, runtime: &Runtime) -> GoDecl {
    GoDecl::Struct(Struct {
        doc: vec![format!("{}Client is a client wrapped XClient.", service_name)],
        name: format!("{}Client", service_name),
        fields: vec![
            Field::new("xclient", runtime.xclient_type()),
            Field::new("fx", format!("{}Methods", service_name)),
        ],
    })
}

fn methods_struct(service_name: &str, methods: &[ResolvedMethod]) -> GoDecl {
    GoDecl::Struct(Struct {
        doc: vec![format!(
            "{}Methods holds the wire names of the {} methods.",
            service_name, service_name
        )],
        name: format!("{}Methods", service_name),
        fields: methods
            .iter()
            .map(|m| Field::new(m.go_name.clone(), "string"))
            .collect(),
    })
}

fn client_constructor(service_name: &str, methods: &[ResolvedMethod], runtime: &Runtime) -> GoDecl {
    let client_name = format!("{}Client", service_name);
    let table = Expr::Composite {
        ty: format!("{}Methods", service_name),
        fields: methods
            .iter()
            .map(|m| (m.go_name.clone(), Expr::str(m.method.name.clone())))
            .collect(),
    };

    GoDecl::Func(Func {
        doc: vec![
            format!("Make{} wraps a XClient as {}.", client_name, client_name),
            "You can pass a shared XClient object created by anywhere.".to_string(),
        ],
        receiver: None,
        name: format!("Make{}", client_name),
        signature: Signature::new(
            vec![Param::named("xclient", runtime.xclient_type())],
            vec![Param::unnamed(format!("*{}", client_name))],
        ),
        body: vec![Stmt::Return(vec![Expr::AddrOf(Box::new(Expr::Composite {
            ty: client_name.clone(),
            fields: vec![
                ("xclient".to_string(), Expr::ident("xclient")),
                ("fx".to_string(), table),
            ],
        }))])],
    })
}

fn client_receiver(service_name: &str) -> Param {
    Param::named("c", format!("*{}Client", service_name))
}

/// Blocking call: allocates the reply and waits for it
fn client_call(service_name: &str, method: &ResolvedMethod, runtime: &Runtime) -> GoDecl {
    GoDecl::Func(Func {
        doc: vec![format!("{} is client rpc method as defined", method.go_name)],
        receiver: Some(client_receiver(service_name)),
        name: method.go_name.clone(),
        signature: Signature::new(
            vec![
                Param::named("ctx", runtime.context_type()),
                Param::named("args", format!("*{}", method.input)),
            ],
            vec![
                Param::named("reply", format!("*{}", method.output)),
                Param::named("err", "error"),
            ],
        ),
        body: vec![
            Stmt::Assign("reply".to_string(), Expr::zero_ptr(method.output.clone())),
            Stmt::Assign(
                "err".to_string(),
                Expr::call(
                    Expr::path("c.xclient.Call"),
                    vec![
                        Expr::ident("ctx"),
                        Expr::str(method.method.name.clone()),
                        Expr::ident("args"),
                        Expr::ident("reply"),
                    ],
                ),
            ),
            Stmt::Return(vec![Expr::ident("reply"), Expr::ident("err")]),
        ],
    })
}

/// Asynchronous call: completion is signalled on `done`
fn client_go(service_name: &str, method: &ResolvedMethod, runtime: &Runtime) -> GoDecl {
    let go_name = format!("{}Go", method.go_name);
    GoDecl::Func(Func {
        doc: vec![format!("{} is client rpc method as defined", go_name)],
        receiver: Some(client_receiver(service_name)),
        name: go_name,
        signature: Signature::new(
            vec![
                Param::named("ctx", runtime.context_type()),
                Param::named("args", format!("*{}", method.input)),
                Param::named("done", format!("chan {}", runtime.call_type())),
            ],
            vec![
                Param::named("call", runtime.call_type()),
                Param::named("err", "error"),
            ],
        ),
        body: vec![Stmt::Return(vec![Expr::call(
            Expr::path("c.xclient.Go"),
            vec![
                Expr::ident("ctx"),
                Expr::str(method.method.name.clone()),
                Expr::ident("args"),
                Expr::zero_ptr(method.output.clone()),
                Expr::ident("done"),
            ],
        )])],
    })
}
