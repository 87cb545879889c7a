//! Identifier helpers for emitting Go names from proto names

/// Go keywords, which can never be used as identifiers
const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Upper-case the first character so the name is exported in Go.
///
/// Only an ASCII leading character is converted; anything else is returned
/// as is.
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let mut out = String::with_capacity(s.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
    }
}

/// CamelCase a proto identifier the way protoc-gen-go names message types.
///
/// Underscores followed by a lower-case letter are dropped and the letter
/// is capitalised; a leading underscore becomes `X`.
pub fn go_camel_case(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    if bytes.first() == Some(&b'_') {
        out.push('X');
        i += 1;
    }

    while i < bytes.len() {
        let c = bytes[i];
        if c == b'_' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_lowercase() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() {
            out.push(c as char);
            i += 1;
            continue;
        }
        out.push(c.to_ascii_uppercase() as char);
        // Keep the run of lower-case letters that follows
        while i + 1 < bytes.len() && bytes[i + 1].is_ascii_lowercase() {
            i += 1;
            out.push(bytes[i] as char);
        }
        i += 1;
    }

    out
}

/// Go name of a message given its path relative to the proto package.
///
/// Nested messages are joined with `_`: `Outer.Inner` -> `Outer_Inner`.
pub fn go_message_name(relative_name: &str) -> String {
    relative_name
        .split('.')
        .filter(|part| !part.is_empty())
        .map(go_camel_case)
        .collect::<Vec<_>>()
        .join("_")
}

/// Derive a Go package name from an import path or proto package.
///
/// Uses the last path element and replaces anything that is not valid in
/// a Go identifier with `_`.
pub fn go_package_name(path: &str) -> String {
    let base = path.rsplit('/').next().unwrap_or(path);
    let mut name: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() {
        return "_".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) || GO_KEYWORDS.contains(&name.as_str()) {
        name.insert(0, '_');
    }
    name
}

/// Whether `s` can be used verbatim as a Go identifier
pub fn is_go_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let valid_start = match chars.next() {
        Some(c) => c.is_alphabetic() || c == '_',
        None => false,
    };
    valid_start && chars.all(|c| c.is_alphanumeric() || c == '_') && !GO_KEYWORDS.contains(&s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_first() {
        assert_eq!(upper_first(""), "");
        assert_eq!(upper_first("a"), "A");
        assert_eq!(upper_first("getUser"), "GetUser");
        assert_eq!(upper_first("GetUser"), "GetUser");
        assert_eq!(upper_first("_private"), "_private");
    }

    #[test]
    fn test_upper_first_leaves_non_ascii_alone() {
        assert_eq!(upper_first("élan"), "élan");
    }

    #[test]
    fn test_go_camel_case() {
        assert_eq!(go_camel_case("hello_request"), "HelloRequest");
        assert_eq!(go_camel_case("HelloReply"), "HelloReply");
        assert_eq!(go_camel_case("_my_field"), "XMyField");
        assert_eq!(go_camel_case("foo_bar2_baz"), "FooBar2Baz");
        assert_eq!(go_camel_case("Foo_Bar"), "Foo_Bar");
    }

    #[test]
    fn test_go_message_name_nested() {
        assert_eq!(go_message_name("Outer.Inner"), "Outer_Inner");
        assert_eq!(go_message_name("user_info"), "UserInfo");
    }

    #[test]
    fn test_go_package_name() {
        assert_eq!(go_package_name("github.com/acme/greeter"), "greeter");
        assert_eq!(go_package_name("example.com/my-api"), "my_api");
        assert_eq!(go_package_name("helloworld"), "helloworld");
        assert_eq!(go_package_name("example.com/2fa"), "_2fa");
        assert_eq!(go_package_name("type"), "_type");
    }

    #[test]
    fn test_is_go_identifier() {
        assert!(is_go_identifier("Greeter"));
        assert!(is_go_identifier("say_hello"));
        assert!(!is_go_identifier(""));
        assert!(!is_go_identifier("1abc"));
        assert!(!is_go_identifier("has-dash"));
        assert!(!is_go_identifier("func"));
    }
}
