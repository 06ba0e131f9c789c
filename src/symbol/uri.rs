//! Symbol uri grammar.
//!
//! ```text
//! <symbol>     ::= 'local ' <local-id>
//!                | <scheme> ' ' <manager> ' ' <name> ' ' <version> ' ' <descriptor>+
//! <descriptor> ::= <name> '/'                    namespace
//!                | <name> '#'                    type
//!                | <name> '.'                    term
//!                | <name> ':'                    meta
//!                | <name> '!'                    macro
//!                | <name> '(' <disambig>? ').'   method
//!                | '(' <name> ')'                parameter
//!                | '[' <name> ']'                type parameter
//! ```
//!
//! Header fields escape a literal space as two spaces. Names made only of
//! `[A-Za-z0-9_+\-$]` are written bare; anything else is wrapped in backticks
//! with inner backticks doubled.

use super::{DescriptorKind, SymbolDescriptor, SymbolPackage};
use super::error::{SymbolParseError, SymbolResult};

pub(crate) const LOCAL_PREFIX: &str = "local ";

/// Parsed pieces of a symbol uri.
pub(crate) struct ParsedUri {
    pub scheme: String,
    pub package: SymbolPackage,
    pub descriptors: Vec<SymbolDescriptor>,
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-' | '$')
}

pub(crate) fn is_simple_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_identifier_char)
}

pub(crate) fn parse_uri(uri: &str) -> SymbolResult<ParsedUri> {
    if uri.is_empty() {
        return Err(SymbolParseError::Empty);
    }

    if let Some(id) = uri.strip_prefix(LOCAL_PREFIX) {
        if !is_simple_identifier(id) {
            return Err(SymbolParseError::InvalidLocal { uri: uri.to_string() });
        }
        return Ok(ParsedUri {
            scheme: "local".to_string(),
            package: SymbolPackage::default(),
            descriptors: vec![SymbolDescriptor::new(id, DescriptorKind::Local)],
        });
    }

    let mut cursor = Cursor::new(uri);
    let scheme = cursor.header_field("scheme")?;
    let manager = cursor.header_field("package manager")?;
    let name = cursor.header_field("package name")?;
    let version = cursor.header_field("package version")?;

    if cursor.at_end() {
        return Err(SymbolParseError::NoDescriptors { uri: uri.to_string() });
    }

    let mut descriptors = Vec::new();
    while !cursor.at_end() {
        descriptors.push(cursor.descriptor()?);
    }

    Ok(ParsedUri {
        scheme,
        package: SymbolPackage::new(manager, name, version),
        descriptors,
    })
}

pub(crate) fn format_uri(
    scheme: &str,
    package: &SymbolPackage,
    descriptors: &[SymbolDescriptor],
) -> String {
    if let [only] = descriptors {
        if only.kind == DescriptorKind::Local {
            return format!("{LOCAL_PREFIX}{}", only.name);
        }
    }

    let mut out = String::new();
    for field in [
        scheme,
        package.manager.as_str(),
        package.name.as_str(),
        package.version.as_str(),
    ] {
        out.push_str(&field.replace(' ', "  "));
        out.push(' ');
    }
    for descriptor in descriptors {
        push_descriptor(&mut out, descriptor);
    }
    out
}

pub(crate) fn push_descriptor(out: &mut String, descriptor: &SymbolDescriptor) {
    let name = escape_name(&descriptor.name);
    match descriptor.kind {
        DescriptorKind::Namespace => {
            out.push_str(&name);
            out.push('/');
        }
        DescriptorKind::Type => {
            out.push_str(&name);
            out.push('#');
        }
        DescriptorKind::Term => {
            out.push_str(&name);
            out.push('.');
        }
        DescriptorKind::Meta => {
            out.push_str(&name);
            out.push(':');
        }
        DescriptorKind::Macro => {
            out.push_str(&name);
            out.push('!');
        }
        DescriptorKind::Method => {
            out.push_str(&name);
            out.push('(');
            if let Some(disambiguator) = &descriptor.disambiguator {
                out.push_str(disambiguator);
            }
            out.push_str(").");
        }
        DescriptorKind::Parameter => {
            out.push('(');
            out.push_str(&name);
            out.push(')');
        }
        DescriptorKind::TypeParameter => {
            out.push('[');
            out.push_str(&name);
            out.push(']');
        }
        // Only reachable for a malformed hand-built symbol; write it the way
        // a local id is written.
        DescriptorKind::Local => out.push_str(&name),
    }
}

pub(crate) fn escape_name(name: &str) -> String {
    if is_simple_identifier(name) {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, reason: impl Into<String>) -> SymbolParseError {
        SymbolParseError::Malformed {
            uri: self.input.to_string(),
            position: self.pos,
            reason: reason.into(),
        }
    }

    fn expect(&mut self, expected: char) -> SymbolResult<()> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected `{expected}`, found `{c}`"))),
            None => Err(self.error(format!("expected `{expected}`, found end of input"))),
        }
    }

    /// A space-terminated header field where `"  "` stands for a literal space.
    fn header_field(&mut self, field: &'static str) -> SymbolResult<String> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(SymbolParseError::MissingField {
                        uri: self.input.to_string(),
                        field,
                    });
                }
                Some(' ') if self.peek() == Some(' ') => {
                    self.bump();
                    value.push(' ');
                }
                Some(' ') => break,
                Some(c) => value.push(c),
            }
        }
        if value.is_empty() {
            return Err(SymbolParseError::MissingField {
                uri: self.input.to_string(),
                field,
            });
        }
        Ok(value)
    }

    fn descriptor(&mut self) -> SymbolResult<SymbolDescriptor> {
        match self.peek() {
            Some('(') => {
                self.bump();
                let name = self.name()?;
                self.expect(')')?;
                Ok(SymbolDescriptor::new(name, DescriptorKind::Parameter))
            }
            Some('[') => {
                self.bump();
                let name = self.name()?;
                self.expect(']')?;
                Ok(SymbolDescriptor::new(name, DescriptorKind::TypeParameter))
            }
            _ => {
                let name = self.name()?;
                let kind = match self.bump() {
                    Some('/') => DescriptorKind::Namespace,
                    Some('#') => DescriptorKind::Type,
                    Some('.') => DescriptorKind::Term,
                    Some(':') => DescriptorKind::Meta,
                    Some('!') => DescriptorKind::Macro,
                    Some('(') => {
                        let disambiguator = self.simple_identifier();
                        self.expect(')')?;
                        self.expect('.')?;
                        let disambiguator = (!disambiguator.is_empty()).then_some(disambiguator);
                        return Ok(SymbolDescriptor::method(name, disambiguator));
                    }
                    Some(c) => return Err(self.error(format!("unknown descriptor suffix `{c}`"))),
                    None => return Err(self.error("descriptor without suffix")),
                };
                Ok(SymbolDescriptor::new(name, kind))
            }
        }
    }

    fn name(&mut self) -> SymbolResult<String> {
        if self.peek() == Some('`') {
            return self.escaped_identifier();
        }
        let name = self.simple_identifier();
        if name.is_empty() {
            return Err(self.error("expected a name"));
        }
        Ok(name)
    }

    fn simple_identifier(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_identifier_char(c)) {
            self.bump();
        }
        self.input[start..self.pos].to_string()
    }

    fn escaped_identifier(&mut self) -> SymbolResult<String> {
        self.expect('`')?;
        let mut name = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated escaped name")),
                Some('`') if self.peek() == Some('`') => {
                    self.bump();
                    name.push('`');
                }
                Some('`') => break,
                Some(c) => name.push(c),
            }
        }
        if name.is_empty() {
            return Err(self.error("empty escaped name"));
        }
        Ok(name)
    }
}
