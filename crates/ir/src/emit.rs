//! Thrift source emission.
//!
//! Leaf nodes (primitives, types, literals) implement [`Emit`]. Whole files go
//! through [`ThriftWriter`], which can fail: annotation values must be quoted
//! string literals and anything else is reported instead of being dropped.

use std::collections::{BTreeMap, BTreeSet};

use crate::ast::{
    Annotation, Comment, Constant, Definitions, Enum, EnumMember, Field, File, Function,
    IdlSchema, Import, Message, Namespace, Primitive, Service, Type, Typedef, path_stem,
};
use crate::constant::ConstantValue;
use crate::error::EmitError;
use tracing::debug;

const INDENT: &str = "    ";

/// Trait for rendering leaf IR nodes as Thrift text.
pub trait Emit {
    /// The node as it appears in Thrift source.
    fn emit(&self) -> String;
}

// =============================================================================
// Leaf nodes
// =============================================================================

impl Emit for Primitive {
    fn emit(&self) -> String {
        self.as_str().to_string()
    }
}

impl Emit for Type {
    fn emit(&self) -> String {
        match self {
            Type::Primitive { name } => name.emit(),
            Type::Named { name, .. } => name.clone(),
            Type::List { value_type } => format!("list<{}>", value_type.emit()),
            Type::Set { value_type } => format!("set<{}>", value_type.emit()),
            Type::Map {
                key_type,
                value_type,
            } => format!("map<{}, {}>", key_type.emit(), value_type.emit()),
        }
    }
}

impl Emit for ConstantValue {
    fn emit(&self) -> String {
        match self {
            ConstantValue::Bool(b) => b.to_string(),
            ConstantValue::Int(i) => i.to_string(),
            ConstantValue::Float(f) => format_float(*f),
            ConstantValue::Text(text) => text.clone(),
            ConstantValue::List(items) => {
                let items: Vec<String> = items.iter().map(Emit::emit).collect();
                format!("[{}]", items.join(", "))
            }
            ConstantValue::Map { entries } => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|e| format!("{}: {}", e.key.emit(), e.value.emit()))
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
        }
    }
}

/// Integral floats keep a trailing `.0` so they still read as doubles.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

// =============================================================================
// Writer
// =============================================================================

/// Rendering switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterOptions {
    /// Drop every comment block from the output.
    pub no_comments: bool,
}

/// Renders one [`File`] at a time as Thrift source.
#[derive(Debug, Default)]
pub struct ThriftWriter {
    options: WriterOptions,
    out: String,
    depth: usize,
    include_stems: BTreeSet<String>,
}

/// Render every file of `schema`, keyed by file path.
pub fn generate(
    schema: &IdlSchema,
    options: WriterOptions,
) -> Result<BTreeMap<String, Vec<u8>>, EmitError> {
    let mut writer = ThriftWriter::new(options);
    schema
        .files()
        .iter()
        .map(|file| {
            let text = writer.write_file(file)?;
            debug!(file = %file.path, bytes = text.len(), "rendered thrift file");
            Ok((file.path.clone(), text.into_bytes()))
        })
        .collect()
}

impl ThriftWriter {
    /// A writer with the given switches.
    pub fn new(options: WriterOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Render `file`: namespaces, includes, then constants, typedefs, enums,
    /// messages and services, each group followed by a blank line.
    pub fn write_file(&mut self, file: &File) -> Result<String, EmitError> {
        self.out.clear();
        self.depth = 0;
        self.include_stems = file
            .imports
            .iter()
            .map(|imp| path_stem(&imp.path).to_string())
            .collect();

        self.write_namespaces(&file.namespaces)?;
        self.write_imports(&file.imports);
        self.write_definitions(&file.definitions)?;
        Ok(std::mem::take(&mut self.out))
    }

    fn write_namespaces(&mut self, namespaces: &[Namespace]) -> Result<(), EmitError> {
        if namespaces.is_empty() {
            return Ok(());
        }
        for ns in namespaces {
            self.write_comments(&ns.comments);
            let annos = self.annotations(&ns.annotations, &ns.name)?;
            self.line(&format!("namespace {} {}{annos}", ns.scope, ns.name));
        }
        self.line("");
        Ok(())
    }

    fn write_imports(&mut self, imports: &[Import]) {
        if imports.is_empty() {
            return;
        }
        for imp in imports {
            self.write_comments(&imp.comments);
            self.line(&format!("include {}", imp.value));
        }
        self.line("");
    }

    fn write_definitions(&mut self, defs: &Definitions) -> Result<(), EmitError> {
        self.write_group(&defs.constants, Self::write_constant)?;
        self.write_group(&defs.typedefs, Self::write_typedef)?;
        self.write_group(&defs.enums, Self::write_enum)?;
        self.write_group(&defs.messages, Self::write_message)?;
        self.write_group(&defs.services, Self::write_service)
    }

    fn write_group<T>(
        &mut self,
        items: &[T],
        mut write: impl FnMut(&mut Self, &T) -> Result<(), EmitError>,
    ) -> Result<(), EmitError> {
        if items.is_empty() {
            return Ok(());
        }
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.line("");
            }
            write(self, item)?;
        }
        self.line("");
        Ok(())
    }

    fn write_constant(&mut self, constant: &Constant) -> Result<(), EmitError> {
        self.write_comments(&constant.comments);
        self.line(&format!(
            "const {} {} = {}",
            constant.const_type.emit(),
            constant.name,
            constant.value.emit()
        ));
        Ok(())
    }

    fn write_typedef(&mut self, typedef: &Typedef) -> Result<(), EmitError> {
        self.write_comments(&typedef.comments);
        let annos = self.annotations(&typedef.annotations, &typedef.alias)?;
        self.line(&format!(
            "typedef {} {}{annos}",
            typedef.target.emit(),
            typedef.alias
        ));
        Ok(())
    }

    fn write_enum(&mut self, e: &Enum) -> Result<(), EmitError> {
        self.write_comments(&e.comments);
        let annos = self.annotations(&e.annotations, &e.name)?;
        self.line(&format!("enum {}{annos} {{", e.name));
        self.depth += 1;
        for (i, member) in e.values.iter().enumerate() {
            self.write_enum_member(member, i + 1 < e.values.len())?;
        }
        self.depth -= 1;
        self.line("}");
        Ok(())
    }

    fn write_enum_member(&mut self, member: &EnumMember, comma: bool) -> Result<(), EmitError> {
        self.write_comments(&member.comments);
        let annos = self.annotations(&member.annotations, &member.name)?;
        let sep = if comma { "," } else { "" };
        self.line(&format!("{} = {}{annos}{sep}", member.name, member.value));
        Ok(())
    }

    fn write_message(&mut self, message: &Message) -> Result<(), EmitError> {
        self.write_comments(&message.comments);
        let annos = self.annotations(&message.annotations, &message.name)?;
        self.line(&format!(
            "{} {}{annos} {{",
            message.kind.keyword(),
            message.name
        ));
        self.depth += 1;
        for field in &message.fields {
            self.write_comments(&field.comments);
            let text = self.field(field, true)?;
            self.line(&format!("{text},"));
        }
        self.depth -= 1;
        self.line("}");
        Ok(())
    }

    fn write_service(&mut self, service: &Service) -> Result<(), EmitError> {
        self.write_comments(&service.comments);
        let mut header = format!("service {}", service.name);
        if let Some(parent) = &service.extends {
            header.push_str(" extends ");
            header.push_str(parent);
        }
        header.push_str(&self.annotations(&service.annotations, &service.name)?);
        header.push_str(" {");
        self.line(&header);

        self.depth += 1;
        let count = service.functions.len();
        for (i, function) in service.functions.iter().enumerate() {
            self.write_comments(&function.comments);
            let mut text = self.function(function)?;
            let last = i + 1 == count;
            if !last {
                text.push(',');
            }
            self.line(&text);
            if !last {
                self.line("");
            }
        }
        self.depth -= 1;
        self.line("}");
        Ok(())
    }

    fn function(&self, function: &Function) -> Result<String, EmitError> {
        let params = self.field_list(&function.parameters)?;
        let mut text = format!(
            "{}{} {}({params})",
            if function.oneway { "oneway " } else { "" },
            function.return_type.emit(),
            function.name
        );
        if !function.throws.is_empty() {
            text.push_str(&format!(" throws ({})", self.field_list(&function.throws)?));
        }
        text.push_str(&self.annotations(&function.annotations, &function.name)?);
        Ok(text)
    }

    fn field_list(&self, fields: &[Field]) -> Result<String, EmitError> {
        let parts = fields
            .iter()
            .map(|f| self.field(f, false))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(", "))
    }

    /// `N: [required|optional] type name [= default] [(annotations)]`.
    ///
    /// Parameter lists omit requiredness, and a parameter named like an
    /// included file gets a trailing `_` so it does not shadow the include.
    fn field(&self, field: &Field, in_message: bool) -> Result<String, EmitError> {
        let mut parts = vec![format!("{}:", field.id)];
        if in_message && let Some(keyword) = field.requiredness.keyword() {
            parts.push(keyword.to_string());
        }
        parts.push(field.field_type.emit());
        if !in_message && self.include_stems.contains(&field.name) {
            parts.push(format!("{}_", field.name));
        } else {
            parts.push(field.name.clone());
        }
        if let Some(default) = &field.default {
            parts.push("=".to_string());
            parts.push(default.emit());
        }
        let annos = self.annotations(&field.annotations, &field.name)?;
        Ok(format!("{}{annos}", parts.join(" ")))
    }

    /// ` (a = "x", b = "y")`, or nothing when the list is empty.
    fn annotations(&self, annotations: &[Annotation], owner: &str) -> Result<String, EmitError> {
        if annotations.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(annotations.len());
        for anno in annotations {
            match &anno.value {
                None => parts.push(anno.name.clone()),
                Some(value) => {
                    value
                        .string_value()
                        .map_err(|source| EmitError::MalformedAnnotation {
                            annotation: anno.name.clone(),
                            owner: owner.to_string(),
                            source,
                        })?;
                    parts.push(format!("{} = {}", anno.name, value.emit()));
                }
            }
        }
        Ok(format!(" ({})", parts.join(", ")))
    }

    fn write_comments(&mut self, comments: &[Comment]) {
        if self.options.no_comments {
            return;
        }
        for comment in comments {
            for line in comment.text.trim_end_matches(['\r', '\n']).split('\n') {
                self.line(line);
            }
        }
    }

    fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }
}
