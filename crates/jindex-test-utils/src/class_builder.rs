use std::collections::HashMap;

const MAJOR_JAVA_17: u16 = 61;

const ACC_PUBLIC: u16 = 0x0001;
const ACC_SUPER: u16 = 0x0020;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum PoolKey {
    Utf8,
    Class,
    String,
    NameAndType(u16),
}

#[derive(Default)]
struct PoolBuilder {
    bytes: Vec<u8>,
    next: u16,
    dedup: HashMap<(PoolKey, String), u16>,
}

impl PoolBuilder {
    fn new() -> Self {
        Self {
            next: 1,
            ..Self::default()
        }
    }

    fn push(&mut self, entry: &[u8], slots: u16) -> u16 {
        let idx = self.next;
        self.bytes.extend_from_slice(entry);
        self.next += slots;
        idx
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(idx) = self.dedup.get(&(PoolKey::Utf8, value.to_string())) {
            return *idx;
        }
        let encoded = encode_modified_utf8(value);
        let mut entry = vec![1];
        entry.extend_from_slice(&(encoded.len() as u16).to_be_bytes());
        entry.extend_from_slice(&encoded);
        let idx = self.push(&entry, 1);
        self.dedup.insert((PoolKey::Utf8, value.to_string()), idx);
        idx
    }

    fn indirect(&mut self, key: PoolKey, tag: u8, value: &str) -> u16 {
        if let Some(idx) = self.dedup.get(&(key, value.to_string())) {
            return *idx;
        }
        let name = self.utf8(value);
        let mut entry = vec![tag];
        entry.extend_from_slice(&name.to_be_bytes());
        let idx = self.push(&entry, 1);
        self.dedup.insert((key, value.to_string()), idx);
        idx
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_idx = self.utf8(name);
        let key = (PoolKey::NameAndType(name_idx), descriptor.to_string());
        if let Some(idx) = self.dedup.get(&key) {
            return *idx;
        }
        let desc_idx = self.utf8(descriptor);
        let mut entry = vec![12];
        entry.extend_from_slice(&name_idx.to_be_bytes());
        entry.extend_from_slice(&desc_idx.to_be_bytes());
        let idx = self.push(&entry, 1);
        self.dedup.insert(key, idx);
        idx
    }
}

fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// An annotation element value.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementSpec {
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    Enum {
        type_descriptor: String,
        const_name: String,
    },
    Class(String),
    Annotation(AnnotationSpec),
    Array(Vec<ElementSpec>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSpec {
    pub type_descriptor: String,
    pub elements: Vec<(String, ElementSpec)>,
}

impl AnnotationSpec {
    /// An annotation with no element/value pairs.
    pub fn marker(type_descriptor: &str) -> Self {
        Self {
            type_descriptor: type_descriptor.to_string(),
            elements: Vec::new(),
        }
    }

    pub fn with(mut self, name: &str, value: ElementSpec) -> Self {
        self.elements.push((name.to_string(), value));
        self
    }
}

/// A type annotation with a raw, already-encoded `target_info`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotationSpec {
    pub target_type: u8,
    pub target_info: Vec<u8>,
    pub type_path: Vec<(u8, u8)>,
    pub annotation: AnnotationSpec,
}

impl TypeAnnotationSpec {
    pub fn new(target_type: u8, target_info: &[u8], annotation: AnnotationSpec) -> Self {
        Self {
            target_type,
            target_info: target_info.to_vec(),
            type_path: Vec::new(),
            annotation,
        }
    }

    pub fn with_path(mut self, kind: u8, type_argument_index: u8) -> Self {
        self.type_path.push((kind, type_argument_index));
        self
    }
}

/// A `ConstantValue` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantSpec {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSpec {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub constant: Option<ConstantSpec>,
    pub annotations: Vec<AnnotationSpec>,
    pub type_annotations: Vec<TypeAnnotationSpec>,
    pub deprecated: bool,
}

impl FieldSpec {
    pub fn new(access_flags: u16, name: &str, descriptor: &str) -> Self {
        Self {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodeSpec {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    /// `(start_pc, length, name, signature, index)` entries.
    pub local_variable_types: Vec<(u16, u16, String, String, u16)>,
    /// Raw `StackMapTable` body (frames must not reference the constant pool).
    pub stack_map_table: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodSpec {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
    /// `MethodParameters` entries: optional name plus access flags.
    pub parameters: Vec<(Option<String>, u16)>,
    /// Emitted as `RuntimeVisibleParameterAnnotations`.
    pub parameter_annotations: Vec<Vec<AnnotationSpec>>,
    pub annotations: Vec<AnnotationSpec>,
    pub type_annotations: Vec<TypeAnnotationSpec>,
    pub default_value: Option<ElementSpec>,
    pub code: Option<CodeSpec>,
    pub deprecated: bool,
}

impl MethodSpec {
    pub fn new(access_flags: u16, name: &str, descriptor: &str) -> Self {
        Self {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            ..Self::default()
        }
    }
}

/// Builds a class file byte by byte.
///
/// Constant-pool entries are allocated as the builder is used, so the
/// low-level helpers ([`utf8`](Self::utf8), [`integer`](Self::integer), ...)
/// return indices that stay valid in the final output.
pub struct ClassFileBuilder {
    pool: PoolBuilder,
    major_version: u16,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    attributes: Vec<Vec<u8>>,
    inner_classes: Vec<[u16; 4]>,
}

impl ClassFileBuilder {
    /// A public class `name` extending `java/lang/Object`.
    pub fn new(name: &str) -> Self {
        let mut pool = PoolBuilder::new();
        let this_class = pool.indirect(PoolKey::Class, 7, name);
        let super_class = pool.indirect(PoolKey::Class, 7, "java/lang/Object");
        Self {
            pool,
            major_version: MAJOR_JAVA_17,
            access_flags: ACC_PUBLIC | ACC_SUPER,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            inner_classes: Vec::new(),
        }
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        self.pool.utf8(value)
    }

    pub fn class_ref(&mut self, name: &str) -> u16 {
        self.pool.indirect(PoolKey::Class, 7, name)
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        let mut entry = vec![3];
        entry.extend_from_slice(&value.to_be_bytes());
        self.pool.push(&entry, 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut entry = vec![5];
        entry.extend_from_slice(&value.to_be_bytes());
        self.pool.push(&entry, 2)
    }

    pub fn float(&mut self, value: f32) -> u16 {
        let mut entry = vec![4];
        entry.extend_from_slice(&value.to_bits().to_be_bytes());
        self.pool.push(&entry, 1)
    }

    pub fn double(&mut self, value: f64) -> u16 {
        let mut entry = vec![6];
        entry.extend_from_slice(&value.to_bits().to_be_bytes());
        self.pool.push(&entry, 2)
    }

    pub fn string(&mut self, value: &str) -> u16 {
        self.pool.indirect(PoolKey::String, 8, value)
    }

    pub fn access_flags(mut self, flags: u16) -> Self {
        self.access_flags = flags;
        self
    }

    pub fn major_version(mut self, version: u16) -> Self {
        self.major_version = version;
        self
    }

    pub fn superclass(mut self, name: Option<&str>) -> Self {
        self.super_class = match name {
            Some(name) => self.class_ref(name),
            None => 0,
        };
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        let idx = self.class_ref(name);
        self.interfaces.push(idx);
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        let attr = self.signature_attribute(signature);
        self.attributes.push(attr);
        self
    }

    pub fn source_file(mut self, name: &str) -> Self {
        let idx = self.utf8(name);
        let attr = self.attribute("SourceFile", &idx.to_be_bytes());
        self.attributes.push(attr);
        self
    }

    pub fn deprecated(mut self) -> Self {
        let attr = self.attribute("Deprecated", &[]);
        self.attributes.push(attr);
        self
    }

    pub fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        let attr = self.annotations_attribute("RuntimeVisibleAnnotations", &[annotation]);
        self.attributes.push(attr);
        self
    }

    pub fn invisible_annotation(mut self, annotation: AnnotationSpec) -> Self {
        let attr = self.annotations_attribute("RuntimeInvisibleAnnotations", &[annotation]);
        self.attributes.push(attr);
        self
    }

    pub fn type_annotation(mut self, annotation: TypeAnnotationSpec) -> Self {
        let attr = self.type_annotations_attribute(&[annotation]);
        self.attributes.push(attr);
        self
    }

    /// Adds an `InnerClasses` entry; all entries are emitted as one attribute.
    pub fn inner_class(
        mut self,
        inner: &str,
        outer: Option<&str>,
        inner_name: Option<&str>,
        access_flags: u16,
    ) -> Self {
        let inner = self.class_ref(inner);
        let outer = outer.map_or(0, |name| self.class_ref(name));
        let name = inner_name.map_or(0, |name| self.utf8(name));
        self.inner_classes.push([inner, outer, name, access_flags]);
        self
    }

    pub fn enclosing_method(mut self, class: &str, method: Option<(&str, &str)>) -> Self {
        let class = self.class_ref(class);
        let method = method.map_or(0, |(name, desc)| self.pool.name_and_type(name, desc));
        let mut body = Vec::new();
        push_u16(&mut body, class);
        push_u16(&mut body, method);
        let attr = self.attribute("EnclosingMethod", &body);
        self.attributes.push(attr);
        self
    }

    pub fn missing_types(mut self, names: &[&str]) -> Self {
        let body = self.class_list(names);
        let attr = self.attribute("MissingTypes", &body);
        self.attributes.push(attr);
        self
    }

    pub fn permitted_subclasses(mut self, names: &[&str]) -> Self {
        let body = self.class_list(names);
        let attr = self.attribute("PermittedSubclasses", &body);
        self.attributes.push(attr);
        self
    }

    /// Appends an attribute with an arbitrary name and body.
    pub fn raw_attribute(mut self, name: &str, body: &[u8]) -> Self {
        let attr = self.attribute(name, body);
        self.attributes.push(attr);
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        let mut out = Vec::new();
        push_u16(&mut out, field.access_flags);
        let name = self.utf8(&field.name);
        push_u16(&mut out, name);
        let desc = self.utf8(&field.descriptor);
        push_u16(&mut out, desc);

        let mut attrs = Vec::new();
        if let Some(sig) = &field.signature {
            attrs.push(self.signature_attribute(sig));
        }
        if let Some(constant) = &field.constant {
            let idx = match constant {
                ConstantSpec::Int(v) => self.integer(*v),
                ConstantSpec::Long(v) => self.long(*v),
                ConstantSpec::Float(v) => self.float(*v),
                ConstantSpec::Double(v) => self.double(*v),
                ConstantSpec::String(v) => self.string(v),
            };
            attrs.push(self.attribute("ConstantValue", &idx.to_be_bytes()));
        }
        if !field.annotations.is_empty() {
            attrs.push(self.annotations_attribute("RuntimeVisibleAnnotations", &field.annotations));
        }
        if !field.type_annotations.is_empty() {
            attrs.push(self.type_annotations_attribute(&field.type_annotations));
        }
        if field.deprecated {
            attrs.push(self.attribute("Deprecated", &[]));
        }
        push_attributes(&mut out, &attrs);
        self.fields.push(out);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        let mut out = Vec::new();
        push_u16(&mut out, method.access_flags);
        let name = self.utf8(&method.name);
        push_u16(&mut out, name);
        let desc = self.utf8(&method.descriptor);
        push_u16(&mut out, desc);

        let mut attrs = Vec::new();
        if let Some(sig) = &method.signature {
            attrs.push(self.signature_attribute(sig));
        }
        if !method.exceptions.is_empty() {
            let names: Vec<&str> = method.exceptions.iter().map(String::as_str).collect();
            let body = self.class_list(&names);
            attrs.push(self.attribute("Exceptions", &body));
        }
        if !method.parameters.is_empty() {
            let mut body = vec![method.parameters.len() as u8];
            for (name, flags) in &method.parameters {
                let idx = name.as_deref().map_or(0, |name| self.utf8(name));
                push_u16(&mut body, idx);
                push_u16(&mut body, *flags);
            }
            attrs.push(self.attribute("MethodParameters", &body));
        }
        if !method.parameter_annotations.is_empty() {
            let mut body = vec![method.parameter_annotations.len() as u8];
            for anns in &method.parameter_annotations {
                push_u16(&mut body, anns.len() as u16);
                for ann in anns {
                    self.encode_annotation(&mut body, ann);
                }
            }
            attrs.push(self.attribute("RuntimeVisibleParameterAnnotations", &body));
        }
        if !method.annotations.is_empty() {
            attrs.push(
                self.annotations_attribute("RuntimeVisibleAnnotations", &method.annotations),
            );
        }
        if !method.type_annotations.is_empty() {
            attrs.push(self.type_annotations_attribute(&method.type_annotations));
        }
        if let Some(value) = &method.default_value {
            let mut body = Vec::new();
            self.encode_element(&mut body, value);
            attrs.push(self.attribute("AnnotationDefault", &body));
        }
        if let Some(code) = &method.code {
            attrs.push(self.code_attribute(code));
        }
        if method.deprecated {
            attrs.push(self.attribute("Deprecated", &[]));
        }
        push_attributes(&mut out, &attrs);
        self.methods.push(out);
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        if !self.inner_classes.is_empty() {
            let mut body = Vec::new();
            push_u16(&mut body, self.inner_classes.len() as u16);
            for entry in &self.inner_classes {
                for value in entry {
                    push_u16(&mut body, *value);
                }
            }
            let attr = self.attribute("InnerClasses", &body);
            self.attributes.push(attr);
        }

        let mut out = Vec::new();
        push_u32(&mut out, 0xCAFEBABE);
        push_u16(&mut out, 0);
        push_u16(&mut out, self.major_version);
        push_u16(&mut out, self.pool.next);
        out.extend_from_slice(&self.pool.bytes);
        push_u16(&mut out, self.access_flags);
        push_u16(&mut out, self.this_class);
        push_u16(&mut out, self.super_class);
        push_u16(&mut out, self.interfaces.len() as u16);
        for idx in &self.interfaces {
            push_u16(&mut out, *idx);
        }
        push_u16(&mut out, self.fields.len() as u16);
        for field in &self.fields {
            out.extend_from_slice(field);
        }
        push_u16(&mut out, self.methods.len() as u16);
        for method in &self.methods {
            out.extend_from_slice(method);
        }
        push_attributes(&mut out, &self.attributes);
        out
    }

    fn attribute(&mut self, name: &str, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(6 + body.len());
        let name = self.utf8(name);
        push_u16(&mut out, name);
        push_u32(&mut out, body.len() as u32);
        out.extend_from_slice(body);
        out
    }

    fn signature_attribute(&mut self, signature: &str) -> Vec<u8> {
        let idx = self.utf8(signature);
        self.attribute("Signature", &idx.to_be_bytes())
    }

    fn class_list(&mut self, names: &[&str]) -> Vec<u8> {
        let mut body = Vec::new();
        push_u16(&mut body, names.len() as u16);
        for name in names {
            let idx = self.class_ref(name);
            push_u16(&mut body, idx);
        }
        body
    }

    fn annotations_attribute(&mut self, name: &str, annotations: &[AnnotationSpec]) -> Vec<u8> {
        let mut body = Vec::new();
        push_u16(&mut body, annotations.len() as u16);
        for ann in annotations {
            self.encode_annotation(&mut body, ann);
        }
        self.attribute(name, &body)
    }

    fn type_annotations_attribute(&mut self, annotations: &[TypeAnnotationSpec]) -> Vec<u8> {
        let mut body = Vec::new();
        push_u16(&mut body, annotations.len() as u16);
        for ann in annotations {
            body.push(ann.target_type);
            body.extend_from_slice(&ann.target_info);
            body.push(ann.type_path.len() as u8);
            for (kind, index) in &ann.type_path {
                body.push(*kind);
                body.push(*index);
            }
            self.encode_annotation(&mut body, &ann.annotation);
        }
        self.attribute("RuntimeVisibleTypeAnnotations", &body)
    }

    fn code_attribute(&mut self, code: &CodeSpec) -> Vec<u8> {
        let mut body = Vec::new();
        push_u16(&mut body, code.max_stack);
        push_u16(&mut body, code.max_locals);
        push_u32(&mut body, code.code.len() as u32);
        body.extend_from_slice(&code.code);
        push_u16(&mut body, 0);

        let mut nested = Vec::new();
        if !code.local_variable_types.is_empty() {
            let mut table = Vec::new();
            push_u16(&mut table, code.local_variable_types.len() as u16);
            for (start, len, name, sig, index) in &code.local_variable_types {
                push_u16(&mut table, *start);
                push_u16(&mut table, *len);
                let name = self.utf8(name);
                push_u16(&mut table, name);
                let sig = self.utf8(sig);
                push_u16(&mut table, sig);
                push_u16(&mut table, *index);
            }
            nested.push(self.attribute("LocalVariableTypeTable", &table));
        }
        if let Some(frames) = &code.stack_map_table {
            nested.push(self.attribute("StackMapTable", frames));
        }
        push_attributes(&mut body, &nested);
        self.attribute("Code", &body)
    }

    fn encode_annotation(&mut self, out: &mut Vec<u8>, annotation: &AnnotationSpec) {
        let ty = self.utf8(&annotation.type_descriptor);
        push_u16(out, ty);
        push_u16(out, annotation.elements.len() as u16);
        for (name, value) in &annotation.elements {
            let name = self.utf8(name);
            push_u16(out, name);
            self.encode_element(out, value);
        }
    }

    fn encode_element(&mut self, out: &mut Vec<u8>, value: &ElementSpec) {
        let (tag, idx) = match value {
            ElementSpec::Byte(v) => (b'B', self.integer(*v as i32)),
            ElementSpec::Char(v) => (b'C', self.integer(*v as i32)),
            ElementSpec::Short(v) => (b'S', self.integer(*v as i32)),
            ElementSpec::Int(v) => (b'I', self.integer(*v)),
            ElementSpec::Boolean(v) => (b'Z', self.integer(*v as i32)),
            ElementSpec::Long(v) => (b'J', self.long(*v)),
            ElementSpec::Float(v) => (b'F', self.float(*v)),
            ElementSpec::Double(v) => (b'D', self.double(*v)),
            ElementSpec::String(v) => (b's', self.utf8(v)),
            ElementSpec::Class(v) => (b'c', self.utf8(v)),
            ElementSpec::Enum {
                type_descriptor,
                const_name,
            } => {
                out.push(b'e');
                let ty = self.utf8(type_descriptor);
                push_u16(out, ty);
                let name = self.utf8(const_name);
                push_u16(out, name);
                return;
            }
            ElementSpec::Annotation(ann) => {
                out.push(b'@');
                self.encode_annotation(out, ann);
                return;
            }
            ElementSpec::Array(values) => {
                out.push(b'[');
                push_u16(out, values.len() as u16);
                for value in values {
                    self.encode_element(out, value);
                }
                return;
            }
        };
        out.push(tag);
        push_u16(out, idx);
    }
}

fn push_attributes(out: &mut Vec<u8>, attributes: &[Vec<u8>]) {
    push_u16(out, attributes.len() as u16);
    for attr in attributes {
        out.extend_from_slice(attr);
    }
}
