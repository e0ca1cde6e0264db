//! Field-by-field comparison of two [`BinaryType`] views.
//!
//! Used to check that a type rehydrated from the index matches the class file
//! it was built from. Not part of the indexing path.

use std::fmt;

use jindex_classfile::{
    Annotation, BinaryField, BinaryMethod, BinaryType, ConstValue, ElementValue, TypeAnnotation,
};
use jindex_signature::{
    count_method_parameters, parse_class_signature, parse_field_signature, parse_method_signature,
    split_method_descriptor, TypeInterner,
};

/// The first difference found, with a dotted path to the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mismatch at `{}`: expected {}, found {}",
            self.path, self.expected, self.actual
        )
    }
}

impl std::error::Error for Mismatch {}

type Check = Result<(), Mismatch>;

fn mismatch(path: &str, expected: impl fmt::Debug, actual: impl fmt::Debug) -> Mismatch {
    Mismatch {
        path: path.to_string(),
        expected: format!("{expected:?}"),
        actual: format!("{actual:?}"),
    }
}

fn same<T: PartialEq + fmt::Debug + ?Sized>(path: &str, expected: &T, actual: &T) -> Check {
    if expected == actual {
        Ok(())
    } else {
        Err(mismatch(path, expected, actual))
    }
}

fn same_len<T: fmt::Debug>(path: &str, expected: &[T], actual: &[T]) -> Check {
    if expected.len() == actual.len() {
        Ok(())
    } else {
        Err(mismatch(path, expected, actual))
    }
}

/// Panics with the [`Mismatch`] description when the two views differ.
#[track_caller]
pub fn assert_type_consistent<E: BinaryType, A: BinaryType>(expected: &E, actual: &A) {
    if let Err(mismatch) = check_type(expected, actual) {
        panic!("{mismatch}");
    }
}

pub fn check_type<E: BinaryType, A: BinaryType>(expected: &E, actual: &A) -> Check {
    let path = format!("type({})", expected.name());
    let at = |field: &str| format!("{path}.{field}");

    same(&at("name"), expected.name(), actual.name())?;
    same(&at("modifiers"), &expected.modifiers(), &actual.modifiers())?;
    same(
        &at("superclass_name"),
        &expected.superclass_name(),
        &actual.superclass_name(),
    )?;
    same(
        &at("interface_names"),
        expected.interface_names(),
        actual.interface_names(),
    )?;
    check_signature(
        &at("generic_signature"),
        expected.generic_signature(),
        actual.generic_signature(),
        SignatureKind::Class,
    )?;
    same(
        &at("enclosing_type_name"),
        &expected.enclosing_type_name(),
        &actual.enclosing_type_name(),
    )?;
    same(
        &at("enclosing_method"),
        &expected.enclosing_method(),
        &actual.enclosing_method(),
    )?;
    same(
        &at("source_file_name"),
        &expected.source_file_name(),
        &actual.source_file_name(),
    )?;
    same(&at("source_name"), expected.source_name(), actual.source_name())?;
    same(&at("is_member"), &expected.is_member(), &actual.is_member())?;
    same(&at("is_local"), &expected.is_local(), &actual.is_local())?;
    same(&at("is_anonymous"), &expected.is_anonymous(), &actual.is_anonymous())?;
    same(&at("tag_bits"), &expected.tag_bits(), &actual.tag_bits())?;
    same(
        &at("missing_type_names"),
        expected.missing_type_names(),
        actual.missing_type_names(),
    )?;
    check_annotations(&at("annotations"), expected.annotations(), actual.annotations())?;
    check_type_annotations(
        &at("type_annotations"),
        expected.type_annotations(),
        actual.type_annotations(),
    )?;

    let (expected_fields, actual_fields) = (expected.fields(), actual.fields());
    if expected_fields.len() != actual_fields.len() {
        let expected_names: Vec<_> = expected_fields.iter().map(|field| field.name()).collect();
        let actual_names: Vec<_> = actual_fields.iter().map(|field| field.name()).collect();
        return Err(mismatch(&at("fields"), expected_names, actual_names));
    }
    for (expected_field, actual_field) in expected_fields.iter().zip(actual_fields) {
        check_field(
            &at(&format!("fields[{}]", expected_field.name())),
            expected_field,
            actual_field,
        )?;
    }

    let mut expected_methods: Vec<_> = expected.methods().iter().collect();
    let mut actual_methods: Vec<_> = actual.methods().iter().collect();
    expected_methods.sort_by(|a, b| method_key(*a).cmp(&method_key(*b)));
    actual_methods.sort_by(|a, b| method_key(*a).cmp(&method_key(*b)));
    let expected_keys: Vec<_> = expected_methods.iter().map(|m| method_key(*m)).collect();
    let actual_keys: Vec<_> = actual_methods.iter().map(|m| method_key(*m)).collect();
    same(&at("methods"), &expected_keys, &actual_keys)?;
    for ((expected_method, actual_method), key) in
        expected_methods.into_iter().zip(actual_methods).zip(&expected_keys)
    {
        check_method(&at(&format!("methods[{key}]")), expected_method, actual_method)?;
    }
    Ok(())
}

fn method_key<M: BinaryMethod>(method: &M) -> String {
    format!("{}{}", method.selector(), method.descriptor())
}

fn check_field<E: BinaryField, A: BinaryField>(path: &str, expected: &E, actual: &A) -> Check {
    let at = |field: &str| format!("{path}.{field}");
    same(&at("name"), expected.name(), actual.name())?;
    same(&at("descriptor"), expected.descriptor(), actual.descriptor())?;
    same(&at("modifiers"), &expected.modifiers(), &actual.modifiers())?;
    check_signature(
        &at("generic_signature"),
        expected.generic_signature(),
        actual.generic_signature(),
        SignatureKind::Field {
            descriptor: expected.descriptor(),
        },
    )?;
    match (expected.constant(), actual.constant()) {
        (None, None) => {}
        (Some(e), Some(a)) => check_const(&at("constant"), e, a)?,
        (e, a) => return Err(mismatch(&at("constant"), e, a)),
    }
    check_annotations(&at("annotations"), expected.annotations(), actual.annotations())?;
    check_type_annotations(
        &at("type_annotations"),
        expected.type_annotations(),
        actual.type_annotations(),
    )?;
    same(&at("tag_bits"), &expected.tag_bits(), &actual.tag_bits())
}

fn check_method<E: BinaryMethod, A: BinaryMethod>(path: &str, expected: &E, actual: &A) -> Check {
    let at = |field: &str| format!("{path}.{field}");
    same(&at("modifiers"), &expected.modifiers(), &actual.modifiers())?;
    check_signature(
        &at("generic_signature"),
        expected.generic_signature(),
        actual.generic_signature(),
        SignatureKind::Method {
            descriptor: expected.descriptor(),
            exception_names: expected.exception_names(),
        },
    )?;
    same(
        &at("argument_names"),
        &expected.argument_names(),
        &actual.argument_names(),
    )?;
    check_annotations(&at("annotations"), expected.annotations(), actual.annotations())?;

    let (expected_params, actual_params) =
        (expected.parameter_annotations(), actual.parameter_annotations());
    same_len(&at("parameter_annotations"), expected_params, actual_params)?;
    for (idx, (e, a)) in expected_params.iter().zip(actual_params).enumerate() {
        check_annotations(&at(&format!("parameter_annotations[{idx}]")), e, a)?;
    }

    check_type_annotations(
        &at("type_annotations"),
        expected.type_annotations(),
        actual.type_annotations(),
    )?;
    match (expected.default_value(), actual.default_value()) {
        (None, None) => {}
        (Some(e), Some(a)) => check_element_value(&at("default_value"), e, a)?,
        (e, a) => return Err(mismatch(&at("default_value"), e, a)),
    }
    same(
        &at("exception_names"),
        expected.exception_names(),
        actual.exception_names(),
    )?;
    same(&at("tag_bits"), &expected.tag_bits(), &actual.tag_bits())
}

enum SignatureKind<'a> {
    Class,
    Field {
        descriptor: &'a str,
    },
    Method {
        descriptor: &'a str,
        exception_names: &'a [String],
    },
}

/// Compares signatures textually first, then by their normalized write-back,
/// which tolerates spellings the grammar considers equivalent.
fn check_signature(path: &str, expected: Option<&str>, actual: Option<&str>, kind: SignatureKind<'_>) -> Check {
    match (expected, actual) {
        (None, None) => Ok(()),
        (Some(e), Some(a)) if e == a => Ok(()),
        (Some(e), Some(a)) => {
            let normalized = normalize_signature(e, &kind).zip(normalize_signature(a, &kind));
            match normalized {
                Some((e_norm, a_norm)) if e_norm == a_norm => Ok(()),
                _ => Err(mismatch(path, e, a)),
            }
        }
        (e, a) => Err(mismatch(path, e, a)),
    }
}

fn normalize_signature(signature: &str, kind: &SignatureKind<'_>) -> Option<String> {
    let mut interner = TypeInterner::new();
    match kind {
        SignatureKind::Class => parse_class_signature(signature, &mut interner)
            .ok()
            .map(|parsed| parsed.to_signature_string(&interner)),
        SignatureKind::Field { descriptor } => {
            parse_field_signature(signature, descriptor, &mut interner)
                .ok()
                .map(|parsed| parsed.to_signature_string(&interner))
        }
        SignatureKind::Method {
            descriptor,
            exception_names,
        } => {
            let (params, _) = split_method_descriptor(descriptor).ok()?;
            let declared = count_method_parameters(signature).ok()?;
            let exceptions: Vec<String> = exception_names
                .iter()
                .map(|name| format!("L{name};"))
                .collect();
            parse_method_signature(
                signature,
                descriptor,
                params.len().saturating_sub(declared),
                &exceptions,
                &mut interner,
            )
            .ok()
            .map(|parsed| parsed.to_signature_string(&interner))
        }
    }
}

fn check_annotations(path: &str, expected: &[Annotation], actual: &[Annotation]) -> Check {
    same_len(path, expected, actual)?;
    for (idx, (e, a)) in expected.iter().zip(actual).enumerate() {
        check_annotation(&format!("{path}[{idx}]"), e, a)?;
    }
    Ok(())
}

fn check_annotation(path: &str, expected: &Annotation, actual: &Annotation) -> Check {
    same(
        &format!("{path}.type"),
        &expected.type_descriptor,
        &actual.type_descriptor,
    )?;
    same_len(&format!("{path}.elements"), &expected.elements, &actual.elements)?;
    for ((e_name, e_value), (a_name, a_value)) in expected.elements.iter().zip(&actual.elements) {
        same(&format!("{path}.elements.name"), e_name, a_name)?;
        check_element_value(&format!("{path}.elements[{e_name}]"), e_value, a_value)?;
    }
    Ok(())
}

fn check_type_annotations(path: &str, expected: &[TypeAnnotation], actual: &[TypeAnnotation]) -> Check {
    same_len(path, expected, actual)?;
    for (idx, (e, a)) in expected.iter().zip(actual).enumerate() {
        let at = |field: &str| format!("{path}[{idx}].{field}");
        same(&at("target_type"), &e.target_type, &a.target_type)?;
        same(&at("target_info"), &e.target_info, &a.target_info)?;
        same(&at("type_path"), &e.type_path, &a.type_path)?;
        check_annotation(&at("annotation"), &e.annotation, &a.annotation)?;
    }
    Ok(())
}

fn check_element_value(path: &str, expected: &ElementValue, actual: &ElementValue) -> Check {
    match (expected, actual) {
        (ElementValue::Const(e), ElementValue::Const(a)) => check_const(path, e, a),
        (ElementValue::Annotation(e), ElementValue::Annotation(a)) => check_annotation(path, e, a),
        (ElementValue::Array(e), ElementValue::Array(a)) => {
            same_len(path, e, a)?;
            for (idx, (e, a)) in e.iter().zip(a).enumerate() {
                check_element_value(&format!("{path}[{idx}]"), e, a)?;
            }
            Ok(())
        }
        (e @ (ElementValue::Class(_) | ElementValue::Enum { .. }), a) => same(path, e, a),
        (e, a) => Err(mismatch(path, e, a)),
    }
}

/// Floating-point constants are equal when their bits are equal or both are
/// NaN.
fn check_const(path: &str, expected: &ConstValue, actual: &ConstValue) -> Check {
    let equal = match (expected, actual) {
        (ConstValue::Float(e), ConstValue::Float(a)) => {
            e.to_bits() == a.to_bits() || (e.is_nan() && a.is_nan())
        }
        (ConstValue::Double(e), ConstValue::Double(a)) => {
            e.to_bits() == a.to_bits() || (e.is_nan() && a.is_nan())
        }
        (e, a) => e == a,
    };
    if equal {
        Ok(())
    } else {
        Err(mismatch(path, expected, actual))
    }
}
