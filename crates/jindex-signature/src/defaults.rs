//! Signatures synthesized for members that carry no `Signature` attribute.

use crate::parser::JAVA_LANG_OBJECT;

/// `L<superclass>;L<interface>;...`, with `java/lang/Object` standing in for a
/// missing superclass.
pub fn default_class_signature(superclass: Option<&str>, interfaces: &[String]) -> String {
    let mut out = match superclass {
        Some(name) => format!("L{name};"),
        None => JAVA_LANG_OBJECT.to_string(),
    };
    for interface in interfaces {
        out.push('L');
        out.push_str(interface);
        out.push(';');
    }
    out
}

/// The plain descriptor already follows the method-signature grammar. It has
/// no `^` clauses; exceptions of such methods come from the `Exceptions`
/// attribute instead.
pub fn default_method_signature(descriptor: &str) -> &str {
    descriptor
}

/// Number of leading descriptor parameters that the compiler added and the
/// source does not declare.
///
/// With a generic signature this is the surplus of descriptor parameters over
/// signature parameters. Without one, only the outer-instance parameter of a
/// constructor of a non-static member type is assumed.
pub fn compiler_defined_parameter_count(
    descriptor_parameters: usize,
    signature_parameters: Option<usize>,
    is_inner_class_constructor: bool,
) -> usize {
    match signature_parameters {
        Some(declared) => descriptor_parameters.saturating_sub(declared),
        None if is_inner_class_constructor && descriptor_parameters > 0 => 1,
        None => 0,
    }
}
