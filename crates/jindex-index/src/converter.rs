//! Turns one decoded class into index records.

use jindex_classfile::{
    access_flags, internal_name_to_descriptor, Annotation, BinaryField, BinaryMethod, BinaryType,
    ConstValue, ElementValue, TypeAnnotation,
};
use jindex_signature::{
    compiler_defined_parameter_count, count_method_parameters, default_class_signature,
    default_method_signature, parse_class_signature, parse_field_signature,
    parse_method_signature, split_method_descriptor, TypeId, TypeInterner, TypeSignature,
};

use crate::error::Result;
use crate::records::{
    method_flags, type_flags, variable_flags, IndexAnnotation, IndexConstant, IndexMethod,
    IndexMethodRef, IndexParameter, IndexType, IndexTypeAnnotation, IndexVariable, ResourceId,
};
use crate::store::IndexStore;

/// Writes the types of one resource into an [`IndexStore`].
pub struct IndexConverter<'s, S: IndexStore + ?Sized> {
    store: &'s mut S,
    resource: ResourceId,
}

impl<'s, S: IndexStore + ?Sized> IndexConverter<'s, S> {
    pub fn new(store: &'s mut S, resource: ResourceId) -> Self {
        Self { store, resource }
    }

    /// Converts `binary` and files it under `field_descriptor`.
    ///
    /// `field_descriptor` comes from where the class was found, which can
    /// differ from the name recorded inside the class file. Converting the same
    /// class again for the same resource replaces the existing record.
    pub fn add_type<T: BinaryType>(&mut self, binary: &T, field_descriptor: &str) -> Result<TypeId> {
        tracing::trace!(
            target = "jindex.index",
            descriptor = field_descriptor,
            resource = %self.resource,
            "adding binary type"
        );
        let record = convert_type(binary, field_descriptor, self.resource, self.store.interner_mut())?;
        Ok(self.store.put_type(record).type_id)
    }
}

fn convert_type<T: BinaryType>(
    binary: &T,
    field_descriptor: &str,
    resource: ResourceId,
    interner: &mut TypeInterner,
) -> Result<IndexType> {
    let descriptor_from_class = internal_name_to_descriptor(binary.name());
    let type_id = interner.intern(field_descriptor);

    let type_annotations = convert_type_annotations(binary.type_annotations(), interner);

    let mut flags = 0;
    if binary.generic_signature().is_some() {
        flags |= type_flags::GENERIC_SIGNATURE_PRESENT;
    }
    if binary.superclass_name().is_none() {
        flags |= type_flags::NO_SUPERCLASS;
    }

    let signature = match binary.generic_signature() {
        Some(signature) => parse_class_signature(signature, interner)?,
        None => parse_class_signature(
            &default_class_signature(binary.superclass_name(), binary.interface_names()),
            interner,
        )?,
    };
    if signature.interfaces.len() > binary.interface_names().len() {
        tracing::debug!(
            target = "jindex.index",
            class = binary.name(),
            declared = binary.interface_names().len(),
            in_signature = signature.interfaces.len(),
            "generic signature lists more interfaces than the class file; using the signature"
        );
    }

    let declaring_type = binary
        .enclosing_type_name()
        .map(|name| interner.intern(&internal_name_to_descriptor(name)));
    let annotations = convert_annotations(binary.annotations(), interner);
    let declaring_method = binary.enclosing_method().map(|method| IndexMethodRef {
        name: method.name.clone(),
        descriptor: method.descriptor.clone(),
    });

    let variables = binary
        .fields()
        .iter()
        .map(|field| convert_field(field, interner))
        .collect::<Result<Vec<_>>>()?;

    let mut order: Vec<(String, usize)> = binary
        .methods()
        .iter()
        .enumerate()
        .map(|(position, method)| (format!("{}{}", method.selector(), method.descriptor()), position))
        .collect();
    order.sort();
    let methods = order
        .into_iter()
        .map(|(_, position)| convert_method(&binary.methods()[position], position, binary, interner))
        .collect::<Result<Vec<_>>>()?;

    let missing_type_names = if binary.missing_type_names().is_empty() {
        None
    } else {
        Some(binary.missing_type_names().join(","))
    };

    Ok(IndexType {
        type_id,
        resource,
        field_descriptor_from_class: (descriptor_from_class != field_descriptor)
            .then_some(descriptor_from_class),
        flags,
        modifiers: binary.modifiers(),
        declaring_type,
        declaring_method,
        type_parameters: signature.type_parameters,
        superclass: signature.superclass,
        interfaces: signature.interfaces,
        annotations,
        type_annotations,
        variables,
        methods,
        missing_type_names,
        source_file_name: binary.source_file_name().map(str::to_string),
        is_anonymous: binary.is_anonymous(),
        is_local: binary.is_local(),
        is_member: binary.is_member(),
        tag_bits: binary.tag_bits(),
        source_name_override: binary.source_name().to_string(),
    })
}

fn convert_field<F: BinaryField>(field: &F, interner: &mut TypeInterner) -> Result<IndexVariable> {
    let mut flags = 0;
    if field.generic_signature().is_some() {
        flags |= variable_flags::GENERIC_SIGNATURE_PRESENT;
    }
    let signature = field.generic_signature().unwrap_or(field.descriptor());
    let annotations = convert_annotations(field.annotations(), interner);
    let type_annotations = convert_type_annotations(field.type_annotations(), interner);
    Ok(IndexVariable {
        name: field.name().to_string(),
        ty: parse_field_signature(signature, field.descriptor(), interner)?,
        flags,
        modifiers: field.modifiers(),
        tag_bits: field.tag_bits(),
        constant: field.constant().map(convert_const),
        annotations,
        type_annotations,
    })
}

fn convert_method<M: BinaryMethod, T: BinaryType>(
    method: &M,
    position: usize,
    owner: &T,
    interner: &mut TypeInterner,
) -> Result<IndexMethod> {
    let descriptor = method.descriptor();
    let (descriptor_parameters, _) = split_method_descriptor(descriptor)?;
    let exception_descriptors: Vec<String> = method
        .exception_names()
        .iter()
        .map(|name| internal_name_to_descriptor(name))
        .collect();

    let mut flags = 0;
    let annotations = convert_annotations(method.annotations(), interner);
    let type_annotations = convert_type_annotations(method.type_annotations(), interner);

    // Without a signature the descriptor is parsed as one and already contains
    // the compiler-defined parameters; with one, they exist only in the
    // descriptor and are parsed from it separately.
    let (compiler_defined, signature, mut parameter_types) = match method.generic_signature() {
        Some(generic) => {
            flags |= method_flags::HAS_GENERIC_SIGNATURE;
            let declared = count_method_parameters(generic)?;
            let compiler_defined =
                compiler_defined_parameter_count(descriptor_parameters.len(), Some(declared), false);
            let leading = descriptor_parameters[..compiler_defined]
                .iter()
                .map(|param| parse_field_signature(param, param, interner))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let signature = parse_method_signature(
                generic,
                descriptor,
                compiler_defined,
                &exception_descriptors,
                interner,
            )?;
            (compiler_defined, signature, leading)
        }
        None => {
            let is_inner_class_constructor = owner.is_member()
                && method.is_constructor()
                && owner.modifiers() & access_flags::ACC_STATIC == 0;
            let compiler_defined = compiler_defined_parameter_count(
                descriptor_parameters.len(),
                None,
                is_inner_class_constructor,
            );
            let signature = parse_method_signature(
                default_method_signature(descriptor),
                descriptor,
                0,
                &[],
                interner,
            )?;
            (compiler_defined, signature, Vec::new())
        }
    };
    parameter_types.extend(signature.parameters);

    let parameter_annotations = method.parameter_annotations();
    let mut names = method.argument_names().into_iter();
    let parameters = parameter_types
        .into_iter()
        .enumerate()
        .map(|(idx, ty)| {
            let compiler_defined = idx < compiler_defined;
            IndexParameter {
                ty,
                compiler_defined,
                name: if compiler_defined {
                    None
                } else {
                    names.next().map(str::to_string)
                },
                annotations: parameter_annotations
                    .get(idx)
                    .map(|annotations| convert_annotations(annotations, interner))
                    .unwrap_or_default(),
            }
        })
        .collect();

    let exceptions = if signature.exceptions.is_empty() {
        exception_descriptors
            .iter()
            .map(|desc| parse_field_signature(desc, desc, interner))
            .collect::<std::result::Result<Vec<TypeSignature>, _>>()?
    } else {
        flags |= method_flags::HAS_THROWS_SIGNATURE;
        signature.exceptions
    };

    Ok(IndexMethod {
        selector: method.selector().to_string(),
        descriptor: descriptor.to_string(),
        declaration_position: position as u32,
        modifiers: method.modifiers(),
        tag_bits: method.tag_bits(),
        flags,
        type_parameters: signature.type_parameters,
        parameters,
        annotated_parameter_count: parameter_annotations.len() as u32,
        return_type: signature.return_type,
        exceptions,
        default_value: method
            .default_value()
            .map(|value| convert_element_value(value, interner)),
        annotations,
        type_annotations,
    })
}

fn convert_annotations(annotations: &[Annotation], interner: &mut TypeInterner) -> Vec<IndexAnnotation> {
    annotations
        .iter()
        .map(|annotation| convert_annotation(annotation, interner))
        .collect()
}

fn convert_annotation(annotation: &Annotation, interner: &mut TypeInterner) -> IndexAnnotation {
    IndexAnnotation {
        type_id: interner.intern(&annotation.type_descriptor),
        value_pairs: annotation
            .elements
            .iter()
            .map(|(name, value)| (name.clone(), convert_element_value(value, interner)))
            .collect(),
    }
}

fn convert_type_annotations(
    annotations: &[TypeAnnotation],
    interner: &mut TypeInterner,
) -> Vec<IndexTypeAnnotation> {
    annotations
        .iter()
        .map(|annotation| IndexTypeAnnotation {
            target_type: annotation.target_type,
            target_info: annotation.target_info.clone(),
            path: annotation.type_path.clone(),
            annotation: convert_annotation(&annotation.annotation, interner),
        })
        .collect()
}

fn convert_const(value: &ConstValue) -> IndexConstant {
    match value {
        ConstValue::Byte(v) => IndexConstant::Byte(*v),
        ConstValue::Char(v) => IndexConstant::Char(*v),
        ConstValue::Short(v) => IndexConstant::Short(*v),
        ConstValue::Int(v) => IndexConstant::Int(*v),
        ConstValue::Long(v) => IndexConstant::Long(*v),
        ConstValue::Float(v) => IndexConstant::Float(*v),
        ConstValue::Double(v) => IndexConstant::Double(*v),
        ConstValue::Boolean(v) => IndexConstant::Boolean(*v),
        ConstValue::String(v) => IndexConstant::String(v.clone()),
    }
}

/// The single dispatch point from decoded element values to stored constants.
fn convert_element_value(value: &ElementValue, interner: &mut TypeInterner) -> IndexConstant {
    match value {
        ElementValue::Const(value) => convert_const(value),
        ElementValue::Class(descriptor) => IndexConstant::Class(interner.intern(descriptor)),
        ElementValue::Enum {
            type_descriptor,
            const_name,
        } => IndexConstant::Enum {
            type_id: interner.intern(type_descriptor),
            name: const_name.clone(),
        },
        ElementValue::Annotation(annotation) => {
            IndexConstant::Annotation(Box::new(convert_annotation(annotation, interner)))
        }
        ElementValue::Array(values) => IndexConstant::Array(
            values
                .iter()
                .map(|value| convert_element_value(value, interner))
                .collect(),
        ),
    }
}
