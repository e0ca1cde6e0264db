use jindex_classfile::{access_flags, ClassFile, TargetInfo, TargetType};
use jindex_index::{
    method_flags, type_flags, IndexConstant, IndexConverter, IndexStore, JavaIndex, ResourceFile,
};
use jindex_test_utils::{
    AnnotationSpec, ClassFileBuilder, ElementSpec, FieldSpec, MethodSpec, TypeAnnotationSpec,
};
use pretty_assertions::assert_eq;

fn index_one(bytes: &[u8], descriptor: &str) -> (JavaIndex, jindex_index::ResourceId) {
    let class = ClassFile::parse(bytes).unwrap();
    let mut index = JavaIndex::new();
    let resource = index.add_resource(ResourceFile::new("/lib/a.jar"));
    IndexConverter::new(&mut index, resource)
        .add_type(&class, descriptor)
        .unwrap();
    (index, resource)
}

#[test]
fn simple_class_produces_one_of_each_record() {
    let bytes = ClassFileBuilder::new("p/C")
        .annotation(AnnotationSpec::marker("Lp/Marker;"))
        .field(FieldSpec::new(access_flags::ACC_PRIVATE, "count", "I"))
        .method(MethodSpec::new(access_flags::ACC_PUBLIC, "<init>", "()V"))
        .build();
    let (index, _) = index_one(&bytes, "Lp/C;");

    assert_eq!(index.type_count(), 1);
    let types = index.find_types_by_field_descriptor("Lp/C;");
    assert_eq!(types.len(), 1);
    let record = types[0];
    assert_eq!(record.variables.len(), 1);
    assert_eq!(record.variables[0].name, "count");
    assert_eq!(record.methods.len(), 1);
    assert_eq!(record.methods[0].selector, "<init>");
    assert!(record.methods[0].parameters.is_empty());
    assert_eq!(record.methods[0].return_type, None);
    assert_eq!(record.annotations.len(), 1);
    assert!(record.annotations[0].value_pairs.is_empty());
    assert_eq!(
        index.interner().resolve(record.annotations[0].type_id),
        "Lp/Marker;"
    );
    assert_eq!(record.field_descriptor_from_class, None);
    assert!(!record.has_flag(type_flags::GENERIC_SIGNATURE_PRESENT));
    assert!(!record.has_flag(type_flags::NO_SUPERCLASS));
    assert_eq!(
        index.interner().resolve(record.superclass.raw_type()),
        "Ljava/lang/Object;"
    );
}

#[test]
fn formal_parameter_type_annotation_keeps_its_index() {
    let bytes = ClassFileBuilder::new("p/C")
        .method(MethodSpec {
            type_annotations: vec![TypeAnnotationSpec::new(
                0x16,
                &[1],
                AnnotationSpec::marker("Lp/NonNull;"),
            )],
            ..MethodSpec::new(access_flags::ACC_PUBLIC, "m", "(ILjava/lang/String;)V")
        })
        .build();
    let (index, _) = index_one(&bytes, "Lp/C;");

    let record = index.find_types_by_field_descriptor("Lp/C;")[0];
    let annotation = &record.methods[0].type_annotations[0];
    assert_eq!(annotation.target_type, TargetType::MethodFormalParameter);
    assert_eq!(annotation.target_info, TargetInfo::FormalParameter { index: 1 });
    assert!(annotation.path.is_empty());
}

#[test]
fn adding_the_same_class_twice_keeps_one_record() {
    let bytes = ClassFileBuilder::new("p/C")
        .field(FieldSpec::new(0, "f", "J"))
        .build();
    let class = ClassFile::parse(&bytes).unwrap();
    let mut index = JavaIndex::new();
    let resource = index.add_resource(ResourceFile::new("/lib/a.jar"));

    let first = IndexConverter::new(&mut index, resource)
        .add_type(&class, "Lp/C;")
        .unwrap();
    let before = index.find_type(first, resource).unwrap().clone();
    let second = IndexConverter::new(&mut index, resource)
        .add_type(&class, "Lp/C;")
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(index.type_count(), 1);
    assert_eq!(index.find_type(second, resource).unwrap(), &before);
}

#[test]
fn methods_are_sorted_and_remember_their_position() {
    let bytes = ClassFileBuilder::new("p/C")
        .method(MethodSpec::new(0, "zeta", "()V"))
        .method(MethodSpec::new(0, "alpha", "(J)V"))
        .method(MethodSpec::new(0, "alpha", "(I)V"))
        .build();
    let (index, _) = index_one(&bytes, "Lp/C;");

    let record = index.find_types_by_field_descriptor("Lp/C;")[0];
    let order: Vec<_> = record
        .methods
        .iter()
        .map(|m| (m.selector.as_str(), m.descriptor.as_str(), m.declaration_position))
        .collect();
    assert_eq!(
        order,
        vec![("alpha", "(I)V", 2), ("alpha", "(J)V", 1), ("zeta", "()V", 0)]
    );
}

#[test]
fn missing_types_are_joined_with_commas() {
    let bytes = ClassFileBuilder::new("p/C")
        .missing_types(&["p/Gone", "q/AlsoGone"])
        .build();
    let (index, _) = index_one(&bytes, "Lp/C;");

    let record = index.find_types_by_field_descriptor("Lp/C;")[0];
    assert_eq!(
        record.missing_type_names.as_deref(),
        Some("p/Gone,q/AlsoGone")
    );
}

#[test]
fn class_filed_under_a_different_descriptor_remembers_its_own() {
    let bytes = ClassFileBuilder::new("p/Real").build();
    let (index, _) = index_one(&bytes, "Lmoved/Real;");

    let record = index.find_types_by_field_descriptor("Lmoved/Real;")[0];
    assert_eq!(record.field_descriptor_from_class.as_deref(), Some("Lp/Real;"));
}

#[test]
fn root_class_is_flagged_without_superclass() {
    let bytes = ClassFileBuilder::new("java/lang/Object")
        .superclass(None)
        .build();
    let (index, _) = index_one(&bytes, "Ljava/lang/Object;");

    let record = index.find_types_by_field_descriptor("Ljava/lang/Object;")[0];
    assert!(record.has_flag(type_flags::NO_SUPERCLASS));
}

#[test]
fn generic_class_signature_populates_parameters_and_interfaces() {
    let bytes = ClassFileBuilder::new("p/Box")
        .interface("java/lang/Comparable")
        .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Comparable<Lp/Box<TT;>;>;")
        .build();
    let (index, _) = index_one(&bytes, "Lp/Box;");

    let record = index.find_types_by_field_descriptor("Lp/Box;")[0];
    assert!(record.has_flag(type_flags::GENERIC_SIGNATURE_PRESENT));
    assert_eq!(record.type_parameters.len(), 1);
    assert_eq!(record.type_parameters[0].identifier, "T");
    assert_eq!(record.interfaces.len(), 1);
    assert_eq!(
        record.interfaces[0].to_signature_string(index.interner()),
        "Ljava/lang/Comparable<Lp/Box<TT;>;>;"
    );
}

#[test]
fn throws_clause_in_signature_wins_over_exceptions_attribute() {
    let bytes = ClassFileBuilder::new("p/C")
        .method(MethodSpec {
            signature: Some("<X:Ljava/lang/Exception;>()V^TX;".to_string()),
            exceptions: vec!["java/lang/Exception".to_string()],
            ..MethodSpec::new(0, "run", "()V")
        })
        .method(MethodSpec {
            exceptions: vec!["java/io/IOException".to_string()],
            ..MethodSpec::new(0, "read", "()I")
        })
        .build();
    let (index, _) = index_one(&bytes, "Lp/C;");

    let record = index.find_types_by_field_descriptor("Lp/C;")[0];
    let read = &record.methods[0];
    assert_eq!(read.selector, "read");
    assert!(!read.has_flag(method_flags::HAS_THROWS_SIGNATURE));
    assert_eq!(
        read.exceptions[0].to_signature_string(index.interner()),
        "Ljava/io/IOException;"
    );

    let run = &record.methods[1];
    assert!(run.has_flag(method_flags::HAS_GENERIC_SIGNATURE));
    assert!(run.has_flag(method_flags::HAS_THROWS_SIGNATURE));
    assert_eq!(run.exceptions[0].to_signature_string(index.interner()), "TX;");
}

#[test]
fn annotation_values_and_constants_are_stored() {
    let bytes = ClassFileBuilder::new("p/C")
        .annotation(
            AnnotationSpec::marker("Lp/Config;")
                .with("name", ElementSpec::String("x".to_string()))
                .with(
                    "mode",
                    ElementSpec::Enum {
                        type_descriptor: "Lp/Mode;".to_string(),
                        const_name: "FAST".to_string(),
                    },
                )
                .with("kind", ElementSpec::Class("Ljava/lang/String;".to_string()))
                .with(
                    "sizes",
                    ElementSpec::Array(vec![ElementSpec::Int(1), ElementSpec::Int(2)]),
                ),
        )
        .field(FieldSpec {
            constant: Some(jindex_test_utils::ConstantSpec::Long(42)),
            ..FieldSpec::new(
                access_flags::ACC_STATIC | access_flags::ACC_FINAL,
                "ANSWER",
                "J",
            )
        })
        .method(MethodSpec {
            default_value: Some(ElementSpec::Boolean(true)),
            ..MethodSpec::new(access_flags::ACC_ABSTRACT, "enabled", "()Z")
        })
        .build();
    let (index, _) = index_one(&bytes, "Lp/C;");
    let interner = index.interner();

    let record = index.find_types_by_field_descriptor("Lp/C;")[0];
    let pairs = &record.annotations[0].value_pairs;
    assert_eq!(pairs[0], ("name".to_string(), IndexConstant::String("x".to_string())));
    match &pairs[1].1 {
        IndexConstant::Enum { type_id, name } => {
            assert_eq!(interner.resolve(*type_id), "Lp/Mode;");
            assert_eq!(name, "FAST");
        }
        other => panic!("unexpected enum value {other:?}"),
    }
    match &pairs[2].1 {
        IndexConstant::Class(id) => assert_eq!(interner.resolve(*id), "Ljava/lang/String;"),
        other => panic!("unexpected class value {other:?}"),
    }
    assert_eq!(
        pairs[3].1,
        IndexConstant::Array(vec![IndexConstant::Int(1), IndexConstant::Int(2)])
    );
    assert_eq!(record.variables[0].constant, Some(IndexConstant::Long(42)));
    assert_eq!(
        record.methods[0].default_value,
        Some(IndexConstant::Boolean(true))
    );
}

#[test]
fn member_and_enclosing_information_is_recorded() {
    let bytes = ClassFileBuilder::new("p/Outer$1")
        .inner_class("p/Outer$1", None, None, 0)
        .enclosing_method("p/Outer", Some(("run", "()V")))
        .source_file("Outer.java")
        .build();
    let (index, _) = index_one(&bytes, "Lp/Outer$1;");
    let interner = index.interner();

    let record = index.find_types_by_field_descriptor("Lp/Outer$1;")[0];
    assert!(record.is_anonymous);
    assert!(!record.is_member);
    assert_eq!(
        record.declaring_type.map(|id| interner.resolve(id)),
        Some("Lp/Outer;")
    );
    let method = record.declaring_method.as_ref().unwrap();
    assert_eq!((method.name.as_str(), method.descriptor.as_str()), ("run", "()V"));
    assert_eq!(record.source_file_name.as_deref(), Some("Outer.java"));
}
