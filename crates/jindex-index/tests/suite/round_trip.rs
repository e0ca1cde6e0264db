use jindex_classfile::{access_flags, ClassFile};
use jindex_index::{
    assert_type_consistent, check_type, IndexBinaryType, IndexConverter, IndexStore, JavaIndex,
    ResourceFile,
};
use jindex_test_utils::{
    AnnotationSpec, ClassFileBuilder, ConstantSpec, ElementSpec, FieldSpec, MethodSpec,
    TypeAnnotationSpec,
};

fn rehydrate(class: &ClassFile, descriptor: &str) -> (JavaIndex, IndexBinaryType) {
    let mut index = JavaIndex::new();
    let resource = index.add_resource(ResourceFile::new("/lib/a.jar"));
    let type_id = IndexConverter::new(&mut index, resource)
        .add_type(class, descriptor)
        .unwrap();
    let record = index.find_type(type_id, resource).unwrap();
    let binary = IndexBinaryType::new(record, index.interner());
    (index, binary)
}

#[test]
fn generic_class_round_trips() {
    let bytes = ClassFileBuilder::new("p/Repo")
        .interface("java/lang/Iterable")
        .signature(
            "<K::Ljava/lang/Comparable<-TK;>;V:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Iterable<TV;>;",
        )
        .field(FieldSpec {
            signature: Some("Ljava/util/Map<TK;+TV;>;".to_string()),
            ..FieldSpec::new(access_flags::ACC_PRIVATE, "entries", "Ljava/util/Map;")
        })
        .method(MethodSpec {
            signature: Some(
                "<E:Ljava/lang/Exception;>(TK;[Ljava/util/List<*>;)TV;^TE;^Ljava/io/IOException;"
                    .to_string(),
            ),
            exceptions: vec!["java/lang/Exception".to_string(), "java/io/IOException".to_string()],
            ..MethodSpec::new(
                access_flags::ACC_PUBLIC,
                "find",
                "(Ljava/lang/Comparable;[Ljava/util/List;)Ljava/lang/Object;",
            )
        })
        .method(MethodSpec::new(access_flags::ACC_PUBLIC, "<init>", "()V"))
        .build();
    let class = ClassFile::parse(&bytes).unwrap();
    let (_index, binary) = rehydrate(&class, "Lp/Repo;");

    assert_type_consistent(&class, &binary);
}

#[test]
fn annotations_and_constants_round_trip() {
    let nested = AnnotationSpec::marker("Lp/Inner;").with("value", ElementSpec::Char(b'x' as u16));
    let bytes = ClassFileBuilder::new("p/Annotated")
        .deprecated()
        .annotation(
            AnnotationSpec::marker("Lp/Config;")
                .with("ratio", ElementSpec::Double(f64::NAN))
                .with("inner", ElementSpec::Annotation(nested))
                .with(
                    "tags",
                    ElementSpec::Array(vec![
                        ElementSpec::String("a".to_string()),
                        ElementSpec::String("b".to_string()),
                    ]),
                ),
        )
        .type_annotation(
            TypeAnnotationSpec::new(0x10, &[0xff, 0xff], AnnotationSpec::marker("Lp/Ann;"))
                .with_path(0, 0),
        )
        .field(FieldSpec {
            constant: Some(ConstantSpec::Float(f32::NAN)),
            ..FieldSpec::new(access_flags::ACC_STATIC | access_flags::ACC_FINAL, "F", "F")
        })
        .field(FieldSpec {
            constant: Some(ConstantSpec::String("hi".to_string())),
            annotations: vec![AnnotationSpec::marker("Lp/Field;")],
            ..FieldSpec::new(access_flags::ACC_STATIC | access_flags::ACC_FINAL, "S", "Ljava/lang/String;")
        })
        .method(MethodSpec {
            parameters: vec![(Some("a".to_string()), 0), (Some("b".to_string()), 0)],
            parameter_annotations: vec![vec![AnnotationSpec::marker("Lp/P;")]],
            ..MethodSpec::new(access_flags::ACC_PUBLIC, "m", "(IJ)V")
        })
        .method(MethodSpec {
            default_value: Some(ElementSpec::Enum {
                type_descriptor: "Lp/Mode;".to_string(),
                const_name: "SLOW".to_string(),
            }),
            ..MethodSpec::new(access_flags::ACC_PUBLIC | access_flags::ACC_ABSTRACT, "mode", "()Lp/Mode;")
        })
        .build();
    let class = ClassFile::parse(&bytes).unwrap();
    let (_index, binary) = rehydrate(&class, "Lp/Annotated;");

    assert_type_consistent(&class, &binary);
}

#[test]
fn inner_class_with_synthetic_parameter_round_trips() {
    let bytes = ClassFileBuilder::new("p/Outer$Inner")
        .inner_class("p/Outer$Inner", Some("p/Outer"), Some("Inner"), access_flags::ACC_PUBLIC)
        .method(MethodSpec {
            parameters: vec![
                (Some("this$0".to_string()), access_flags::ACC_MANDATED),
                (Some("n".to_string()), 0),
            ],
            ..MethodSpec::new(access_flags::ACC_PUBLIC, "<init>", "(Lp/Outer;I)V")
        })
        .method(MethodSpec::new(access_flags::ACC_PUBLIC, "b", "()V"))
        .method(MethodSpec::new(access_flags::ACC_PUBLIC, "a", "()V"))
        .build();
    let class = ClassFile::parse(&bytes).unwrap();
    let (_index, binary) = rehydrate(&class, "Lp/Outer$Inner;");

    assert_type_consistent(&class, &binary);
}

#[test]
fn moved_class_keeps_its_own_name() {
    let bytes = ClassFileBuilder::new("p/Real").build();
    let class = ClassFile::parse(&bytes).unwrap();
    let (_index, binary) = rehydrate(&class, "Lelsewhere/Real;");

    assert_type_consistent(&class, &binary);
}

#[test]
fn extra_signature_interfaces_are_reported() {
    let bytes = ClassFileBuilder::new("p/Odd")
        .signature("Ljava/lang/Object;Ljava/lang/Runnable;")
        .build();
    let class = ClassFile::parse(&bytes).unwrap();
    let (_index, binary) = rehydrate(&class, "Lp/Odd;");

    let mismatch = check_type(&class, &binary).unwrap_err();
    assert!(mismatch.path.starts_with("type(p/Odd)."), "{mismatch}");
}

#[test]
fn differing_views_name_the_field() {
    let original = ClassFileBuilder::new("p/C")
        .field(FieldSpec::new(0, "a", "I"))
        .build();
    let changed = ClassFileBuilder::new("p/C")
        .field(FieldSpec::new(0, "a", "J"))
        .build();
    let original = ClassFile::parse(&original).unwrap();
    let changed = ClassFile::parse(&changed).unwrap();
    let (_index, binary) = rehydrate(&changed, "Lp/C;");

    let mismatch = check_type(&original, &binary).unwrap_err();
    assert!(mismatch.path.contains("descriptor"), "{mismatch}");
}
