use jindex_classfile::{
    access_flags, Annotation, ClassFile, ClassFormatError, ConstValue, ElementValue,
    StackMapFrame, TargetInfo, TargetType, VerificationType,
};
use jindex_test_utils::{
    AnnotationSpec, ClassFileBuilder, CodeSpec, ConstantSpec, ElementSpec, FieldSpec, MethodSpec,
    TypeAnnotationSpec,
};
use pretty_assertions::assert_eq;

#[test]
fn parses_plain_class_with_field_constructor_and_marker() {
    let bytes = ClassFileBuilder::new("com/example/Plain")
        .source_file("Plain.java")
        .annotation(AnnotationSpec::marker("Lcom/example/Marker;"))
        .field(FieldSpec::new(access_flags::ACC_PRIVATE, "count", "I"))
        .method(MethodSpec::new(access_flags::ACC_PUBLIC, "<init>", "()V"))
        .build();

    let class = ClassFile::parse(&bytes).unwrap();
    assert_eq!(class.this_class, "com/example/Plain");
    assert_eq!(class.super_class.as_deref(), Some("java/lang/Object"));
    assert_eq!(class.source_file.as_deref(), Some("Plain.java"));
    assert_eq!(class.signature, None);
    assert_eq!(
        class.annotations,
        vec![Annotation {
            type_descriptor: "Lcom/example/Marker;".to_string(),
            elements: Vec::new(),
        }]
    );

    assert_eq!(class.fields.len(), 1);
    assert_eq!(class.fields[0].name, "count");
    assert_eq!(class.fields[0].descriptor, "I");
    assert_eq!(class.fields[0].constant, None);

    assert_eq!(class.methods.len(), 1);
    assert_eq!(class.methods[0].name, "<init>");
    assert!(class.methods[0].exceptions.is_empty());
}

#[test]
fn field_constants_follow_the_descriptor() {
    let constant = |name: &str, desc: &str, value: ConstantSpec| {
        let mut field = FieldSpec::new(access_flags::ACC_STATIC | access_flags::ACC_FINAL, name, desc);
        field.constant = Some(value);
        field
    };
    let bytes = ClassFileBuilder::new("Constants")
        .field(constant("flag", "Z", ConstantSpec::Int(1)))
        .field(constant("letter", "C", ConstantSpec::Int(0x41)))
        .field(constant("small", "B", ConstantSpec::Int(-2)))
        .field(constant("big", "J", ConstantSpec::Long(1 << 40)))
        .field(constant("ratio", "D", ConstantSpec::Double(0.5)))
        .field(constant("nul", "Ljava/lang/String;", ConstantSpec::String("a\0b".into())))
        .build();

    let class = ClassFile::parse(&bytes).unwrap();
    let constants: Vec<_> = class
        .fields
        .iter()
        .map(|f| f.constant.clone().unwrap())
        .collect();
    assert_eq!(
        constants,
        vec![
            ConstValue::Boolean(true),
            ConstValue::Char(0x41),
            ConstValue::Byte(-2),
            ConstValue::Long(1 << 40),
            ConstValue::Double(0.5),
            ConstValue::String("a\0b".to_string()),
        ]
    );
}

#[test]
fn constant_on_reference_field_is_rejected() {
    let mut field = FieldSpec::new(0, "list", "Ljava/util/List;");
    field.constant = Some(ConstantSpec::Int(0));
    let bytes = ClassFileBuilder::new("Bad").field(field).build();

    assert_eq!(
        ClassFile::parse(&bytes).unwrap_err(),
        ClassFormatError::MalformedAttribute("ConstantValue")
    );
}

#[test]
fn method_attributes_are_decoded() {
    let mut method = MethodSpec::new(access_flags::ACC_PUBLIC, "run", "(ILjava/lang/String;)V");
    method.signature = Some("<T:Ljava/lang/Object;>(ILjava/lang/String;)V".to_string());
    method.exceptions = vec!["java/io/IOException".to_string()];
    method.parameters = vec![(Some("count".to_string()), 0), (Some("label".to_string()), 0)];
    method.parameter_annotations = vec![
        Vec::new(),
        vec![AnnotationSpec::marker("Ljavax/annotation/Nonnull;")],
    ];
    method.type_annotations = vec![TypeAnnotationSpec::new(
        0x16,
        &[1],
        AnnotationSpec::marker("Lcom/example/TA;"),
    )];
    method.code = Some(CodeSpec {
        max_stack: 0,
        max_locals: 3,
        code: vec![0xB1],
        local_variable_types: vec![(0, 1, "items".into(), "Ljava/util/List<TT;>;".into(), 2)],
        stack_map_table: Some(vec![0, 2, 3, 255, 0, 5, 0, 1, 1, 0, 0]),
    });

    let bytes = ClassFileBuilder::new("Runner").method(method).build();
    let class = ClassFile::parse(&bytes).unwrap();
    let run = &class.methods[0];

    assert_eq!(run.exceptions, vec!["java/io/IOException".to_string()]);
    assert_eq!(run.parameters.len(), 2);
    assert_eq!(run.parameters[1].name.as_deref(), Some("label"));
    assert_eq!(run.parameter_annotations.len(), 2);
    assert!(run.parameter_annotations[0].is_empty());
    assert_eq!(
        run.parameter_annotations[1][0].type_descriptor,
        "Ljavax/annotation/Nonnull;"
    );

    let ta = &run.type_annotations[0];
    assert_eq!(ta.target_type, TargetType::MethodFormalParameter);
    assert_eq!(ta.target_info, TargetInfo::FormalParameter { index: 1 });
    assert!(ta.type_path.is_empty());

    let code = run.code.as_ref().unwrap();
    assert_eq!(code.code_length, 1);
    let lvt = code.local_variable_type_table().unwrap();
    assert_eq!(lvt.entries[0].signature, "Ljava/util/List<TT;>;");
    let frames = &code.stack_map_table().unwrap().frames;
    assert_eq!(
        frames,
        &vec![
            StackMapFrame::Same { offset_delta: 3 },
            StackMapFrame::Full {
                offset_delta: 5,
                locals: vec![VerificationType::Integer],
                stack: Vec::new(),
            },
        ]
    );
}

#[test]
fn annotation_default_and_nested_values() {
    let mut element = MethodSpec::new(
        access_flags::ACC_PUBLIC | access_flags::ACC_ABSTRACT,
        "value",
        "()[Ljava/lang/String;",
    );
    element.default_value = Some(ElementSpec::Array(vec![
        ElementSpec::String("a".into()),
        ElementSpec::String("b".into()),
    ]));

    let bytes = ClassFileBuilder::new("com/example/Tags")
        .access_flags(
            access_flags::ACC_PUBLIC
                | access_flags::ACC_INTERFACE
                | access_flags::ACC_ABSTRACT
                | access_flags::ACC_ANNOTATION,
        )
        .interface("java/lang/annotation/Annotation")
        .invisible_annotation(
            AnnotationSpec::marker("Ljava/lang/annotation/Retention;").with(
                "value",
                ElementSpec::Enum {
                    type_descriptor: "Ljava/lang/annotation/RetentionPolicy;".into(),
                    const_name: "CLASS".into(),
                },
            ),
        )
        .method(element)
        .build();

    let class = ClassFile::parse(&bytes).unwrap();
    assert_eq!(class.interfaces, vec!["java/lang/annotation/Annotation".to_string()]);
    assert_eq!(
        class.annotations[0].elements,
        vec![(
            "value".to_string(),
            ElementValue::Enum {
                type_descriptor: "Ljava/lang/annotation/RetentionPolicy;".to_string(),
                const_name: "CLASS".to_string(),
            }
        )]
    );
    assert_eq!(
        class.methods[0].default_value,
        Some(ElementValue::Array(vec![
            ElementValue::Const(ConstValue::String("a".to_string())),
            ElementValue::Const(ConstValue::String("b".to_string())),
        ]))
    );
}

#[test]
fn unknown_attributes_are_skipped() {
    let bytes = ClassFileBuilder::new("Odd")
        .raw_attribute("com.example.Vendor", &[1, 2, 3, 4])
        .build();
    let class = ClassFile::parse(&bytes).unwrap();
    assert_eq!(class.this_class, "Odd");
}

#[test]
fn short_attribute_body_is_an_error() {
    // `SourceFile` needs two bytes.
    let bytes = ClassFileBuilder::new("Short")
        .raw_attribute("SourceFile", &[0])
        .build();
    assert!(ClassFile::parse(&bytes).is_err());
}

#[test]
fn truncated_input_reports_eof() {
    let bytes = ClassFileBuilder::new("Cut").build();
    let err = ClassFile::parse(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, ClassFormatError::UnexpectedEof { .. }));
}

#[test]
fn bad_magic_is_rejected() {
    let mut bytes = ClassFileBuilder::new("Magic").build();
    bytes[0] = 0;
    assert_eq!(
        ClassFile::parse(&bytes).unwrap_err(),
        ClassFormatError::InvalidMagic(0x00FE_BABE)
    );
}
