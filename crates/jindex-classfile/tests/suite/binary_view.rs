use jindex_classfile::{access_flags, tag_bits, BinaryMethod, BinaryType, ClassFile};
use jindex_test_utils::{ClassFileBuilder, FieldSpec, MethodSpec};

#[test]
fn member_type_takes_modifiers_from_inner_classes_entry() {
    let bytes = ClassFileBuilder::new("com/example/Outer$Inner")
        .access_flags(access_flags::ACC_PUBLIC)
        .inner_class(
            "com/example/Outer$Inner",
            Some("com/example/Outer"),
            Some("Inner"),
            access_flags::ACC_PRIVATE | access_flags::ACC_STATIC,
        )
        .build();
    let class = ClassFile::parse(&bytes).unwrap();

    assert_eq!(
        class.modifiers(),
        access_flags::ACC_PRIVATE | access_flags::ACC_STATIC
    );
    assert!(class.is_member());
    assert!(!class.is_local());
    assert!(!class.is_anonymous());
    assert_eq!(class.source_name(), "Inner");
    assert_eq!(class.enclosing_type_name(), Some("com/example/Outer"));
}

#[test]
fn anonymous_type_uses_enclosing_method() {
    let bytes = ClassFileBuilder::new("com/example/Outer$1")
        .inner_class("com/example/Outer$1", None, None, 0)
        .enclosing_method("com/example/Outer", Some(("run", "()V")))
        .build();
    let class = ClassFile::parse(&bytes).unwrap();

    assert!(class.is_anonymous());
    assert!(!class.is_member());
    assert_eq!(class.source_name(), "");
    assert_eq!(class.enclosing_type_name(), Some("com/example/Outer"));
    let method = class.enclosing_method().unwrap();
    assert_eq!((method.name.as_str(), method.descriptor.as_str()), ("run", "()V"));
}

#[test]
fn local_type_and_top_level_names() {
    let local = ClassFileBuilder::new("com/example/Outer$1Local")
        .inner_class("com/example/Outer$1Local", None, Some("Local"), 0)
        .enclosing_method("com/example/Outer", None)
        .build();
    let local = ClassFile::parse(&local).unwrap();
    assert!(local.is_local());
    assert_eq!(local.source_name(), "Local");
    assert!(local.enclosing_method().is_none());

    let top = ClassFile::parse(&ClassFileBuilder::new("com/example/Top").build()).unwrap();
    assert_eq!(top.source_name(), "Top");
    assert_eq!(top.enclosing_type_name(), None);
}

#[test]
fn argument_names_skip_compiler_parameters() {
    let mut ctor = MethodSpec::new(access_flags::ACC_PUBLIC, "<init>", "(Lcom/example/Outer;I)V");
    ctor.parameters = vec![
        (Some("this$0".to_string()), access_flags::ACC_MANDATED),
        (Some("size".to_string()), 0),
    ];
    let bytes = ClassFileBuilder::new("com/example/Outer$Inner")
        .method(ctor)
        .build();
    let class = ClassFile::parse(&bytes).unwrap();
    let ctor = &class.methods()[0];

    assert!(ctor.is_constructor());
    assert_eq!(ctor.argument_names(), vec!["size"]);
}

#[test]
fn tag_bits_reflect_deprecation_synthesis_and_missing_types() {
    let mut field = FieldSpec::new(access_flags::ACC_SYNTHETIC, "this$0", "LOuter;");
    field.deprecated = true;
    let bytes = ClassFileBuilder::new("Tagged")
        .deprecated()
        .missing_types(&["com/missing/A", "com/missing/B"])
        .field(field)
        .build();
    let class = ClassFile::parse(&bytes).unwrap();

    assert_eq!(
        class.tag_bits(),
        tag_bits::DEPRECATED | tag_bits::HAS_MISSING_TYPES
    );
    assert_eq!(
        class.missing_type_names(),
        &["com/missing/A".to_string(), "com/missing/B".to_string()]
    );
    assert_eq!(
        jindex_classfile::BinaryField::tag_bits(&class.fields()[0]),
        tag_bits::DEPRECATED | tag_bits::SYNTHETIC
    );
}

#[test]
fn missing_superclass_is_none() {
    let bytes = ClassFileBuilder::new("java/lang/Object")
        .superclass(None)
        .build();
    let class = ClassFile::parse(&bytes).unwrap();
    assert_eq!(class.superclass_name(), None);
}
