use jindex_signature::{
    count_method_parameters, parse_class_signature, parse_field_signature,
    parse_method_signature, TypeInterner,
};
use pretty_assertions::assert_eq;

const FIELD_SIGNATURES: &[(&str, &str)] = &[
    ("I", "I"),
    ("[[J", "[[J"),
    ("Ljava/lang/String;", "Ljava/lang/String;"),
    ("TT;", "Ljava/lang/Object;"),
    ("[TT;", "[Ljava/lang/Object;"),
    ("Ljava/util/List<Ljava/lang/String;>;", "Ljava/util/List;"),
    ("Ljava/util/Map<+TK;-[I>;", "Ljava/util/Map;"),
    ("Ljava/util/List<*>;", "Ljava/util/List;"),
    ("Lp/Outer<TT;>.Inner<TU;>.Deeper;", "Lp/Outer$Inner$Deeper;"),
    ("Lp/Outer.Inner<Ljava/lang/Integer;>;", "Lp/Outer$Inner;"),
];

const CLASS_SIGNATURES: &[&str] = &[
    "Ljava/lang/Object;",
    "<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Comparable<TT;>;",
    "<E:Ljava/lang/Enum<TE;>;>Ljava/lang/Object;",
    "<K::Ljava/lang/Comparable<-TK;>;:Ljava/io/Serializable;V:Ljava/lang/Object;>Ljava/util/AbstractMap<TK;TV;>;",
];

const METHOD_SIGNATURES: &[(&str, &str)] = &[
    ("()V", "()V"),
    ("<T:Ljava/lang/Object;>(TT;)TT;", "(Ljava/lang/Object;)Ljava/lang/Object;"),
    (
        "<X:Ljava/lang/Throwable;>(Ljava/util/function/Supplier<+TX;>;)V^TX;^Ljava/io/IOException;",
        "(Ljava/util/function/Supplier;)V",
    ),
    ("([Ljava/util/List<*>;I)[TT;", "([Ljava/util/List;I)[Ljava/lang/Object;"),
];

#[test]
fn field_signatures_round_trip_through_write_back() {
    let mut interner = TypeInterner::new();
    for (signature, descriptor) in FIELD_SIGNATURES {
        let first = parse_field_signature(signature, descriptor, &mut interner).unwrap();
        let second = parse_field_signature(signature, descriptor, &mut interner).unwrap();
        assert_eq!(first, second, "non-deterministic parse of {signature}");
        assert_eq!(first.to_signature_string(&interner), *signature);
        assert_eq!(interner.resolve(first.raw_type()), *descriptor);
    }
}

#[test]
fn class_signatures_round_trip_through_write_back() {
    let mut interner = TypeInterner::new();
    for signature in CLASS_SIGNATURES {
        let parsed = parse_class_signature(signature, &mut interner).unwrap();
        assert_eq!(parsed.to_signature_string(&interner), *signature);
        let reparsed =
            parse_class_signature(&parsed.to_signature_string(&interner), &mut interner).unwrap();
        assert_eq!(parsed, reparsed);
    }
}

#[test]
fn method_signatures_round_trip_through_write_back() {
    let mut interner = TypeInterner::new();
    let exceptions = vec![
        "Ljava/lang/Throwable;".to_string(),
        "Ljava/io/IOException;".to_string(),
    ];
    for (signature, descriptor) in METHOD_SIGNATURES {
        let parsed =
            parse_method_signature(signature, descriptor, 0, &exceptions, &mut interner).unwrap();
        assert_eq!(parsed.to_signature_string(&interner), *signature);
        assert_eq!(
            parsed.parameters.len(),
            count_method_parameters(signature).unwrap()
        );
    }
}

#[test]
fn structurally_identical_raw_types_are_shared() {
    let mut interner = TypeInterner::new();
    let a = parse_field_signature("Ljava/util/List<TT;>;", "Ljava/util/List;", &mut interner)
        .unwrap();
    let b = parse_field_signature("Ljava/util/List;", "Ljava/util/List;", &mut interner).unwrap();
    assert_eq!(a.raw_type(), b.raw_type());
}
