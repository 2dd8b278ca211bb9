use super::*;

#[test]
fn test_same_type_is_structural() {
    let a = Type::tuple(vec![Type::signed32(), Type::string()]);
    let b = Type::tuple(vec![Type::signed32(), Type::string()]);
    assert!(a.same_type(&b));

    let nullable = Type::tuple(vec![
        Type::signed32().set_may_be_null(true).unwrap(),
        Type::string(),
    ]);
    assert!(!a.same_type(&nullable));
    assert!(!a.same_type(&Type::raw_tuple(vec![Type::signed32(), Type::string()])));
}

#[test]
fn test_set_may_be_null() {
    let ty = Type::signed64();
    let nullable = ty.set_may_be_null(true).unwrap();
    assert!(nullable.may_be_null());
    assert_eq!(nullable.kind(), ty.kind());
    assert!(nullable.set_may_be_null(false).unwrap().same_type(&ty));
}

#[test]
fn test_reference_cannot_be_nullable() {
    let reference = Type::reference(Type::signed32(), false);
    let err = reference.set_may_be_null(true).unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::Malformed);
    assert!(reference.set_may_be_null(false).is_ok());
}

#[test]
fn test_null_type_is_always_nullable() {
    assert!(Type::null().may_be_null());
    assert!(Type::null().set_may_be_null(false).is_err());
}

#[test]
fn test_integer_constants() {
    let i8_type = Type::integer(IntBitWidth::I8, true);
    assert_eq!(i8_type.min_value().unwrap().to_string(), "-128");
    assert_eq!(i8_type.max_value().unwrap().to_string(), "127");

    let u16_type = Type::integer(IntBitWidth::I16, false);
    assert_eq!(u16_type.min_value().unwrap().to_string(), "0");
    assert_eq!(u16_type.max_value().unwrap().to_string(), "65535");

    let zero = Type::signed32().zero().unwrap();
    assert_eq!(zero.ty(), Some(&Type::signed32()));
    assert_eq!(Type::signed64().one().unwrap().to_string(), "1");
}

#[test]
fn test_float_constants() {
    assert_eq!(Type::double().zero().unwrap().to_string(), "0.0");
    assert_eq!(
        Type::float(FloatBitWidth::F32).max_value().unwrap().to_string(),
        format!("{:?}", f64::from(f32::MAX))
    );
}

#[test]
fn test_non_numeric_constants_are_unimplemented() {
    let err = Type::string().zero().unwrap_err();
    assert!(err.is_unsupported());
    assert!(Type::new(TypeKind::Decimal).max_value().is_err());
}

#[test]
fn test_reduce_numeric_promotion() {
    let i16_type = Type::integer(IntBitWidth::I16, true);
    let reduced = i16_type.reduce(&Type::signed64()).unwrap();
    assert!(reduced.same_type(&Type::signed64()));

    let reduced = Type::signed32().reduce(&Type::double()).unwrap();
    assert!(reduced.same_type(&Type::double()));

    let nullable = Type::signed32().set_may_be_null(true).unwrap();
    let reduced = nullable.reduce(&Type::signed64()).unwrap();
    assert!(reduced.may_be_null());
    assert!(reduced.set_may_be_null(false).unwrap().same_type(&Type::signed64()));
}

#[test]
fn test_reduce_with_null_and_mismatch() {
    let reduced = Type::null().reduce(&Type::string()).unwrap();
    assert!(reduced.same_type(&Type::string().set_may_be_null(true).unwrap()));

    let err = Type::string().reduce(&Type::bool()).unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::TypeMismatch);
}

#[test]
fn test_element_type() {
    let zset = Type::zset(Type::signed32());
    assert_eq!(zset.element_type(), Some(Type::signed32()));

    let indexed = Type::indexed_zset(Type::bool(), Type::string());
    assert_eq!(
        indexed.element_type(),
        Some(Type::raw_tuple(vec![Type::bool(), Type::string()]))
    );
    assert_eq!(Type::bool().element_type(), None);
}

#[test]
fn test_display() {
    assert_eq!(Type::signed32().to_string(), "i32");
    assert_eq!(
        Type::signed64().set_may_be_null(true).unwrap().to_string(),
        "Option<i64>"
    );
    assert_eq!(
        Type::tuple(vec![Type::signed32(), Type::double()]).to_string(),
        "Tup2<i32, f64>"
    );
    assert_eq!(Type::zset(Type::bool()).to_string(), "OrdZSet<bool, i64>");
    assert_eq!(
        Type::reference(Type::string(), false).to_string(),
        "&String"
    );
    assert_eq!(Type::unit().to_string(), "()");
    assert_eq!(
        Type::function(Some(Type::bool()), vec![Type::signed32()]).to_string(),
        "fn(i32) -> bool"
    );
}

#[test]
fn test_deserialized_types_are_validated() {
    let row = Type::tuple(vec![
        Type::signed32().set_may_be_null(true).unwrap(),
        Type::reference(Type::string(), false),
    ]);
    let json = serde_json::to_string(&row).unwrap();
    let parsed: Type = serde_json::from_str(&json).unwrap();
    assert!(parsed.same_type(&row));

    let nullable_reference = r#"{
        "kind": {"Reference": {"inner": {"kind": "Bool", "may_be_null": false}, "mutable": false}},
        "may_be_null": true
    }"#;
    let err = serde_json::from_str::<Type>(nullable_reference).unwrap_err();
    assert!(err.to_string().contains("reference types cannot be nullable"));

    let non_null_null = r#"{"kind": "Null", "may_be_null": false}"#;
    assert!(serde_json::from_str::<Type>(non_null_null).is_err());

    // validation also reaches nested types
    let nested = r#"{
        "kind": {"Vec": {"kind": {"Reference": {"inner": {"kind": "Bool", "may_be_null": false}, "mutable": false}}, "may_be_null": true}},
        "may_be_null": false
    }"#;
    assert!(serde_json::from_str::<Type>(nested).is_err());
}
