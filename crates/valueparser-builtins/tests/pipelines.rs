//! Built-in transforms composed through the registry.

use valueparser_core::{
    BuildContext, ErrorCode, Factory, FieldDescriptor, FieldError, Parsed, ParserBuilder,
    Params, ParamsExt, PipelineDocument, Value,
};

#[test]
fn factory_by_name() {
    let registry = valueparser_builtins::registry();
    let value: Value = serde_json::from_str(r#"{"type": "Clipped", "max": 1.0}"#).unwrap();
    let factory = Factory::from_value(&value, &registry).unwrap();

    let p = factory
        .build(&BuildContext::new().with_parent("system").with_name("gain"))
        .unwrap();
    assert_eq!(p.path(), Some("system.gain"));
    assert_eq!(p.parse(2.0).unwrap(), Value::Float(1.0));
    assert_eq!(p.parse(0.5).unwrap(), Value::Float(0.5));
}

#[test]
fn clipped_then_rounded() {
    let registry = valueparser_builtins::registry();
    let p = ParserBuilder::new(&registry)
        .parser(
            vec!["Clipped", "Rounded"],
            Params::new().with("min", 0i64).with("max", 10i64).with("ndigits", 0i64),
        )
        .unwrap();

    assert_eq!(p.parse(11.7).unwrap(), Value::Float(10.0));
    assert_eq!(p.parse(-3.2).unwrap(), Value::Float(0.0));
    assert_eq!(p.parse(4.4).unwrap(), Value::Float(4.0));
    assert_eq!(p.parse(2.5).unwrap(), Value::Float(2.0));
}

#[test]
fn float_then_clipped() {
    let registry = valueparser_builtins::registry();
    let p = ParserBuilder::new(&registry)
        .parser(
            vec!["float", "Clipped"],
            Params::new().with("min", 0i64).with("max", 10i64),
        )
        .unwrap();

    assert_eq!(p.parse("11").unwrap(), Value::Float(10.0));
    assert_eq!(p.parse("2.3").unwrap(), Value::Float(2.3));
    assert_eq!(p.parse("x").unwrap_err().code, ErrorCode::InvalidValue);
}

#[test]
fn schema_merges_in_order() {
    let registry = valueparser_builtins::registry();
    let t = ParserBuilder::new(&registry)
        .build(vec!["float", "Clipped", "Rounded", "Formatted"], Some("Display"))
        .unwrap();

    assert_eq!(t.name(), "Display");
    assert_eq!(
        t.schema().field_names().collect::<Vec<_>>(),
        vec!["min", "max", "ndigits", "format"]
    );

    let p = t
        .instance(Params::new().with("max", 1i64).with("format", "%.2f"))
        .unwrap();
    assert_eq!(p.parse("3.14159").unwrap(), Value::from("1.00"));
}

#[test]
fn int_listed() {
    let registry = valueparser_builtins::registry();
    let p = ParserBuilder::new(&registry)
        .parser(
            vec!["int", "Listed"],
            Params::new().with("items", vec![1i64, 2, 3]).with("default_item", 0i64),
        )
        .unwrap();

    assert_eq!(p.parse("2").unwrap(), Value::Int(2));
    assert_eq!(p.parse(9).unwrap(), Value::Int(0));
}

#[test]
fn parsed_field() {
    let registry = valueparser_builtins::registry();
    let builder = ParserBuilder::new(&registry);
    let parsed = Parsed::build_with(
        &builder,
        vec!["float", "Bounded"],
        Params::new().with("max", 10i64),
    )
    .unwrap();

    let field = parsed.descriptor("x");
    assert_eq!(field.validate(Value::from("4")).unwrap(), Value::Float(4.0));
    match field.validate(Value::from("40")).unwrap_err() {
        FieldError::Parse { field, source } => {
            assert_eq!(field, "x");
            assert_eq!(source.code, ErrorCode::OutOfBound);
        }
        other => panic!("unexpected error: {other}"),
    }

    // The sub-field runs first.
    let rounded = Parsed::build_with(&builder, "Rounded", Params::new().with("ndigits", 0i64))
        .unwrap();
    let nested = FieldDescriptor::new("y")
        .validator(parsed.clone())
        .sub_field(rounded.descriptor("inner"));
    assert_eq!(nested.validate(Value::Float(9.4)).unwrap(), Value::Float(9.0));
    assert!(matches!(
        nested.validate(Value::Float(10.6)).unwrap_err(),
        FieldError::Parse { field, .. } if field == "y"
    ));
}

#[test]
fn document_with_builtins() {
    let registry = valueparser_builtins::registry();
    let yaml = br#"
parsers:
  gain:
    type: [float, Clipped]
    min: 0.0
    max: 1.0
  label:
    type: Formatted
    format: "%05.1f"
  mode:
    type: Enumerated
    members:
      low: 1
      high: 2
"#;
    let doc = PipelineDocument::from_bytes_format(yaml, "yaml", &registry).unwrap();
    assert_eq!(doc.names().collect::<Vec<_>>(), vec!["gain", "label", "mode"]);

    let parsers = doc.build_all(&BuildContext::new().with_parent("device")).unwrap();
    assert_eq!(parsers["gain"].parse("1.5").unwrap(), Value::Float(1.0));
    assert_eq!(parsers["gain"].path(), Some("device.gain"));
    assert_eq!(parsers["label"].parse(3.14159).unwrap(), Value::from("003.1"));
    assert_eq!(parsers["mode"].parse("high").unwrap(), Value::Int(2));
    assert_eq!(
        parsers["mode"].parse("mid").unwrap_err().code,
        ErrorCode::NotListed
    );
}

#[test]
fn document_rejects_unknown_parameter() {
    let registry = valueparser_builtins::registry();
    let toml = br#"
[parsers.gain]
type = "Clipped"
maximum = 1.0
"#;
    let err = PipelineDocument::from_bytes_format(toml, "toml", &registry).unwrap_err();
    assert!(err.to_string().contains("gain"), "{err}");
}
