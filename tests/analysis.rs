use std::{collections::HashMap, fs};

use computed_props::{
    ErrorCode, PropertyKey, Value,
    ast::Span,
    config::{ConfigError, EngineConfig},
    dependencies::{
        dependency_keys, extract_dependencies, get_referenced_entity_ids, get_used_functions,
        has_collection_traversal,
    },
    interpreter::{
        evaluator::{
            core::{Context, EvalResult},
            function::core::{Arity, BUILTIN_FUNCTIONS, FunctionCategory, FunctionDefinition,
                             FunctionRegistry},
        },
        validate::validate_source,
        value::core::ValueType,
    },
    parse, validate,
};
use uuid::Uuid;

const OTHER: Uuid = Uuid::from_u128(0xabc);

#[test]
fn dependencies_are_distinct_and_in_source_order() {
    let src = format!("#price * #quantity + @self.price + @{{{OTHER}}}.rate - SUM(#lines[*].amount)");
    let expression = parse(&src).unwrap();

    let rendered: Vec<String> = extract_dependencies(&expression).iter()
                                                                 .map(ToString::to_string)
                                                                 .collect();
    assert_eq!(rendered,
               vec!["@self.price".to_string(),
                    "@self.quantity".to_string(),
                    format!("@{{{OTHER}}}.rate"),
                    "@self.lines[*].amount".to_string()]);
}

#[test]
fn dependency_details() {
    let expression = parse(&format!("@{{{OTHER}}}.customer.tier == 'gold' && COUNT(#lines[*])"))
        .unwrap();
    let dependencies = extract_dependencies(&expression);

    assert_eq!(dependencies[0].entity_id(), Some(OTHER));
    assert_eq!(dependencies[0].root_property(), Some("customer"));
    assert!(!dependencies[0].has_collection_traversal());
    assert_eq!(dependencies[1].entity_id(), None);
    assert!(dependencies[1].has_collection_traversal());

    assert!(has_collection_traversal(&expression));
    assert!(!has_collection_traversal(&parse("#a + #b[0]").unwrap()));
    assert_eq!(get_referenced_entity_ids(&expression), vec![OTHER]);
}

#[test]
fn dependency_keys_map_self_to_the_owner() {
    let owner = Uuid::from_u128(0x1);
    let expression = parse(&format!("#a + #a.b + @{{{OTHER}}}.c.d + SUM(#lines[*].amount)")).unwrap();

    assert_eq!(dependency_keys(&expression, owner),
               vec![PropertyKey::new(owner, "a"),
                    PropertyKey::new(OTHER, "c"),
                    PropertyKey::new(owner, "lines")]);
}

#[test]
fn literals_have_no_dependencies() {
    let expression = parse("1 + 2 * ROUND(3.5)").unwrap();
    assert!(extract_dependencies(&expression).is_empty());
    assert_eq!(get_used_functions(&expression), vec!["ROUND".to_string()]);
}

#[test]
fn used_functions_are_upper_cased_once() {
    let expression = parse("sum(#a) + SUM(#b) + If(#c, upper(#d), Upper(#e))").unwrap();
    assert_eq!(get_used_functions(&expression),
               vec!["SUM".to_string(), "IF".to_string(), "UPPER".to_string()]);
}

#[test]
fn validation_collects_every_problem() {
    let report = validate("SUMM(#a) + ROUND() + #lines[*].amount + total");
    let codes: Vec<ErrorCode> = report.errors.iter().map(|e| e.code).collect();
    assert_eq!(codes,
               vec![ErrorCode::InvalidFunction,
                    ErrorCode::InvalidArgumentCount,
                    ErrorCode::CollectionWithoutAggregation,
                    ErrorCode::UnknownIdentifier]);
    assert_eq!(report.errors[3].suggestions, vec!["#total".to_string()]);
    assert!(report.into_result().is_err());
}

#[test]
fn validation_accepts_well_formed_expressions() {
    for src in ["SUM(#lines[*].amount) * (1 + #tax_rate)",
                "IF(COUNT(#lines[*]) > 0, AVG(#lines[*].amount), 0)",
                "DATE_DIFF(#start, NOW(), 'days')",
                "CONCAT(UPPER(#first), ' ', #last)"]
    {
        let report = validate(src);
        assert!(report.is_valid(), "`{src}`: {:?}", report.errors);
    }
}

#[test]
fn validation_reports_parse_errors_alone() {
    let report = validate("1 + (2");
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, ErrorCode::UnexpectedEnd);
}

#[test]
fn validation_serializes_to_json() {
    let report = validate("ROUND()");
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["errors"][0]["code"], "INVALID_ARGUMENT_COUNT");
    assert_eq!(json["errors"][0]["position"], 0);
}

#[test]
fn standard_registry_holds_every_builtin() {
    let registry = FunctionRegistry::standard();
    for name in BUILTIN_FUNCTIONS {
        assert!(registry.contains(name), "{name} is missing");
    }
    assert_eq!(registry.names().len(), BUILTIN_FUNCTIONS.len());
    assert!(registry.is_aggregation("avg"));
    assert!(!registry.is_aggregation("ROUND"));
    assert_eq!(registry.get("if").map(|f| f.category), Some(FunctionCategory::Conditional));
}

fn double(args: &[Value], span: Span) -> EvalResult<Value> {
    match args.first() {
        Some(Value::Number(n)) => Ok(Value::Number(n * 2.0)),
        _ => Err(computed_props::ExpressionError::type_mismatch("DOUBLE expects a number", span)),
    }
}

fn shout(args: &[Value], _span: Span) -> EvalResult<Value> {
    Ok(Value::String(format!("{}!", args.first().map(ToString::to_string).unwrap_or_default())))
}

#[test]
fn custom_functions_can_be_registered_and_replaced() {
    let mut registry = FunctionRegistry::with_builtins();
    let previous = registry.register(FunctionDefinition::new("double",
                                                             Arity::Exact(1),
                                                             ValueType::Number,
                                                             FunctionCategory::Math,
                                                             double));
    assert!(previous.is_none());
    let replaced = registry.register(FunctionDefinition::new("UPPER",
                                                             Arity::Exact(1),
                                                             ValueType::String,
                                                             FunctionCategory::String,
                                                             shout));
    assert!(replaced.is_some());

    let properties = HashMap::from([("price".to_string(), Value::from(21))]);
    let context = Context::new(properties).with_registry(&registry);
    let eval = |src: &str| context.eval(&parse(src).unwrap());

    assert_eq!(eval("Double(#price)").unwrap(), Value::Number(42.0));
    assert_eq!(eval("UPPER('hey')").unwrap(), Value::from("hey!"));
    assert_eq!(eval("DOUBLE(1, 2)").unwrap_err().code, ErrorCode::InvalidArgumentCount);

    assert!(validate_source("DOUBLE(#price)", &registry).is_valid());
    assert!(!validate("DOUBLE(#price)").is_valid());
}

#[test]
fn empty_registry_rejects_builtins() {
    let registry = FunctionRegistry::new();
    let context = Context::new(HashMap::new()).with_registry(&registry);
    let e = context.eval(&parse("SUM(1)").unwrap()).unwrap_err();
    assert_eq!(e.code, ErrorCode::InvalidFunction);
    assert!(e.suggestions.is_empty());
}

#[test]
fn config_loads_from_file() {
    let path = std::env::temp_dir().join(format!("computed-props-{}.toml", std::process::id()));
    fs::write(&path, "max_depth = 12\nmax_suggestions = 1\n").unwrap();

    let config = EngineConfig::load(&path).unwrap();
    fs::remove_file(&path).ok();
    assert_eq!(config,
               EngineConfig { max_depth:       12,
                              max_suggestions: 1, });

    let registry = config.registry();
    let context = Context::new(HashMap::new()).with_config(&config)
                                              .with_registry(&registry);
    let e = context.eval(&parse("MIM(1)").unwrap()).unwrap_err();
    assert!(e.suggestions.len() <= 1);
}

#[test]
fn config_rejects_bad_input() {
    assert!(matches!(EngineConfig::from_toml_str("max_depth = 'deep'"), Err(ConfigError::Parse(_))));
    assert!(matches!(EngineConfig::from_toml_str("colour = 1"), Err(ConfigError::Parse(_))));
    assert!(matches!(EngineConfig::from_toml_str("max_depth = 0"), Err(ConfigError::Invalid(_))));
}
