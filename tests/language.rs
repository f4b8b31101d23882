use std::{
    collections::HashMap,
    fs,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use computed_props::{
    ErrorCode, EntityId, ExpressionError, PropertyMap, Value,
    ast::Span,
    config::EngineConfig,
    evaluate_simple,
    interpreter::{
        evaluator::{
            core::Context,
            function::core::{Arity, FunctionCategory, FunctionDefinition, FunctionRegistry},
            resolver::{AsyncEntityResolver, EntityResolver},
        },
        parser::core::{MAX_HEIGHT, MAX_NESTING},
        value::{core::ValueType, json::property_map_from_json},
    },
    parse,
};
use serde_json::json;
use uuid::Uuid;
use walkdir::WalkDir;

fn fixture() -> PropertyMap {
    property_map_from_json(&json!({
        "price": 10,
        "quantity": 3,
        "name": "Widget",
        "discount": null,
        "active": true,
        "created": "2024-01-15",
        "tags": ["a", "b"],
        "lines": [{ "amount": 1 }, { "amount": 2 }],
        "customer": { "name": "Acme", "address": { "city": "Oslo" } },
        "orders": [
            { "items": [{ "qty": 1 }, { "qty": 2 }] },
            { "items": [{ "qty": 3 }] }
        ]
    })).unwrap()
}

fn eval(src: &str) -> Result<Value, ExpressionError> {
    evaluate_simple(src, fixture())
}

fn assert_value(src: &str, expected: Value) {
    match eval(src) {
        Ok(value) => assert_eq!(value, expected, "`{src}`"),
        Err(e) => panic!("`{src}` failed:\n{}", e.format_with_source(src)),
    }
}

fn assert_error(src: &str, code: ErrorCode) -> ExpressionError {
    match eval(src) {
        Ok(value) => panic!("`{src}` evaluated to {value} but was expected to fail with {code}"),
        Err(e) => {
            assert_eq!(e.code, code, "`{src}`:\n{}", e.format_with_source(src));
            e
        },
    }
}

#[test]
fn case_files_pass() {
    let mut count = 0;

    for entry in
        WalkDir::new("tests/cases").into_iter()
                                   .filter_map(Result::ok)
                                   .filter(|e| e.path().extension().is_some_and(|ext| ext == "cases"))
    {
        let path = entry.path();
        let content =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));

        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            let Some((src, expected)) = line.rsplit_once(" => ") else {
                panic!("{path:?}:{}: missing ` => `", i + 1);
            };
            count += 1;

            let actual = eval(src);
            if let Some(code) = expected.strip_prefix('!') {
                match actual {
                    Err(e) => assert_eq!(e.code.as_str(),
                                         code,
                                         "{path:?}:{}: `{src}`\n{}",
                                         i + 1,
                                         e.format_with_source(src)),
                    Ok(value) => panic!("{path:?}:{}: `{src}` evaluated to {value}, expected {code}",
                                        i + 1),
                }
            } else {
                let expected = eval(expected).unwrap_or_else(|e| {
                                                 panic!("{path:?}:{}: bad expected side: {e}", i + 1)
                                             });
                match actual {
                    Ok(value) => assert_eq!(value, expected, "{path:?}:{}: `{src}`", i + 1),
                    Err(e) => panic!("{path:?}:{}: `{src}` failed:\n{}",
                                     i + 1,
                                     e.format_with_source(src)),
                }
            }
        }
    }

    assert!(count > 0, "No cases found in tests/cases");
}

#[test]
fn printing_round_trips() {
    for src in ["#price * #quantity",
                "-(1 + 2) * 3",
                "(#a || #b) && !#c",
                "SUM(@self.lines[*].amount) / COUNT(#lines[*])",
                "IF(#price > 5, 'high', \"low\")",
                "@{6ba7b810-9dad-11d1-80b4-00c04fd430c8}.customer.address[0].city",
                "1 - (2 - 3)",
                "\"quote \\\" and \\\\ backslash\""]
    {
        let first = parse(src).unwrap();
        let printed = first.to_string();
        let second = parse(&printed).unwrap_or_else(|e| panic!("reparsing `{printed}`: {e}"));
        assert!(first.body.structurally_eq(&second.body),
                "`{src}` printed as `{printed}`, which parses differently");
        assert_eq!(printed, second.to_string());
    }
}

#[test]
fn shorthand_and_self_path_are_the_same_reference() {
    let short = parse("#lines[0].amount").unwrap();
    let long = parse("@self.lines[0].amount").unwrap();
    assert!(short.body.structurally_eq(&long.body));
}

#[test]
fn precedence_and_associativity() {
    assert_value("1 + 2 * 3 - 4", Value::Number(3.0));
    assert_value("2 * 3 % 4", Value::Number(2.0));
    assert_value("8 / 4 / 2", Value::Number(1.0));
    assert_value("1 < 2 && 3 < 4 || false", Value::Bool(true));
    assert_value("-2 * -2", Value::Number(4.0));
    assert_value("!false && false", Value::Bool(false));
}

#[test]
fn logical_operators_short_circuit() {
    assert_value("false && #does_not_exist", Value::Bool(false));
    assert_value("true || SUMM(1)", Value::Bool(true));
    assert_error("true && #does_not_exist", ErrorCode::PropertyNotFound);
}

#[test]
fn unknown_property_suggests_close_names() {
    let e = assert_error("#prise * #quantity", ErrorCode::PropertyNotFound);
    assert_eq!(e.suggestions.first().map(String::as_str), Some("price"));
    assert_eq!(e.span().map(|span| (span.start, span.end)), Some((0, 6)));
}

#[test]
fn unknown_function_suggests_builtins() {
    let e = assert_error("SUMM(#price)", ErrorCode::InvalidFunction);
    assert!(e.suggestions.contains(&"SUM".to_string()), "{:?}", e.suggestions);
}

#[test]
fn bare_identifier_suggests_shorthand() {
    let e = assert_error("price + 1", ErrorCode::UnknownIdentifier);
    assert_eq!(e.suggestions, vec!["#price".to_string()]);
}

#[test]
fn collection_outside_aggregation_suggests_wrapping() {
    let e = assert_error("#lines[*].amount + 1", ErrorCode::CollectionWithoutAggregation);
    assert_eq!(e.suggestions, vec!["SUM(@self.lines[*].amount)".to_string()]);
}

#[test]
fn errors_render_with_source() {
    let src = "#price / (#quantity - 3)";
    let e = assert_error(src, ErrorCode::DivisionByZero);
    let rendered = e.format_with_source(src);
    assert!(rendered.starts_with("error[DIVISION_BY_ZERO]: Division by zero"), "{rendered}");
    assert!(rendered.contains("1 | #price / (#quantity - 3)"), "{rendered}");
    assert!(rendered.contains('^'), "{rendered}");

    let e = parse("1 +\n  * 2").unwrap_err();
    let rendered = e.format_with_source("1 +\n  * 2");
    assert!(rendered.contains("--> 2:3"), "{rendered}");
}

#[test]
fn parse_errors_carry_positions() {
    let e = parse("SUM(1, 2").unwrap_err();
    assert_eq!(e.code, ErrorCode::UnexpectedEnd);
    assert_eq!(e.position, Some(8));
    assert!(e.is_parse_error());

    let e = parse("#a + $").unwrap_err();
    assert_eq!(e.code, ErrorCode::UnexpectedToken);
    assert_eq!((e.position, e.end_position), (Some(5), Some(6)));
}

#[test]
fn error_json_uses_camel_case_and_omits_empty_fields() {
    let e = assert_error("#prise", ErrorCode::PropertyNotFound);
    let json = e.to_json();
    assert_eq!(json["code"], "PROPERTY_NOT_FOUND");
    assert_eq!(json["position"], 0);
    assert_eq!(json["endPosition"], 6);
    assert_eq!(json["suggestions"][0], "price");
    assert!(json.get("chain").is_none());
}

const ORDER: EntityId = Uuid::from_u128(0x6ba7_b810_9dad_11d1_80b4_00c0_4fd4_30c8);
const CUSTOMER: EntityId = Uuid::from_u128(0x1);

fn entities() -> HashMap<EntityId, PropertyMap> {
    HashMap::from([(ORDER,
                    property_map_from_json(&json!({
                        "total": 120,
                        "customer": { "$entity": CUSTOMER.to_string() }
                    })).unwrap()),
                   (CUSTOMER,
                    property_map_from_json(&json!({ "name": "Acme", "tier": "gold" })).unwrap())])
}

#[test]
fn entity_references_go_through_the_resolver() {
    let entities = entities();
    let context = Context::new(PropertyMap::new()).with_resolver(&entities);

    let eval = |src: &str| context.eval(&parse(src).unwrap());

    assert_eq!(eval(&format!("@{{{ORDER}}}.total * 2")).unwrap(), Value::Number(240.0));
    assert_eq!(eval(&format!("@{{{ORDER}}}.customer.name")).unwrap(), Value::from("Acme"));

    let e = eval(&format!("@{{{ORDER}}}.customer.teir")).unwrap_err();
    assert_eq!(e.code, ErrorCode::PropertyNotFound);
    assert!(e.suggestions.contains(&"tier".to_string()));

    let e = eval(&format!("@{{{ORDER}}}.custmer.name")).unwrap_err();
    assert_eq!(e.code, ErrorCode::RelationshipNotFound);
    assert_eq!(e.suggestions, vec!["customer".to_string()]);

    let e = eval(&format!("@{{{}}}.total", Uuid::from_u128(0x2))).unwrap_err();
    assert_eq!(e.code, ErrorCode::EntityNotFound);
}

#[test]
fn self_properties_fall_back_to_the_resolver() {
    let entities = entities();
    let properties = HashMap::from([("rate".to_string(), Value::from(0.5))]);
    let context = Context::new(properties).with_self_id(ORDER)
                                          .with_resolver(&entities);

    let value = context.eval(&parse("#total * #rate").unwrap()).unwrap();
    assert_eq!(value, Value::Number(60.0));

    let e = context.eval(&parse("#totl").unwrap()).unwrap_err();
    assert_eq!(e.code, ErrorCode::PropertyNotFound);
    assert!(e.suggestions.contains(&"total".to_string()));
}

/// Answers every lookup by evaluating `@{entity}.<property> + 1` again, so
/// evaluation never bottoms out on its own.
struct SelfReferencing;

impl EntityResolver for SelfReferencing {
    fn resolve(&self, entity: EntityId, property: &str, depth: usize) -> Result<Option<Value>, ExpressionError> {
        let expression = parse(&format!("@{{{entity}}}.{property} + 1"))?;
        Context::new(PropertyMap::new()).with_resolver(self)
                                        .with_depth(depth)
                                        .eval(&expression)
                                        .map(Some)
    }
}

#[test]
fn self_referential_resolution_hits_max_depth() {
    let expression = parse(&format!("@{{{ORDER}}}.total")).unwrap();
    let e = Context::new(PropertyMap::new()).with_resolver(&SelfReferencing)
                                            .eval(&expression)
                                            .unwrap_err();
    assert_eq!(e.code, ErrorCode::MaxDepthExceeded);
}

/// Computed properties of one entity, each evaluated on demand with the hop
/// depth it was asked at.
struct Formulas {
    entity:   EntityId,
    formulas: HashMap<&'static str, String>,
    config:   EngineConfig,
}

impl Formulas {
    /// `a` reads `b`, which reads `c`, which is a constant: three hops from
    /// an outside reference to `a`.
    fn chain(max_depth: usize) -> Self {
        let entity = Uuid::from_u128(0x5);
        Self { entity,
               formulas: HashMap::from([("a", format!("@{{{entity}}}.b + 1")),
                                        ("b", format!("@{{{entity}}}.c + 1")),
                                        ("c", "1".to_string())]),
               config: EngineConfig { max_depth,
                                      ..EngineConfig::default() } }
    }
}

impl EntityResolver for Formulas {
    fn resolve(&self, entity: EntityId, property: &str, depth: usize) -> Result<Option<Value>, ExpressionError> {
        if entity != self.entity {
            return Err(ExpressionError::entity_not_found(entity));
        }
        let Some(source) = self.formulas.get(property) else {
            return Ok(None);
        };
        Context::new(PropertyMap::new()).with_config(&self.config)
                                        .with_resolver(self)
                                        .with_depth(depth)
                                        .eval(&parse(source)?)
                                        .map(Some)
    }
}

#[test]
fn max_depth_counts_resolver_hops() {
    let formulas = Formulas::chain(3);
    let expression = parse(&format!("@{{{}}}.a", formulas.entity)).unwrap();
    let context = Context::new(PropertyMap::new()).with_config(&formulas.config)
                                                  .with_resolver(&formulas);
    assert_eq!(context.eval(&expression).unwrap(), Value::Number(3.0));

    let formulas = Formulas::chain(2);
    let context = Context::new(PropertyMap::new()).with_config(&formulas.config)
                                                  .with_resolver(&formulas);
    let e = context.eval(&expression).unwrap_err();
    assert_eq!(e.code, ErrorCode::MaxDepthExceeded);
}

#[test]
fn long_operator_chains_are_not_limited_by_max_depth() {
    let src = vec!["1"; 200].join(" + ");
    assert_eq!(evaluate_simple(&src, PropertyMap::new()).unwrap(), Value::Number(200.0));

    let config = EngineConfig { max_depth: 1,
                                ..EngineConfig::default() };
    let context = Context::new(fixture()).with_config(&config);
    let expression = parse("-(#price * (1 + (2 * (3 - #quantity))))").unwrap();
    assert_eq!(context.eval(&expression).unwrap(), Value::Number(-10.0));
}

#[test]
fn parser_rejects_deep_nesting() {
    let n = 10_000;
    let sources = [format!("{}1{}", "(".repeat(n), ")".repeat(n)),
                   format!("{}true", "!".repeat(n)),
                   format!("{}1", "- ".repeat(n)),
                   format!("{}1{}", "ABS(".repeat(n), ")".repeat(n))];
    for src in &sources {
        let e = parse(src).unwrap_err();
        assert_eq!(e.code, ErrorCode::MaxDepthExceeded, "{}", e.message);
        assert!(e.position.is_some());
    }

    let e = parse(&sources[0]).unwrap_err();
    assert_eq!(e.position, Some(MAX_NESTING + 1));

    let at_limit = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
    assert_eq!(evaluate_simple(&at_limit, PropertyMap::new()).unwrap(), Value::Number(1.0));
}

#[test]
fn parser_rejects_overly_tall_trees() {
    let src = vec!["1"; MAX_HEIGHT + 1].join(" + ");
    let e = parse(&src).unwrap_err();
    assert_eq!(e.code, ErrorCode::MaxDepthExceeded);
    assert_eq!(e.span(), Some(Span::new(0, src.len())));

    let src = vec!["1"; MAX_HEIGHT].join(" + ");
    assert!(parse(&src).is_ok());
}

/// Serves [`entities`] asynchronously and counts the lookups it answers.
#[derive(Default)]
struct RemoteStore {
    entities: HashMap<EntityId, PropertyMap>,
    lookups:  AtomicUsize,
}

impl RemoteStore {
    fn new() -> Self {
        Self { entities: entities(),
               ..Self::default() }
    }
}

#[async_trait]
impl AsyncEntityResolver for RemoteStore {
    async fn resolve(&self,
                     entity: EntityId,
                     property: &str,
                     depth: usize)
                     -> Result<Option<Value>, ExpressionError> {
        tokio::task::yield_now().await;
        self.lookups.fetch_add(1, Ordering::SeqCst);
        EntityResolver::resolve(&self.entities, entity, property, depth)
    }

    async fn property_names(&self, entity: EntityId) -> Vec<String> {
        EntityResolver::property_names(&self.entities, entity)
    }
}

async fn eval_remote(context: &Context<'_>, store: &RemoteStore, src: &str) -> Result<Value, ExpressionError> {
    context.eval_async(&parse(src).unwrap(), store).await
}

#[tokio::test]
async fn async_resolver_answers_references_and_links() {
    let properties = HashMap::from([("rate".to_string(), Value::from(0.5))]);
    let context = Context::new(properties).with_self_id(ORDER);
    let store = RemoteStore::new();

    let value = eval_remote(&context, &store, &format!("@{{{ORDER}}}.total * #rate")).await;
    assert_eq!(value.unwrap(), Value::Number(60.0));
    let value = eval_remote(&context, &store, "#total * #rate").await;
    assert_eq!(value.unwrap(), Value::Number(60.0));

    store.lookups.store(0, Ordering::SeqCst);
    let value = eval_remote(&context, &store, &format!("@{{{ORDER}}}.customer.name")).await;
    assert_eq!(value.unwrap(), Value::from("Acme"));
    assert_eq!(store.lookups.load(Ordering::SeqCst), 2);

    let e = eval_remote(&context, &store, &format!("@{{{ORDER}}}.customer.teir")).await
                                                                                  .unwrap_err();
    assert_eq!(e.code, ErrorCode::PropertyNotFound);
    assert!(e.suggestions.contains(&"tier".to_string()));

    let e = eval_remote(&context, &store, &format!("@{{{ORDER}}}.custmer.name")).await
                                                                                .unwrap_err();
    assert_eq!(e.code, ErrorCode::RelationshipNotFound);

    let src = format!("@{{{}}}.total", Uuid::from_u128(0x2));
    let e = eval_remote(&context, &store, &src).await.unwrap_err();
    assert_eq!(e.code, ErrorCode::EntityNotFound);
    assert!(e.position.is_some());
}

#[tokio::test]
async fn async_and_sync_evaluation_agree() {
    let entities = entities();
    let sync = Context::new(PropertyMap::new()).with_resolver(&entities);
    let detached = Context::new(PropertyMap::new());

    for src in [format!("@{{{ORDER}}}.total / 4 + 1"),
                format!("UPPER(@{{{ORDER}}}.customer.tier)"),
                format!("IF(@{{{ORDER}}}.total > 100, @{{{ORDER}}}.customer.name, 'small')"),
                format!("@{{{ORDER}}}.customer.name.first")]
    {
        let expression = parse(&src).unwrap();
        assert_eq!(detached.eval_async(&expression, &entities).await,
                   sync.eval(&expression),
                   "`{src}`");
    }
}

/// `FIELD(entity, name)` reads a property of a linked entity.
fn field(args: &[Value], context: &Context<'_>, span: Span) -> Result<Value, ExpressionError> {
    match args {
        [Value::Entity(id), Value::String(name)] => context.read_property(*id, name, span),
        _ => Err(ExpressionError::type_mismatch("FIELD expects an entity and a name", span)),
    }
}

#[tokio::test]
async fn reading_functions_go_through_the_async_resolver() {
    let mut registry = FunctionRegistry::with_builtins();
    registry.register(FunctionDefinition::reading("FIELD",
                                                  Arity::Exact(2),
                                                  ValueType::Any,
                                                  FunctionCategory::Conditional,
                                                  field));
    let context = Context::new(PropertyMap::new()).with_registry(&registry);
    let store = RemoteStore::new();

    let expression = parse(&format!("FIELD(@{{{ORDER}}}.customer, 'tier')")).unwrap();
    assert_eq!(context.eval_async(&expression, &store).await.unwrap(), Value::from("gold"));

    let expression = parse(&format!("FIELD(@{{{ORDER}}}.customer, 'teir')")).unwrap();
    let e = context.eval_async(&expression, &store).await.unwrap_err();
    assert_eq!(e.code, ErrorCode::PropertyNotFound);

    let e = registry.invoke("FIELD", &[Value::Entity(CUSTOMER), Value::from("tier")], Span::default())
                    .unwrap_err();
    assert_eq!(e.code, ErrorCode::EntityNotFound);
}

/// The async counterpart of [`SelfReferencing`].
struct AsyncSelfReferencing;

#[async_trait]
impl AsyncEntityResolver for AsyncSelfReferencing {
    async fn resolve(&self,
                     entity: EntityId,
                     property: &str,
                     depth: usize)
                     -> Result<Option<Value>, ExpressionError> {
        let expression = parse(&format!("@{{{entity}}}.{property} + 1"))?;
        Context::new(PropertyMap::new()).with_depth(depth)
                                        .eval_async(&expression, self)
                                        .await
                                        .map(Some)
    }
}

#[tokio::test]
async fn async_self_referential_resolution_hits_max_depth() {
    let expression = parse(&format!("@{{{ORDER}}}.total")).unwrap();
    let e = Context::new(PropertyMap::new()).eval_async(&expression, &AsyncSelfReferencing)
                                            .await
                                            .unwrap_err();
    assert_eq!(e.code, ErrorCode::MaxDepthExceeded);
}

#[test]
fn values_and_contexts_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Value>();
    assert_send_sync::<computed_props::Expression>();
    assert_send_sync::<Context<'static>>();
    assert_send_sync::<ExpressionError>();

    let expression = parse("SUM(#lines[*].amount) * #price").unwrap();
    let context = Context::new(fixture());
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| assert_eq!(context.eval(&expression).unwrap(), Value::Number(30.0)));
        }
    });
}
