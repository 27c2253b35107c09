//! Resolution behavior over the shape fixtures.
//!
//! 1. Literal tags resolve to their declared type
//! 2. Missing discriminator resolves against the "default" sentinel
//! 3. Unknown discriminator fails with the value that was read
//! 4. Predicate rules detect shapes without a type field
//! 5. First match wins across literal and predicate rules
//! 6. Misconfigured predicates surface their own error kinds
//! 7. A built resolver is shared across threads without locking

use polyjson_resolver::{
    resolve, ConcreteType, PredicateRegistry, PredicateSignature, RawObject, ResolutionError,
    Resolver, RuleSet, RuleSetDecl, SupertypeId,
};
use serde_json::{json, Value};

// ──────────────────────────────────────────────
// Test fixtures
// ──────────────────────────────────────────────

const SHAPE: SupertypeId = SupertypeId::from_static("Shape");
const CIRCLE: ConcreteType = ConcreteType::from_static("Circle");
const SQUARE: ConcreteType = ConcreteType::from_static("Square");

fn object(value: Value) -> RawObject {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be an object, got {}", other),
    }
}

/// Rules keyed on the "type" field.
fn by_alias() -> RuleSet {
    RuleSet::builder(SHAPE)
        .literal("circle", CIRCLE)
        .literal("square", SQUARE)
        .build()
}

/// Predicates that detect the shape from the fields it carries.
fn detectors() -> PredicateRegistry {
    let mut predicates = PredicateRegistry::new();
    predicates
        .register(&SHAPE, "hasRadius", |o| o.contains_key("radius"))
        .register(&SHAPE, "hasSide", |o| o.contains_key("side"));
    predicates
}

fn by_detector() -> RuleSet {
    RuleSet::builder(SHAPE)
        .alias("{hasRadius}", CIRCLE)
        .alias("{hasSide}", SQUARE)
        .build()
}

// ──────────────────────────────────────────────
// Literal rules
// ──────────────────────────────────────────────

#[test]
fn circle_tag_resolves_to_circle() {
    let got = resolve(
        &object(json!({"type": "circle", "radius": 5.0})),
        &SHAPE,
        &by_alias(),
        &PredicateRegistry::new(),
    );
    assert_eq!(got, Ok(CIRCLE));
}

#[test]
fn tag_position_in_object_does_not_matter() {
    let got = resolve(
        &object(json!({"side": 2.0, "type": "square"})),
        &SHAPE,
        &by_alias(),
        &PredicateRegistry::new(),
    );
    assert_eq!(got, Ok(SQUARE));
}

#[test]
fn missing_type_field_fails_with_default() {
    let err = resolve(
        &object(json!({"radius": 5.0})),
        &SHAPE,
        &by_alias(),
        &PredicateRegistry::new(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        ResolutionError::UnknownDiscriminator {
            supertype: "Shape".to_string(),
            value: "default".to_string(),
        }
    );
    assert_eq!(err.to_string(), "unknown Shape type 'default'");
}

#[test]
fn unknown_type_field_fails_with_value() {
    let err = resolve(
        &object(json!({"type": "cube", "side": 13.0})),
        &SHAPE,
        &by_alias(),
        &PredicateRegistry::new(),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "unknown Shape type 'cube'");
}

// ──────────────────────────────────────────────
// Predicate rules
// ──────────────────────────────────────────────

#[test]
fn predicates_detect_shapes() {
    let rules = by_detector();
    let predicates = detectors();

    let circle = resolve(&object(json!({"radius": 5.0})), &SHAPE, &rules, &predicates);
    let square = resolve(&object(json!({"side": 2.0})), &SHAPE, &rules, &predicates);
    assert_eq!(circle, Ok(CIRCLE));
    assert_eq!(square, Ok(SQUARE));
}

#[test]
fn undetected_shape_fails_with_default() {
    let err = resolve(
        &object(json!({"sides": 3})),
        &SHAPE,
        &by_detector(),
        &detectors(),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "unknown Shape type 'default'");
}

#[test]
fn first_matching_rule_wins() {
    let both = object(json!({"radius": 1.0, "side": 1.0}));
    let predicates = detectors();

    let circle_first = by_detector();
    let square_first = RuleSet::builder(SHAPE)
        .predicate("hasSide", SQUARE)
        .predicate("hasRadius", CIRCLE)
        .build();

    assert_eq!(resolve(&both, &SHAPE, &circle_first, &predicates), Ok(CIRCLE));
    assert_eq!(resolve(&both, &SHAPE, &square_first, &predicates), Ok(SQUARE));
}

#[test]
fn catch_all_predicate_placed_last() {
    let mut predicates = detectors();
    predicates.register(&SHAPE, "anything", |_| true);
    let rules = RuleSet::builder(SHAPE)
        .literal("square", SQUARE)
        .predicate("anything", CIRCLE)
        .build();

    let tagged = object(json!({"type": "square"}));
    let untagged = object(json!({"type": "blob"}));
    assert_eq!(resolve(&tagged, &SHAPE, &rules, &predicates), Ok(SQUARE));
    assert_eq!(resolve(&untagged, &SHAPE, &rules, &predicates), Ok(CIRCLE));
}

#[test]
fn misconfigured_predicates_have_distinct_errors() {
    let mut predicates = PredicateRegistry::new();
    predicates.register_optional(&SHAPE, "undecided", |_| None);
    predicates.register_fallible(&SHAPE, "broken", |_| Err::<bool, _>("no shape table"));

    let run = |name: &str| {
        let rules = RuleSet::builder(SHAPE).predicate(name, CIRCLE).build();
        resolve(&RawObject::new(), &SHAPE, &rules, &predicates).unwrap_err()
    };

    assert!(matches!(run("nowhere"), ResolutionError::PredicateNotFound { .. }));
    assert!(matches!(run("undecided"), ResolutionError::PredicateReturnedNull { .. }));
    assert_eq!(
        run("broken").to_string(),
        "can't invoke predicate 'broken': no shape table"
    );

    let signature = PredicateSignature {
        receiver: polyjson_resolver::Receiver::Instance,
        returns: polyjson_resolver::ReturnKind::Bool,
    };
    let not_static = predicates
        .register_erased(&SHAPE, "isLarge", &signature, |_| Ok::<_, String>(json!(true)))
        .map(|_| ())
        .unwrap_err();
    assert_eq!(not_static.to_string(), "predicate 'isLarge' is not static");
}

// ──────────────────────────────────────────────
// Declared rule sets and sharing
// ──────────────────────────────────────────────

#[test]
fn declared_rule_set_with_custom_field() {
    let decl: RuleSetDecl = serde_json::from_value(json!({
        "supertype": "Shape",
        "field_name": "@type",
        "rules": [
            {"alias": "circle", "target": "Circle"},
            {"alias": "square", "target": "Square"}
        ]
    }))
    .unwrap();
    let resolver = Resolver::new(decl.into(), PredicateRegistry::new());

    assert_eq!(
        resolver.resolve(&object(json!({"@type": "square", "side": 2.0}))),
        Ok(SQUARE)
    );
    assert_eq!(
        resolver
            .resolve(&object(json!({"type": "square"})))
            .unwrap_err()
            .to_string(),
        "unknown Shape type 'default'"
    );
}

#[test]
fn resolver_is_shared_across_threads() {
    let resolver = Resolver::new(
        RuleSet::builder(SHAPE)
            .literal("square", SQUARE)
            .predicate("hasRadius", CIRCLE)
            .build(),
        detectors(),
    );

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let resolver = &resolver;
                scope.spawn(move || {
                    let obj = if i % 2 == 0 {
                        object(json!({"radius": i}))
                    } else {
                        object(json!({"type": "square", "side": i}))
                    };
                    resolver.resolve(&obj)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let expected = if i % 2 == 0 { CIRCLE } else { SQUARE };
            assert_eq!(handle.join().unwrap(), Ok(expected));
        }
    });
}
