use std::sync::Arc;

use async_trait::async_trait;
use parley_core::{CommandContext, ConvertError, ConvertResult, TypeKey, Value};
use parley_framework::{
    Annotation, ConfigError, ContentParser, ConvertFuture, ConverterFlag, ConverterFn,
    ConverterRegistry, ConverterSetting, EntityConverter, EntityLookup, LookupScope, MentionKind,
    ParameterDetail, ParseError, Signature, SignatureParameter,
};

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: u64,
    name: String,
    nickname: Option<String>,
}

struct Users(Vec<User>);

#[async_trait]
impl EntityLookup for Users {
    type Entity = User;

    async fn by_id(
        &self,
        _ctx: &CommandContext,
        id: u64,
        _scope: LookupScope,
    ) -> ConvertResult<Option<User>> {
        Ok(self.0.iter().find(|user| user.id == id).cloned())
    }

    async fn by_name(
        &self,
        _ctx: &CommandContext,
        name: &str,
        scope: LookupScope,
    ) -> ConvertResult<Option<User>> {
        Ok(self
            .0
            .iter()
            .find(|user| {
                user.name == name || (scope.profile && user.nickname.as_deref() == Some(name))
            })
            .cloned())
    }
}

struct First;
struct Second;
struct Never;

fn never<'a>(_: &'a CommandContext, _: &'a ParameterDetail, _: &'a str) -> ConvertFuture<'a> {
    Box::pin(async { Ok(None) })
}

fn first<'a>(_: &'a CommandContext, _: &'a ParameterDetail, part: &'a str) -> ConvertFuture<'a> {
    Box::pin(async move { Ok(Some(Value::new(format!("first:{part}")))) })
}

fn second<'a>(_: &'a CommandContext, _: &'a ParameterDetail, part: &'a str) -> ConvertFuture<'a> {
    Box::pin(async move { Ok(Some(Value::new(format!("second:{part}")))) })
}

fn failing<'a>(_: &'a CommandContext, _: &'a ParameterDetail, _: &'a str) -> ConvertFuture<'a> {
    Box::pin(async { Err(ConvertError::custom("backend unavailable")) })
}

fn registry() -> ConverterRegistry {
    let mut registry = ConverterRegistry::with_defaults().unwrap();
    registry
        .register(
            EntityConverter::<Users>::build_setting(
                "user",
                Some(MentionKind::User),
                ConverterFlag::USER_DEFAULT,
                ConverterFlag::USER_ALL,
            )
            .unwrap(),
        )
        .unwrap();
    for (name, key, converter) in [
        ("never", TypeKey::of::<Never>(), ConverterFn::part(never)),
        ("first", TypeKey::of::<First>(), ConverterFn::part(first)),
        ("second", TypeKey::of::<Second>(), ConverterFn::part(second)),
        ("failing", TypeKey::of::<()>(), ConverterFn::part(failing)),
    ] {
        registry
            .register(ConverterSetting::builder(name, key, converter).build().unwrap())
            .unwrap();
    }
    registry
}

fn users() -> Arc<Users> {
    Arc::new(Users(vec![
        User {
            id: 123456789,
            name: "ada".to_string(),
            nickname: Some("countess".to_string()),
        },
        User {
            id: 987654321,
            name: "grace".to_string(),
            nickname: None,
        },
    ]))
}

fn context(content: &str) -> CommandContext {
    CommandContext::builder(content).service(users()).build()
}

fn single(name: &str, annotation: impl Into<Annotation>) -> Signature {
    Signature::new(name).parameter(SignatureParameter::positional("value").annotation(annotation))
}

// =============================================================================
// Chained resolution
// =============================================================================

#[tokio::test]
async fn test_chained_first_match() {
    let registry = registry();
    let parser = ContentParser::new(
        &registry,
        &single("chain", Annotation::set(["never", "second"])),
    )
    .unwrap();
    let args = parser.parse(&context("x")).await.unwrap();
    assert_eq!(args.get::<String>(0).unwrap(), "second:x");
}

#[tokio::test]
async fn test_chained_declaration_order_wins_ties() {
    let registry = registry();
    for (set, expected) in [
        (["first", "second"], "first:x"),
        (["second", "first"], "second:x"),
    ] {
        let parser = ContentParser::new(&registry, &single("chain", Annotation::set(set))).unwrap();
        let args = parser.parse(&context("x")).await.unwrap();
        assert_eq!(args.get::<String>(0).unwrap(), expected);
    }
}

#[tokio::test]
async fn test_chained_all_fail_is_missing() {
    let registry = registry();
    let parser = ContentParser::new(
        &registry,
        &single("chain", Annotation::set([Annotation::name("never"), Annotation::of::<i64>()])),
    )
    .unwrap();
    let err = parser.parse(&context("x")).await.unwrap_err();
    assert!(matches!(err, ParseError::MissingArgument { .. }));
}

#[test]
fn test_chained_injection_is_rejected() {
    let registry = registry();
    let err = ContentParser::new(
        &registry,
        &single(
            "chain",
            Annotation::set([Annotation::of::<String>(), Annotation::name("ctx")]),
        ),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::ChainedInjection { .. }));
}

#[tokio::test]
async fn test_converter_error_aborts() {
    let registry = registry();
    let parser = ContentParser::new(
        &registry,
        &Signature::new("broken")
            .parameter(SignatureParameter::positional("a").annotation("failing"))
            .parameter(SignatureParameter::positional("b").annotation(Annotation::of::<i64>())),
    )
    .unwrap();
    let err = parser.parse(&context("x 1")).await.unwrap_err();
    match err {
        ParseError::Converter { parameter, source } => {
            assert_eq!(parameter, "a");
            assert!(matches!(source, ConvertError::Custom(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// =============================================================================
// Entity converters
// =============================================================================

#[tokio::test]
async fn test_entity_by_mention_id_and_name() {
    let registry = registry();
    let parser = ContentParser::new(
        &registry,
        &Signature::new("hug")
            .parameter(SignatureParameter::positional("ctx"))
            .parameter(SignatureParameter::var_positional("users").annotation(Annotation::of::<User>())),
    )
    .unwrap();

    let args = parser
        .parse(&context("<@!123456789> 987654321 ada nobody grace"))
        .await
        .unwrap();
    let users = args.get_from::<User>(1).unwrap();
    let names: Vec<&str> = users.iter().map(|user| user.name.as_str()).collect();
    assert_eq!(names, vec!["ada", "grace", "ada"]);
}

#[tokio::test]
async fn test_entity_flags_restrict_strategies() {
    let registry = registry();
    let parser = ContentParser::new(
        &registry,
        &Signature::new("whois").parameter(
            SignatureParameter::positional("user")
                .annotation(Annotation::of::<User>())
                .flags(ConverterFlag::ID),
        ),
    )
    .unwrap();

    assert!(parser.parse(&context("123456789")).await.is_ok());
    assert!(matches!(
        parser.parse(&context("ada")).await,
        Err(ParseError::MissingArgument { .. })
    ));
    assert!(parser.parse(&context("<@123456789>")).await.is_err());
}

#[tokio::test]
async fn test_entity_profile_scope() {
    let registry = registry();
    let plain = ContentParser::new(&registry, &single("whois", Annotation::of::<User>())).unwrap();
    let with_profile = ContentParser::new(
        &registry,
        &Signature::new("whois").parameter(
            SignatureParameter::positional("value")
                .annotation(Annotation::of::<User>())
                .flags(ConverterFlag::NAME | ConverterFlag::PROFILE),
        ),
    )
    .unwrap();

    assert!(plain.parse(&context("countess")).await.is_err());
    let args = with_profile.parse(&context("countess")).await.unwrap();
    assert_eq!(args.get::<User>(0).unwrap().id, 123456789);
}

#[tokio::test]
async fn test_entity_lookup_service_missing() {
    let registry = registry();
    let parser = ContentParser::new(&registry, &single("whois", Annotation::of::<User>())).unwrap();
    let err = parser
        .parse(&CommandContext::new("ada"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ParseError::Converter {
            source: ConvertError::ServiceNotFound(_),
            ..
        }
    ));
}

// =============================================================================
// Configuration invariants
// =============================================================================

#[test]
fn test_flag_intersection_invariant() {
    let registry = registry();
    let settings: Vec<_> = registry.settings().cloned().collect();

    for setting in settings {
        let annotation = Annotation::name(setting.name());
        for bits in 0..=ConverterFlag::all().bits() {
            let requested = ConverterFlag::from_bits_truncate(bits);
            let signature = Signature::new("flags").parameter(
                SignatureParameter::positional("value")
                    .annotation(annotation.clone())
                    .flags(requested),
            );
            let result = ContentParser::new(&registry, &signature);
            if requested.intersects(setting.all_flags()) {
                let parser = result.unwrap();
                let detail = &parser.parameters()[0].details()[0];
                assert_eq!(detail.flags(), requested & setting.all_flags());
            } else {
                assert!(
                    matches!(result, Err(ConfigError::DisjointFlags { .. })),
                    "{} accepted {requested:?}",
                    setting.name()
                );
            }
        }
    }
}

#[test]
fn test_unknown_annotation_fails_at_compile_time() {
    let registry = registry();
    assert!(matches!(
        ContentParser::new(&registry, &single("x", "snowflake")),
        Err(ConfigError::NoConverterForName(_))
    ));
    assert!(matches!(
        ContentParser::new(&registry, &single("x", Annotation::of::<u128>())),
        Err(ConfigError::NoConverterForType(_))
    ));
}

// =============================================================================
// End to end
// =============================================================================

#[tokio::test]
async fn test_quoted_arguments() {
    let registry = registry();
    let parser = ContentParser::new(
        &registry,
        &Signature::new("remind")
            .parameter(SignatureParameter::positional("after").annotation(Annotation::of::<std::time::Duration>()))
            .parameter(SignatureParameter::positional("text").annotation(Annotation::of::<String>()))
            .parameter(SignatureParameter::keyword_only("loud").annotation(Annotation::of::<bool>()).default(false)),
    )
    .unwrap();

    let ctx = CommandContext::builder(r#"!remind 1h30m "stretch your legs" loud: yes"#)
        .content_offset(7)
        .build();
    let args = parser.parse(&ctx).await.unwrap();
    assert_eq!(
        args.get::<std::time::Duration>(0).unwrap(),
        std::time::Duration::from_secs(5_400)
    );
    assert_eq!(args.get::<String>(1).unwrap(), "stretch your legs");
    assert!(args.get_keyword::<bool>("loud").unwrap());
}

#[tokio::test]
async fn test_parsers_are_independent_per_invocation() {
    let registry = registry();
    let parser = ContentParser::new(
        &registry,
        &Signature::new("sum").parameter(SignatureParameter::var_positional("n").annotation(Annotation::of::<i64>())),
    )
    .unwrap();

    let first = CommandContext::new("1 2 3");
    let second = CommandContext::new("4");
    let (a, b) = futures::join!(parser.parse(&first), parser.parse(&second));
    assert_eq!(a.unwrap().get_from::<i64>(0).unwrap(), vec![1, 2, 3]);
    assert_eq!(b.unwrap().get_from::<i64>(0).unwrap(), vec![4]);
}
