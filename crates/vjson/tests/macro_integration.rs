//! Integration tests for the derive macro and the full upgrade pipeline.
//!
//! Tests the complete flow: define version shapes with `#[derive(Shape)]`,
//! register them, decode data written at old versions and check that it is
//! upgraded to the live type, then encode it back at the latest version.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use vjson::{Error, FieldMismatch, HookError, Pack, Registry, Shape, Source, Unpack, Upgrade};

// ── Shape definitions ────────────────────────────────────────────────

#[derive(Shape, Debug, Default, PartialEq)]
struct Multiple {
    b: String,
    c: String,
    d: String,
}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MultipleV1 {
    a: String,
    b: String,
}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MultipleV2 {
    a: String,
    b: String,
    c: String,
}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MultipleV3 {
    b: String,
    c: String,
    d: String,
}

#[derive(Shape, Debug, Default, PartialEq)]
struct Renaming {
    x: String,
    y: String,
}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RenamingV1 {
    a: String,
    b: String,
}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RenamingV2 {
    #[vjson(from = "a")]
    x: String,
    y: String,
}

#[derive(Shape, Debug, Default, PartialEq)]
struct Upgraded {
    ba: String,
}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpgradedV1 {
    a: String,
}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpgradedV2 {
    ba: String,
}

impl Upgrade<UpgradedV1> for UpgradedV2 {
    fn upgrade(&mut self, previous: &UpgradedV1) -> Result<(), HookError> {
        self.ba = format!("b{}", previous.a);
        Ok(())
    }
}

#[derive(Shape, Debug, Default, PartialEq)]
struct Failing {
    ba: String,
}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FailingV1 {
    a: String,
}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FailingV2 {
    ba: String,
}

impl Upgrade<FailingV1> for FailingV2 {
    fn upgrade(&mut self, _previous: &FailingV1) -> Result<(), HookError> {
        Err("upgrade error".into())
    }
}

#[derive(Shape, Debug, Default, PartialEq)]
struct Converted {
    message: String,
}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertedV1 {
    message: i64,
}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertedV2 {
    #[vjson(from = "")]
    message: String,
}

impl Upgrade<ConvertedV1> for ConvertedV2 {
    fn upgrade(&mut self, previous: &ConvertedV1) -> Result<(), HookError> {
        self.message = previous.message.to_string();
        Ok(())
    }
}

#[derive(Shape, Debug, Default, PartialEq)]
struct Raw {
    message: String,
}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawV1 {
    message: serde_json::Value,
}

impl Pack<Raw> for RawV1 {
    fn pack(&mut self, live: &Raw) -> Result<(), HookError> {
        self.message = serde_json::to_value(&live.message)?;
        Ok(())
    }
}

impl Unpack<Raw> for RawV1 {
    fn unpack(&self, live: &mut Raw) -> Result<(), HookError> {
        live.message = serde_json::from_value(self.message.clone())?;
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
struct TestError;

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("test error")
    }
}

impl std::error::Error for TestError {}

#[derive(Shape, Debug, Default, PartialEq)]
struct RawError {
    message: String,
}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawErrorV1 {
    message: serde_json::Value,
}

impl Pack<RawError> for RawErrorV1 {
    fn pack(&mut self, _live: &RawError) -> Result<(), HookError> {
        Err(Box::new(TestError))
    }
}

impl Unpack<RawError> for RawErrorV1 {
    fn unpack(&self, _live: &mut RawError) -> Result<(), HookError> {
        Err(Box::new(TestError))
    }
}

#[derive(Shape, Debug, Default, PartialEq)]
struct Empty {}

#[derive(Shape, Debug, Default, Serialize, Deserialize)]
struct EmptyV1 {}

// ── Derive ───────────────────────────────────────────────────────────

#[test]
fn derive_lists_fields_with_directives() {
    assert_eq!(RenamingV2::NAME, "RenamingV2");

    let fields = RenamingV2::fields();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name(), "x");
    assert_eq!(fields[0].source(), Source::Renamed("a"));
    assert_eq!(fields[1].source(), Source::Same);
    assert!(fields[1].is::<String>());

    let fields = ConvertedV2::fields();
    assert_eq!(fields[0].source(), Source::Skip);
}

#[test]
fn derive_gives_index_access() {
    let mut value = Multiple::default();
    assert!(value.set_field(2, &String::from("d")));
    assert_eq!(value.d, "d");

    let field = value.field(2).and_then(|f| f.downcast_ref::<String>());
    assert_eq!(field.map(String::as_str), Some("d"));
    assert!(value.field(3).is_none());
}

#[test]
fn derive_empty_struct() {
    assert!(Empty::fields().is_empty());
    assert!(Empty::default().field(0).is_none());
}

// ── Decoding ─────────────────────────────────────────────────────────

#[test]
fn multiple_versions_upgrade_in_order() {
    let mut registry = Registry::new();
    registry
        .register::<Multiple>()
        .version::<MultipleV1>()
        .version::<MultipleV2>()
        .version::<MultipleV3>()
        .finish()
        .unwrap();

    let value: Multiple =
        vjson::from_str(&registry, r#"{"Version":2,"A":"a","B":"b","C":"c"}"#).unwrap();
    assert_eq!(
        value,
        Multiple {
            b: "b".into(),
            c: "c".into(),
            d: String::new(),
        }
    );

    let value: Multiple = vjson::from_str(&registry, r#"{"A":"a","B":"b"}"#).unwrap();
    assert_eq!(value.b, "b");
    assert_eq!(value.c, "");
}

#[test]
fn renaming_directive() {
    let mut registry = Registry::new();
    registry
        .register::<Renaming>()
        .version::<RenamingV1>()
        .version::<RenamingV2>()
        .finish()
        .unwrap();

    let value: Renaming =
        vjson::from_str(&registry, r#"{"Version":1,"A":"x","B":"b"}"#).unwrap();
    assert_eq!(
        value,
        Renaming {
            x: "x".into(),
            y: String::new(),
        }
    );
}

#[test]
fn upgrade_hook_runs_after_copy() {
    let mut registry = Registry::new();
    registry
        .register::<Upgraded>()
        .version::<UpgradedV1>()
        .version_with_upgrade::<UpgradedV2>()
        .finish()
        .unwrap();

    let value: Upgraded = vjson::from_str(&registry, r#"{"Version":1,"A":"a"}"#).unwrap();
    assert_eq!(value.ba, "ba");

    let schema = registry.schema::<Upgraded>().unwrap();
    assert!(schema.version(2).unwrap().upgrade);
    assert!(!schema.version(1).unwrap().upgrade);
}

#[test]
fn upgrade_hook_error_passes_through() {
    let mut registry = Registry::new();
    registry
        .register::<Failing>()
        .version::<FailingV1>()
        .version_with_upgrade::<FailingV2>()
        .finish()
        .unwrap();

    let err = vjson::from_str::<Failing>(&registry, r#"{"Version":1,"A":"a"}"#).unwrap_err();
    assert_eq!(err.to_string(), "upgrade error");
    assert!(err.hook_error().is_some());
}

#[test]
fn skip_directive_allows_type_conversion() {
    let mut registry = Registry::new();
    registry
        .register::<Converted>()
        .version::<ConvertedV1>()
        .version_with_upgrade::<ConvertedV2>()
        .finish()
        .unwrap();

    let value: Converted = vjson::from_str(&registry, r#"{"Version":1,"Message":42}"#).unwrap();
    assert_eq!(value.message, "42");
}

#[test]
fn null_leaves_value_untouched() {
    let mut registry = Registry::new();
    registry
        .register::<Raw>()
        .version::<RawV1>()
        .with_pack()
        .with_unpack()
        .finish()
        .unwrap();

    let mut value = Raw {
        message: "kept".into(),
    };
    registry.decoder().unmarshal(b" null ", &mut value).unwrap();
    assert_eq!(value.message, "kept");
}

#[test]
fn negative_and_unsupported_versions() {
    let mut registry = Registry::new();
    registry
        .register::<Renaming>()
        .version::<RenamingV1>()
        .finish()
        .unwrap();

    let err = vjson::from_str::<Renaming>(&registry, r#"{"Version":-1,"A":"a"}"#).unwrap_err();
    assert!(matches!(err, Error::NegativeVersion(-1)));
    assert!(err.to_string().contains("negative"), "{err}");

    let err = vjson::from_str::<Renaming>(&registry, r#"{"Version":100,"A":"a"}"#).unwrap_err();
    assert!(matches!(err, Error::UnsupportedVersion { version: 100, .. }));
    assert!(err.to_string().contains("unsupported"), "{err}");
}

#[test]
fn unregistered_type() {
    let registry = Registry::new();

    let err = vjson::from_str::<Renaming>(&registry, r#"{"Version":1,"X":"x"}"#).unwrap_err();
    assert!(err.to_string().contains("registered"), "{err}");

    let err = vjson::to_vec(&registry, &Renaming::default()).unwrap_err();
    assert!(matches!(err, Error::NotRegistered { type_name: "Renaming" }));
}

#[test]
fn latest_version_skips_upgrade_hooks() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Shape, Debug, Default, PartialEq)]
    struct Counted {
        n: u64,
    }

    #[derive(Shape, Default, Serialize, Deserialize)]
    struct CountedV1 {
        n: u64,
    }

    #[derive(Shape, Default, Serialize, Deserialize)]
    struct CountedV2 {
        n: u64,
    }

    impl Upgrade<CountedV1> for CountedV2 {
        fn upgrade(&mut self, _previous: &CountedV1) -> Result<(), HookError> {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let mut registry = Registry::new();
    registry
        .register::<Counted>()
        .version::<CountedV1>()
        .version_with_upgrade::<CountedV2>()
        .finish()
        .unwrap();

    let out = vjson::to_string(&registry, &Counted { n: 7 }).unwrap();
    assert_eq!(out, r#"{"Version":2,"n":7}"#);
    let back: Counted = vjson::from_str(&registry, &out).unwrap();
    assert_eq!(back, Counted { n: 7 });
    assert_eq!(CALLS.load(Ordering::SeqCst), 0);

    let old: Counted = vjson::from_str(&registry, r#"{"n":3}"#).unwrap();
    assert_eq!(old.n, 3);
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

// ── Encoding ─────────────────────────────────────────────────────────

#[test]
fn empty_struct_encodes_version_only() {
    let mut registry = Registry::new();
    registry.register::<Empty>().version::<EmptyV1>().finish().unwrap();

    assert_eq!(vjson::to_string(&registry, &Empty {}).unwrap(), r#"{"Version":1}"#);
    let _: Empty = vjson::from_str(&registry, r#"{"Version":1}"#).unwrap();
}

#[test]
fn unit_struct_shapes_use_objects() {
    #[derive(Shape, Debug, Default, PartialEq)]
    struct Unit;

    #[derive(Shape, Debug, Default, Serialize, Deserialize)]
    struct UnitV1;

    let mut registry = Registry::new();
    registry.register::<Unit>().version::<UnitV1>().finish().unwrap();

    assert_eq!(vjson::to_string(&registry, &Unit).unwrap(), r#"{"Version":1}"#);
    assert_eq!(vjson::from_str::<Unit>(&registry, r#"{"Version":1}"#).unwrap(), Unit);
    assert_eq!(vjson::from_str::<Unit>(&registry, "{}").unwrap(), Unit);

    let err = vjson::from_str::<Unit>(&registry, "[]").unwrap_err();
    assert!(matches!(err, Error::Codec(_)));
}

#[test]
fn pack_and_unpack_hooks() {
    let mut registry = Registry::new();
    registry
        .register::<Raw>()
        .version::<RawV1>()
        .with_pack()
        .with_unpack()
        .finish()
        .unwrap();

    let out = vjson::to_string(
        &registry,
        &Raw {
            message: "hello".into(),
        },
    )
    .unwrap();
    assert!(out.contains(r#""Version":1"#), "{out}");
    assert!(out.contains(r#""Message":"hello""#), "{out}");

    let value: Raw = vjson::from_str(&registry, r#"{"Version":1,"Message":"hello"}"#).unwrap();
    assert_eq!(value.message, "hello");
}

#[test]
fn pack_and_unpack_errors_are_not_wrapped() {
    let mut registry = Registry::new();
    registry
        .register::<RawError>()
        .version::<RawErrorV1>()
        .with_pack()
        .with_unpack()
        .finish()
        .unwrap();

    let err = vjson::to_vec(&registry, &RawError::default()).unwrap_err();
    assert_eq!(
        err.hook_error().and_then(|e| e.downcast_ref::<TestError>()),
        Some(&TestError)
    );

    let err = vjson::from_str::<RawError>(&registry, r#"{"Version":1,"Message":"hello"}"#)
        .unwrap_err();
    assert_eq!(err.to_string(), "test error");
    assert!(err.hook_error().and_then(|e| e.downcast_ref::<TestError>()).is_some());
}

#[test]
fn marshal_none_is_null() {
    let mut registry = Registry::new();
    registry.register::<Empty>().version::<EmptyV1>().finish().unwrap();

    let out = registry.encoder().marshal_option::<Empty>(None).unwrap();
    assert_eq!(out, b"null");
}

// ── Registration errors ──────────────────────────────────────────────

#[test]
fn type_mismatch_with_live_type() {
    #[derive(Shape, Default)]
    struct Live {
        message: String,
    }

    #[derive(Shape, Default, Serialize, Deserialize)]
    struct LiveV1 {
        message: i64,
    }

    let mut registry = Registry::new();
    let err = registry.register::<Live>().version::<LiveV1>().finish().unwrap_err();
    assert!(err.to_string().contains("field message has different types"), "{err}");
}

#[test]
fn type_mismatch_between_versions() {
    #[derive(Shape, Default)]
    struct Live {
        message: String,
    }

    #[derive(Shape, Default, Serialize, Deserialize)]
    struct LiveV1 {
        message: i64,
    }

    #[derive(Shape, Default, Serialize, Deserialize)]
    struct LiveV2 {
        message: String,
    }

    let mut registry = Registry::new();
    let err = registry
        .register::<Live>()
        .version::<LiveV1>()
        .version::<LiveV2>()
        .finish()
        .unwrap_err();
    assert!(err.to_string().contains("field message has different types"), "{err}");
}

#[test]
fn type_mismatch_through_rename() {
    #[derive(Shape, Default)]
    struct Live {
        message: String,
    }

    #[derive(Shape, Default, Serialize, Deserialize)]
    struct LiveV1 {
        old_message: i64,
    }

    #[derive(Shape, Default, Serialize, Deserialize)]
    struct LiveV2 {
        #[vjson(from = "old_message")]
        message: String,
    }

    let mut registry = Registry::new();
    let err = registry
        .register::<Live>()
        .version::<LiveV1>()
        .version::<LiveV2>()
        .finish()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::FieldTypeMismatch(FieldMismatch::Renamed { .. })
    ));
    let message = err.to_string();
    assert!(message.contains("cannot copy field"), "{message}");
    assert!(message.contains("different types"), "{message}");
}

// ── Full pipeline ────────────────────────────────────────────────────

#[derive(Shape, Debug, Default, Clone, PartialEq)]
struct User {
    id: String,
    user_name: String,
    display_name: String,
}

#[derive(Shape, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserV1 {
    #[serde(rename = "ID")]
    id: i64,
    name: String,
}

#[derive(Shape, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserV2 {
    #[serde(rename = "ID")]
    id: i64,
    #[vjson(from = "name")]
    user_name: String,
    #[vjson(from = "name")]
    display_name: String,
}

#[derive(Shape, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserV3 {
    #[vjson(skip)]
    #[serde(rename = "ID")]
    id: String,
    user_name: String,
    display_name: String,
}

impl Upgrade<UserV2> for UserV3 {
    fn upgrade(&mut self, previous: &UserV2) -> Result<(), HookError> {
        self.id = format!("{:04x}", previous.id);
        Ok(())
    }
}

fn user_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register::<User>()
        .version::<UserV1>()
        .version::<UserV2>()
        .version_with_upgrade::<UserV3>()
        .finish()
        .unwrap();
    registry
}

#[test]
fn old_data_is_rewritten_at_latest_version() {
    let registry = user_registry();

    let user: User = vjson::from_str(&registry, r#"{"ID":42,"Name":"dale_cooper"}"#).unwrap();
    assert_eq!(
        user,
        User {
            id: "002a".into(),
            user_name: "dale_cooper".into(),
            display_name: "dale_cooper".into(),
        }
    );

    let out = vjson::to_string(&registry, &user).unwrap();
    assert_eq!(
        out,
        r#"{"Version":3,"ID":"002a","UserName":"dale_cooper","DisplayName":"dale_cooper"}"#
    );

    let again: User = vjson::from_str(&registry, &out).unwrap();
    assert_eq!(again, user);
}

#[test]
fn concurrent_decoding() {
    let registry = user_registry();

    std::thread::scope(|scope| {
        for n in 0..8i64 {
            let registry = &registry;
            scope.spawn(move || {
                let data = format!(
                    r#"{{"Version":2,"ID":{n},"UserName":"u{n}","DisplayName":"d"}}"#
                );
                let user: User = vjson::from_str(registry, &data).unwrap();
                assert_eq!(user.id, format!("{n:04x}"));
                assert_eq!(user.user_name, format!("u{n}"));
            });
        }
    });
}
