//! Property tests for encoding and decoding laws that hold for any value.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use vjson::{peek_version, HookError, Registry, Shape, Upgrade, VERSION_KEY};

#[derive(Shape, Debug, Default, Clone, PartialEq)]
struct Note {
    title: String,
    views: u64,
    tags: Vec<String>,
}

#[derive(Shape, Default, Serialize, Deserialize)]
struct NoteV1 {
    name: String,
    views: u64,
}

#[derive(Shape, Default, Serialize, Deserialize)]
struct NoteV2 {
    #[vjson(from = "name")]
    title: String,
    views: u64,
    #[vjson(skip)]
    tags: Vec<String>,
}

impl Upgrade<NoteV1> for NoteV2 {
    fn upgrade(&mut self, previous: &NoteV1) -> Result<(), HookError> {
        if previous.views > 0 {
            self.tags.push("seen".to_string());
        }
        Ok(())
    }
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register::<Note>()
        .version::<NoteV1>()
        .version_with_upgrade::<NoteV2>()
        .finish()
        .unwrap();
    registry
}

fn note() -> impl Strategy<Value = Note> {
    (
        ".*",
        any::<u64>(),
        prop::collection::vec("[a-z]{0,8}", 0..4),
    )
        .prop_map(|(title, views, tags)| Note { title, views, tags })
}

proptest! {
    #[test]
    fn latest_version_round_trips(value in note()) {
        let registry = registry();
        let data = vjson::to_vec(&registry, &value).unwrap();
        let back: Note = vjson::from_slice(&registry, &data).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn output_has_one_version_key(value in note()) {
        let registry = registry();
        let data = vjson::to_vec(&registry, &value).unwrap();
        prop_assert_eq!(peek_version(&data, VERSION_KEY).unwrap(), 2);

        prop_assert!(
            data.starts_with(br#"{"Version":2,"title":"#),
            "unexpected prefix: {:?}",
            String::from_utf8_lossy(&data)
        );
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(&data).unwrap();
        prop_assert_eq!(object.len(), 4);
    }

    #[test]
    fn old_data_is_rewritten_at_latest_version(name in ".*", views in any::<u64>()) {
        let registry = registry();
        let written = serde_json::json!({ "Version": 1, "name": name, "views": views });

        let value: Note = vjson::from_slice(&registry, written.to_string().as_bytes()).unwrap();
        let data = vjson::to_vec(&registry, &value).unwrap();
        prop_assert_eq!(peek_version(&data, VERSION_KEY).unwrap(), 2);

        let back: Note = vjson::from_slice(&registry, &data).unwrap();
        prop_assert_eq!(&back.title, &name);
        prop_assert_eq!(back.views, views);
        prop_assert_eq!(back, value);
    }

    #[test]
    fn missing_version_means_version_one(name in ".*", views in any::<u64>()) {
        let registry = registry();
        let body = serde_json::json!({ "name": name, "views": views });
        let explicit = serde_json::json!({ "Version": 1, "name": name, "views": views });

        let implicit: Note = vjson::from_slice(&registry, body.to_string().as_bytes()).unwrap();
        let stamped: Note = vjson::from_slice(&registry, explicit.to_string().as_bytes()).unwrap();
        prop_assert_eq!(&implicit, &stamped);
        prop_assert_eq!(&implicit.title, &name);
        prop_assert_eq!(implicit.tags.len(), usize::from(views > 0));
    }
}
