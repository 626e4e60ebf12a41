//! Example: renaming a field without breaking old posts.

use serde::{Deserialize, Serialize};
use vjson::{Registry, Shape};

#[derive(Shape, Debug, Default)]
struct Post {
    author: String,
    text: String,
    likes: u64,
}

#[derive(Shape, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PostV1 {
    author: String,
    text: String,
    number_of_likes: u64,
}

#[derive(Shape, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PostV2 {
    author: String,
    text: String,
    #[vjson(from = "number_of_likes")]
    likes: u64,
}

fn main() -> Result<(), vjson::Error> {
    let mut registry = Registry::new();
    registry
        .register::<Post>()
        .version::<PostV1>()
        .version::<PostV2>()
        .finish()?;

    let old_input = r#"{ "Author": "Dolores", "Text": "Lorem ipsum dolor sit amet...", "NumberOfLikes": 99 }"#;
    let new_input = r#"{ "Version": 2, "Author": "Dolores", "Text": "Lorem ipsum dolor sit amet...", "Likes": 99 }"#;

    let decoder = registry.decoder();
    let old_post: Post = decoder.from_str(old_input)?;
    let new_post: Post = decoder.from_str(new_input)?;

    println!("Post: {old_post:?}");
    println!("Post: {new_post:?}");

    if let Some(schema) = registry.schema::<Post>() {
        for version in &schema.versions {
            println!(
                "v{} {}: {} copied field(s)",
                version.version,
                version.shape,
                version.mappings.len()
            );
        }
    }
    Ok(())
}
