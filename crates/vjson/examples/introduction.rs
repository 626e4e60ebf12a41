//! Example: a user record whose layout changed twice.
//!
//! Run with `RUST_LOG=vjson=trace` to see each upgrade step.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use vjson::{HookError, Registry, Shape, Upgrade};

/// The struct used by the rest of the application.
#[derive(Shape, Debug, Default)]
struct User {
    id: String,           // in hex
    user_name: String,    // for @mentions
    display_name: String, // might contain spaces
}

#[derive(Shape, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserV1 {
    #[serde(rename = "ID")]
    id: i64,
    name: String,
}

// Splits the name; both new fields start from the old one.
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

// Stores the ID as a string. The type changed, so the ID is not copied
// and the upgrade hook converts it instead.
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

fn main() -> Result<(), vjson::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut registry = Registry::new();
    registry
        .register::<User>()
        .version::<UserV1>()
        .version::<UserV2>()
        .version_with_upgrade::<UserV3>()
        .finish()?;

    // A missing version key implies version 1.
    let input = r#"{ "ID": 42, "Name": "dale_cooper" }"#;

    let user: User = vjson::from_str(&registry, input)?;
    let output = vjson::to_string(&registry, &user)?;

    println!("User: {user:?}");
    println!("Output: {output}");
    Ok(())
}
