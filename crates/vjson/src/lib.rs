//! # vjson
//!
//! Versioned JSON for Rust structs.
//!
//! The application works with one "live" struct. Separately, every layout
//! that struct ever had on disk is kept as its own *version shape*. Data is
//! always written as the latest shape with a `"Version"` key; when older data
//! is read, it is decoded into the shape it was written with and upgraded one
//! version at a time until it reaches the latest shape.
//!
//! ## How It Works
//!
//! 1. `#[derive(Shape)]` lists a struct's fields at compile time.
//! 2. [`Registry::register`] records the version shapes of a live type and
//!    compiles which fields are copied between adjacent versions. Mistakes
//!    (mismatched field types, hooks on the wrong version) are reported here.
//! 3. [`Encoder::marshal`] converts the live value into the latest shape and
//!    stamps the version number.
//! 4. [`Decoder::unmarshal`] reads the version number, decodes that version,
//!    runs every upgrade step up to the latest version and converts the
//!    result into the live value.
//!
//! ## Key Concepts
//!
//! - **Linear chain**: upgrades run v1→v2→v3→...→latest, never skipping steps.
//! - **Field copies**: fields with the same name and type are carried over;
//!   `#[vjson(from = "old")]` renames, `#[vjson(skip)]` opts out.
//! - **Hooks**: [`Upgrade`] finishes a step, [`Pack`] / [`Unpack`] replace
//!   field copying between the live type and the latest shape.
//! - **Missing version**: data without a `"Version"` key is version 1.
//!
//! ## Quick Start
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use vjson::{HookError, Registry, Shape, Upgrade};
//!
//! #[derive(Shape, Debug, Default, PartialEq)]
//! struct User {
//!     id: String,
//!     user_name: String,
//!     display_name: String,
//! }
//!
//! #[derive(Shape, Default, Serialize, Deserialize)]
//! struct UserV1 {
//!     id: i64,
//!     name: String,
//! }
//!
//! #[derive(Shape, Default, Serialize, Deserialize)]
//! struct UserV2 {
//!     id: i64,
//!     #[vjson(from = "name")]
//!     user_name: String,
//!     #[vjson(from = "name")]
//!     display_name: String,
//! }
//!
//! #[derive(Shape, Default, Serialize, Deserialize)]
//! struct UserV3 {
//!     #[vjson(skip)]
//!     id: String,
//!     user_name: String,
//!     display_name: String,
//! }
//!
//! impl Upgrade<UserV2> for UserV3 {
//!     fn upgrade(&mut self, previous: &UserV2) -> Result<(), HookError> {
//!         self.id = format!("{:04x}", previous.id);
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry
//!     .register::<User>()
//!     .version::<UserV1>()
//!     .version::<UserV2>()
//!     .version_with_upgrade::<UserV3>()
//!     .finish()
//!     .unwrap();
//!
//! let user: User = vjson::from_str(&registry, r#"{"id":42,"name":"dale_cooper"}"#).unwrap();
//! assert_eq!(user.id, "002a");
//! assert_eq!(user.display_name, "dale_cooper");
//!
//! let out = vjson::to_string(&registry, &user).unwrap();
//! assert_eq!(
//!     out,
//!     r#"{"Version":3,"id":"002a","user_name":"dale_cooper","display_name":"dale_cooper"}"#
//! );
//! ```

// Lets `#[derive(Shape)]` refer to `::vjson` inside this crate's own tests.
extern crate self as vjson;

mod config;
mod decoder;
mod encoder;
mod error;
mod hooks;
mod mapping;
mod registry;
mod schema;
mod shape;
mod version;

pub use config::Config;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{Error, FieldMismatch, Result};
pub use hooks::{HookError, Pack, Unpack, Upgrade};
pub use registry::{Registration, Registry};
pub use schema::{Schema, VersionInfo};
pub use shape::{Field, FieldMapping, Shape, Source, Unversioned, VersionShape};
pub use version::{peek_version, IMPLICIT_VERSION, VERSION_KEY};

// Re-export the derive when the `macros` feature is enabled.
#[cfg(feature = "macros")]
pub use vjson_macros::Shape;

/// Encode `value` as the latest registered version of its type.
pub fn to_vec<L: Shape>(registry: &Registry, value: &L) -> Result<Vec<u8>> {
    registry.encoder().marshal(value)
}

/// Encode `value` as a JSON string.
pub fn to_string<L: Shape>(registry: &Registry, value: &L) -> Result<String> {
    registry.encoder().marshal_to_string(value)
}

/// Decode versioned JSON bytes into a new live value.
pub fn from_slice<L: Shape + Default>(registry: &Registry, data: &[u8]) -> Result<L> {
    registry.decoder().from_slice(data)
}

/// Decode a versioned JSON string into a new live value.
pub fn from_str<L: Shape + Default>(registry: &Registry, data: &str) -> Result<L> {
    registry.decoder().from_str(data)
}
