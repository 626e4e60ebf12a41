//! Static field metadata for live types and version shapes.

use std::any::{type_name, Any, TypeId};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A struct whose top-level fields can be listed and copied by index.
///
/// Implemented by `#[derive(Shape)]`; writing it by hand is possible but the
/// three methods must agree on field order. Every field type must be `Clone`,
/// because a mapped field is cloned from the source value into the target.
///
/// ```
/// use vjson::Shape;
///
/// #[derive(Shape, Default)]
/// struct PostV2 {
///     author: String,
///     #[vjson(from = "number_of_likes")]
///     likes: u64,
/// }
///
/// let fields = PostV2::fields();
/// assert_eq!(PostV2::NAME, "PostV2");
/// assert_eq!(fields[1].name(), "likes");
/// assert_eq!(fields[1].source(), vjson::Source::Renamed("number_of_likes"));
/// ```
pub trait Shape: 'static {
    /// Name of the struct, used in error messages.
    const NAME: &'static str;

    /// Top-level fields in declaration order.
    fn fields() -> Vec<Field>;

    /// Borrow the field at `index`.
    fn field(&self, index: usize) -> Option<&dyn Any>;

    /// Overwrite the field at `index` with a clone of `value`.
    ///
    /// Returns `false` if there is no such field or `value` has another type.
    fn set_field(&mut self, index: usize, value: &dyn Any) -> bool;
}

/// A shape that can be stored as one version of a live type's history.
///
/// Version shapes are created empty with `Default` and then filled by
/// decoding, by field copies or by hooks.
pub trait VersionShape: Shape + Default + Serialize + DeserializeOwned {}

impl<T: Shape + Default + Serialize + DeserializeOwned> VersionShape for T {}

/// Where a version shape's field takes its value from during an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// The field with the same name in the previous version.
    Same,
    /// The named field in the previous version (`#[vjson(from = "name")]`).
    Renamed(&'static str),
    /// Nothing; the field keeps its default value (`#[vjson(skip)]`).
    Skip,
}

impl Source {
    /// Interpret a rename directive. An empty name disables copying.
    pub fn from_directive(name: &'static str) -> Self {
        if name.is_empty() {
            Self::Skip
        } else {
            Self::Renamed(name)
        }
    }
}

/// One top-level field of a [`Shape`].
#[derive(Debug, Clone, Copy)]
pub struct Field {
    name: &'static str,
    source: Source,
    type_id: TypeId,
    type_name: &'static str,
}

impl Field {
    /// Describe a field of type `T`.
    pub fn new<T: 'static>(name: &'static str, source: Source) -> Self {
        Self {
            name,
            source,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Field name as declared in Rust.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Rename directive attached to the field.
    pub fn source(&self) -> Source {
        self.source
    }

    /// Declared type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the field is declared with type `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub(crate) fn same_type(&self, other: &Field) -> bool {
        self.type_id == other.type_id
    }
}

/// Copy instruction: clone field `source` of one shape into field `target`
/// of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldMapping {
    /// Index of the field that is read.
    pub source: usize,
    /// Index of the field that is written.
    pub target: usize,
}

/// Name and fields of a shape, collected once per registration.
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    pub name: &'static str,
    pub fields: Vec<Field>,
}

impl Layout {
    pub fn of<T: Shape>() -> Self {
        Self {
            name: T::NAME,
            fields: T::fields(),
        }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// The field that holds the version number, if any.
    pub fn version_field(&self, key: &str) -> Option<(usize, &Field)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| is_version_key(f.name, key))
    }
}

/// `version` and `Version` both name the `"Version"` key, and so does
/// `schema_version` for `"SchemaVersion"`.
pub(crate) fn is_version_key(field: &str, key: &str) -> bool {
    let mut a = field.chars().filter(|c| *c != '_');
    let mut b = key.chars().filter(|c| *c != '_');
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x.eq_ignore_ascii_case(&y) => {}
            _ => return false,
        }
    }
}

pub(crate) fn copy_fields<S: Shape, D: Shape>(src: &S, dst: &mut D, mappings: &[FieldMapping]) {
    for mapping in mappings {
        if let Some(value) = src.field(mapping.source) {
            let copied = dst.set_field(mapping.target, value);
            debug_assert!(
                copied,
                "mapping {} -> {} was validated at registration",
                S::NAME,
                D::NAME
            );
        }
    }
}

/// Placeholder for the previous shape of a registration that has no
/// version yet.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Unversioned;

impl Shape for Unversioned {
    const NAME: &'static str = "(none)";

    fn fields() -> Vec<Field> {
        Vec::new()
    }

    fn field(&self, _index: usize) -> Option<&dyn Any> {
        None
    }

    fn set_field(&mut self, _index: usize, _value: &dyn Any) -> bool {
        false
    }
}
