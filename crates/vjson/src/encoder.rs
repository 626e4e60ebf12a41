//! Encoding: convert the live value into the latest shape, stamp the
//! version, serialize.

use serde::ser::Error as _;

use crate::error::Error;
use crate::hooks::PackFn;
use crate::registry::Registry;
use crate::shape::{copy_fields, FieldMapping, Shape, VersionShape};

/// Encodes a live value as its latest version.
pub(crate) type EncodeFn<L> = Box<dyn Fn(&L) -> Result<Vec<u8>, Error> + Send + Sync>;

/// How the live value is turned into the latest shape.
pub(crate) enum Packing<V, L> {
    Hook(PackFn<V, L>),
    Fields(Vec<FieldMapping>),
}

/// How the version number gets into the output.
pub(crate) enum Stamp {
    /// Write the number into this field of the latest shape.
    Field { index: usize, version: u32 },
    /// Splice `{"<key>":<version>` in front of the serialized object.
    Splice { prefix: Vec<u8> },
}

impl Stamp {
    pub fn new(version: u32, field: Option<usize>, key: &str) -> Result<Self, Error> {
        Ok(match field {
            Some(index) => Self::Field { index, version },
            None => {
                let prefix = format!("{{{}:{}", serde_json::to_string(key)?, version);
                Self::Splice {
                    prefix: prefix.into_bytes(),
                }
            }
        })
    }
}

pub(crate) fn encoder_for<L: Shape, V: VersionShape>(
    packing: Packing<V, L>,
    stamp: Stamp,
) -> EncodeFn<L> {
    Box::new(move |live| {
        let mut latest = V::default();
        match &packing {
            Packing::Hook(pack) => pack(&mut latest, live).map_err(Error::Hook)?,
            Packing::Fields(mappings) => copy_fields(live, &mut latest, mappings),
        }

        match &stamp {
            Stamp::Field { index, version } => {
                let stamped = latest.set_field(*index, version);
                debug_assert!(stamped, "version field type was checked at registration");
                Ok(serde_json::to_vec(&latest)?)
            }
            Stamp::Splice { prefix } => splice::<V>(prefix, serde_json::to_vec(&latest)?),
        }
    })
}

fn splice<V: Shape>(prefix: &[u8], body: Vec<u8>) -> Result<Vec<u8>, Error> {
    // Unit structs serialize as `null`.
    let empty = body == b"{}" || (body == b"null" && V::fields().is_empty());
    match body.as_slice() {
        _ if empty => {
            let mut out = Vec::with_capacity(prefix.len() + 1);
            out.extend_from_slice(prefix);
            out.push(b'}');
            Ok(out)
        }
        [b'{', rest @ ..] => {
            let mut out = Vec::with_capacity(prefix.len() + body.len());
            out.extend_from_slice(prefix);
            out.push(b',');
            out.extend_from_slice(rest);
            Ok(out)
        }
        _ => Err(Error::Codec(serde_json::Error::custom(format!(
            "{} must serialize to a JSON object",
            V::NAME
        )))),
    }
}

/// Writes registered live types as versioned JSON.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'r> {
    registry: &'r Registry,
}

impl<'r> Encoder<'r> {
    /// Create an encoder over `registry`.
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Encode `value` as the latest registered version of its type.
    pub fn marshal<L: Shape>(&self, value: &L) -> Result<Vec<u8>, Error> {
        let codec = self.registry.codec::<L>()?;
        tracing::trace!(type_name = L::NAME, version = codec.latest_version, "encoding");
        (codec.encode)(value)
    }

    /// Like [`marshal`](Self::marshal), but `None` encodes as `null`
    /// without consulting the registry.
    pub fn marshal_option<L: Shape>(&self, value: Option<&L>) -> Result<Vec<u8>, Error> {
        match value {
            Some(value) => self.marshal(value),
            None => Ok(b"null".to_vec()),
        }
    }

    /// Encode `value` into a JSON string.
    pub fn marshal_to_string<L: Shape>(&self, value: &L) -> Result<String, Error> {
        let bytes = self.marshal(value)?;
        String::from_utf8(bytes).map_err(|e| Error::Codec(serde_json::Error::custom(e)))
    }
}
