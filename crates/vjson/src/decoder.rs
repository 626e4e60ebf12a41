//! Decoding: detect the version, decode that version's shape, upgrade it
//! step by step to the latest shape, then convert into the live value.

use std::sync::Arc;

use crate::error::Error;
use crate::hooks::{UnpackFn, UpgradeFn};
use crate::registry::Registry;
use crate::shape::{copy_fields, FieldMapping, Shape, VersionShape};
use crate::version::{is_null, peek_version};

/// Decodes bytes written at one version and returns the value upgraded to
/// some later shape `T`.
///
/// A registration starts with one lift per version, each ending at that
/// version's shape. Adding version N+1 wraps every existing lift with the
/// N → N+1 step and adds a plain decode for N+1, so that the lift for
/// version k runs exactly the steps k → k+1 → ... → latest.
pub(crate) type Lift<T> = Box<dyn Fn(&[u8]) -> Result<T, Error> + Send + Sync>;

/// Decodes bytes written at one version all the way into the live value.
pub(crate) type DecodeFn<L> = Box<dyn Fn(&[u8], &mut L) -> Result<(), Error> + Send + Sync>;

/// How the latest shape is turned into the live value.
pub(crate) enum Unpacking<V, L> {
    Hook(UnpackFn<V, L>),
    Fields(Vec<FieldMapping>),
}

/// Decode bytes directly into the shape of one version.
///
/// Shapes without fields are built with `Default`: serde reads a unit struct
/// only from `null`, and the version probe has already checked that the
/// input is an object.
pub(crate) fn decode_at<V: VersionShape>() -> Lift<V> {
    if V::fields().is_empty() {
        return Box::new(|_| Ok(V::default()));
    }
    Box::new(|data| Ok(serde_json::from_slice::<V>(data)?))
}

/// Extend `lift` by one upgrade step into `Next`, which is version `to`.
pub(crate) fn upgrade_step<Previous: Shape, Next: VersionShape>(
    lift: Lift<Previous>,
    to: u32,
    mappings: Arc<[FieldMapping]>,
    hook: Option<UpgradeFn<Next, Previous>>,
) -> Lift<Next> {
    Box::new(move |data| {
        let previous = lift(data)?;

        tracing::trace!(from = Previous::NAME, to = Next::NAME, version = to, "upgrade step");
        let mut next = Next::default();
        copy_fields(&previous, &mut next, &mappings);
        if let Some(upgrade) = hook {
            upgrade(&mut next, &previous).map_err(Error::Hook)?;
        }
        Ok(next)
    })
}

/// Finish `lift` by converting the latest shape into the caller's value.
pub(crate) fn decoder_for<L: Shape, V: Shape>(
    lift: Lift<V>,
    unpacking: Arc<Unpacking<V, L>>,
) -> DecodeFn<L> {
    Box::new(move |data, live| {
        let latest = lift(data)?;
        match &*unpacking {
            Unpacking::Hook(unpack) => unpack(&latest, live).map_err(Error::Hook),
            Unpacking::Fields(mappings) => {
                copy_fields(&latest, live, mappings);
                Ok(())
            }
        }
    })
}

/// Reads versioned JSON into registered live types.
///
/// Borrowing the registry shared makes a `Decoder` cheap to create and safe
/// to use from many threads at once.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'r> {
    registry: &'r Registry,
}

impl<'r> Decoder<'r> {
    /// Create a decoder over `registry`.
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Decode `data` into `value`, upgrading old versions on the way.
    ///
    /// The literal `null` succeeds without touching `value`. On error the
    /// state of `value` is unspecified: fields written before the failure
    /// are not rolled back.
    pub fn unmarshal<L: Shape>(&self, data: &[u8], value: &mut L) -> Result<(), Error> {
        if is_null(data) {
            return Ok(());
        }

        let version = peek_version(data, &self.registry.config().version_key)?;
        let codec = self.registry.codec::<L>()?;
        let decode = usize::try_from(version)
            .ok()
            .and_then(|v| v.checked_sub(1))
            .and_then(|index| codec.decoders.get(index))
            .ok_or(Error::UnsupportedVersion {
                type_name: L::NAME,
                version,
            })?;

        tracing::trace!(
            type_name = L::NAME,
            version,
            latest = codec.latest_version,
            "decoding"
        );
        decode(data, value)
    }

    /// Decode `data` into a fresh default live value.
    pub fn from_slice<L: Shape + Default>(&self, data: &[u8]) -> Result<L, Error> {
        let mut value = L::default();
        self.unmarshal(data, &mut value)?;
        Ok(value)
    }

    /// Decode a JSON string into a fresh default live value.
    pub fn from_str<L: Shape + Default>(&self, data: &str) -> Result<L, Error> {
        self.from_slice(data.as_bytes())
    }
}
