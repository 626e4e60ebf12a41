use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::iter;
use std::sync::Arc;

use crate::config::Config;
use crate::decoder::{decode_at, decoder_for, upgrade_step, DecodeFn, Decoder, Lift, Unpacking};
use crate::encoder::{encoder_for, EncodeFn, Encoder, Packing, Stamp};
use crate::error::Error;
use crate::hooks::{Pack, PackFn, Unpack, UnpackFn, Upgrade, UpgradeFn};
use crate::mapping::{compute_mappings, Directives};
use crate::schema::{Schema, VersionInfo};
use crate::shape::{FieldMapping, Layout, Shape, Unversioned, VersionShape};

/// Table of live types and their version histories.
///
/// Types are registered once, usually at startup, through
/// [`register`](Self::register). Registration needs `&mut Registry`, so it
/// always completes before the registry is shared with [`Encoder`]s and
/// [`Decoder`]s, which only read it.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use vjson::{Registry, Shape};
///
/// #[derive(Shape, Debug, Default, PartialEq)]
/// struct Post {
///     author: String,
///     likes: u64,
/// }
///
/// #[derive(Shape, Default, Serialize, Deserialize)]
/// struct PostV1 {
///     author: String,
///     number_of_likes: u64,
/// }
///
/// #[derive(Shape, Default, Serialize, Deserialize)]
/// struct PostV2 {
///     author: String,
///     #[vjson(from = "number_of_likes")]
///     likes: u64,
/// }
///
/// let mut registry = Registry::new();
/// registry
///     .register::<Post>()
///     .version::<PostV1>()
///     .version::<PostV2>()
///     .finish()
///     .unwrap();
///
/// let post: Post = registry
///     .decoder()
///     .from_str(r#"{"author":"Dolores","number_of_likes":99}"#)
///     .unwrap();
/// assert_eq!(post, Post { author: "Dolores".into(), likes: 99 });
///
/// let out = registry.encoder().marshal_to_string(&post).unwrap();
/// assert_eq!(out, r#"{"Version":2,"author":"Dolores","likes":99}"#);
/// ```
pub struct Registry {
    config: Config,
    entries: HashMap<TypeId, Entry>,
}

struct Entry {
    schema: Schema,
    /// A `Codec<L>` for the live type the entry is keyed by.
    codec: Box<dyn Any + Send + Sync>,
}

/// Compiled encode and decode paths of one live type.
pub(crate) struct Codec<L> {
    pub latest_version: u32,
    pub encode: EncodeFn<L>,
    /// `decoders[k - 1]` reads data written at version `k`.
    pub decoders: Vec<DecodeFn<L>>,
}

impl Registry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty registry with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    /// The registry configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start registering the version history of live type `L`.
    ///
    /// Nothing is stored until [`Registration::finish`] succeeds.
    pub fn register<L: Shape>(&mut self) -> Registration<'_, L, Unversioned> {
        Registration {
            registry: self,
            versions: Vec::new(),
            last_layout: Layout::of::<Unversioned>(),
            lifts: Vec::new(),
            pack: None,
            unpack: None,
            error: None,
        }
    }

    /// Whether `L` has been registered.
    pub fn is_registered<L: Shape>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<L>())
    }

    /// The latest version of `L`, if registered.
    pub fn latest_version<L: Shape>(&self) -> Option<u32> {
        self.schema::<L>().map(Schema::latest_version)
    }

    /// The registered history of `L`.
    pub fn schema<L: Shape>(&self) -> Option<&Schema> {
        self.entries.get(&TypeId::of::<L>()).map(|e| &e.schema)
    }

    /// Number of registered live types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no type has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every registered type.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// An encoder reading from this registry.
    pub fn encoder(&self) -> Encoder<'_> {
        Encoder::new(self)
    }

    /// A decoder reading from this registry.
    pub fn decoder(&self) -> Decoder<'_> {
        Decoder::new(self)
    }

    pub(crate) fn codec<L: Shape>(&self) -> Result<&Codec<L>, Error> {
        self.entries
            .get(&TypeId::of::<L>())
            .and_then(|e| e.codec.downcast_ref::<Codec<L>>())
            .ok_or(Error::NotRegistered { type_name: L::NAME })
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field(
                "types",
                &self.entries.values().map(|e| &e.schema).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for the version history of live type `L`, currently ending at
/// shape `Last`.
///
/// Versions are numbered 1, 2, ... in the order they are added. Errors are
/// kept until [`finish`](Self::finish), which reports the first one and
/// leaves the registry untouched.
#[must_use = "a registration does nothing until `finish` is called"]
pub struct Registration<'r, L, Last> {
    registry: &'r mut Registry,
    versions: Vec<VersionInfo>,
    last_layout: Layout,
    lifts: Vec<Lift<Last>>,
    pack: Option<PackFn<Last, L>>,
    unpack: Option<UnpackFn<Last, L>>,
    error: Option<Error>,
}

impl<'r, L: Shape, Last: Shape> Registration<'r, L, Last> {
    /// Add the next version shape. Fields are copied from the previous
    /// version by name or by `#[vjson(from = "...")]` directive.
    pub fn version<V: VersionShape>(self) -> Registration<'r, L, V> {
        self.push::<V>(None)
    }

    /// Add the next version shape and run its [`Upgrade`] hook after the
    /// fields of the previous version were copied.
    pub fn version_with_upgrade<V>(self) -> Registration<'r, L, V>
    where
        V: VersionShape + Upgrade<Last>,
    {
        self.push::<V>(Some(<V as Upgrade<Last>>::upgrade as UpgradeFn<V, Last>))
    }

    /// Convert the live value with the latest shape's [`Pack`] hook instead
    /// of copying fields. Only valid on the last version added.
    pub fn with_pack(mut self) -> Self
    where
        Last: Pack<L>,
    {
        self.pack = Some(<Last as Pack<L>>::pack as PackFn<Last, L>);
        self
    }

    /// Convert into the live value with the latest shape's [`Unpack`] hook
    /// instead of copying fields. Only valid on the last version added.
    pub fn with_unpack(mut self) -> Self
    where
        Last: Unpack<L>,
    {
        self.unpack = Some(<Last as Unpack<L>>::unpack as UnpackFn<Last, L>);
        self
    }

    fn push<V: VersionShape>(
        mut self,
        upgrade: Option<UpgradeFn<V, Last>>,
    ) -> Registration<'r, L, V> {
        let version = self.versions.len() as u32 + 1;
        let layout = Layout::of::<V>();

        if self.error.is_none() {
            if self.pack.is_some() || self.unpack.is_some() {
                self.error = Some(Error::invalid(
                    self.last_layout.name,
                    "Pack and Unpack hooks are only allowed on the latest version",
                ));
            } else if version == 1 && upgrade.is_some() {
                self.error = Some(Error::invalid(
                    V::NAME,
                    "the first version cannot declare an Upgrade hook",
                ));
            }
        }

        let mut mappings = Vec::new();
        if version > 1 && self.error.is_none() {
            match compute_mappings(&self.last_layout, &layout, Directives::Honor) {
                Ok(computed) => mappings = computed,
                Err(err) => self.error = Some(err),
            }
        }

        self.versions.push(VersionInfo {
            version,
            shape: V::NAME,
            mappings: mappings.clone(),
            upgrade: upgrade.is_some(),
        });

        let shared: Arc<[FieldMapping]> = mappings.into();
        let lifts = self
            .lifts
            .into_iter()
            .map(|lift| upgrade_step(lift, version, Arc::clone(&shared), upgrade))
            .chain(iter::once(decode_at::<V>()))
            .collect();

        Registration {
            registry: self.registry,
            versions: self.versions,
            last_layout: layout,
            lifts,
            pack: None,
            unpack: None,
            error: self.error,
        }
    }
}

impl<'r, L: Shape, Last: VersionShape> Registration<'r, L, Last> {
    /// Validate and store the history.
    ///
    /// Fails without touching the registry if no version was added, `L` is
    /// already registered, `L` declares the reserved version field, the
    /// latest shape's version field is not a `u32`, a hook was declared on
    /// the wrong version, or two shapes cannot be mapped onto each other.
    pub fn finish(self) -> Result<(), Error> {
        let Registration {
            registry,
            versions,
            last_layout: latest,
            lifts,
            pack,
            unpack,
            error,
        } = self;

        if let Some(err) = error {
            return Err(err);
        }
        if versions.is_empty() {
            return Err(Error::invalid(
                L::NAME,
                "at least one version prototype is required",
            ));
        }

        let type_id = TypeId::of::<L>();
        if registry.entries.contains_key(&type_id) {
            return Err(Error::AlreadyRegistered { type_name: L::NAME });
        }

        let key = registry.config.version_key.as_str();
        let live = Layout::of::<L>();
        if let Some((_, field)) = live.version_field(key) {
            return Err(Error::invalid(
                L::NAME,
                format!("field {} is reserved for the version number", field.name()),
            ));
        }

        let version_field = match latest.version_field(key) {
            Some((index, field)) if field.is::<u32>() => Some((index, field.name())),
            Some((_, field)) => {
                return Err(Error::invalid(
                    latest.name,
                    format!(
                        "version field {} must be a u32, found {}",
                        field.name(),
                        field.type_name()
                    ),
                ));
            }
            None => None,
        };

        let encode_mappings = match pack {
            Some(_) => Vec::new(),
            None => compute_mappings(&live, &latest, Directives::Ignore)?,
        };
        let decode_mappings = match unpack {
            Some(_) => Vec::new(),
            None => compute_mappings(&latest, &live, Directives::Ignore)?,
        };

        let latest_version = versions.len() as u32;
        let stamp = Stamp::new(latest_version, version_field.map(|(index, _)| index), key)?;
        let packing = match pack {
            Some(hook) => Packing::Hook(hook),
            None => Packing::Fields(encode_mappings.clone()),
        };
        let unpacking = Arc::new(match unpack {
            Some(hook) => Unpacking::Hook(hook),
            None => Unpacking::Fields(decode_mappings.clone()),
        });

        let codec = Codec {
            latest_version,
            encode: encoder_for::<L, Last>(packing, stamp),
            decoders: lifts
                .into_iter()
                .map(|lift| decoder_for(lift, Arc::clone(&unpacking)))
                .collect(),
        };
        let schema = Schema {
            live: L::NAME,
            versions,
            encode_mappings,
            decode_mappings,
            pack: pack.is_some(),
            unpack: unpack.is_some(),
            version_field: version_field.map(|(_, name)| name),
        };

        tracing::debug!(
            type_name = L::NAME,
            versions = latest_version,
            latest = latest.name,
            pack = schema.pack,
            unpack = schema.unpack,
            "registered versioned type"
        );
        registry.entries.insert(
            type_id,
            Entry {
                schema,
                codec: Box::new(codec),
            },
        );
        Ok(())
    }
}
