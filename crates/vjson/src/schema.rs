use crate::shape::FieldMapping;

/// Description of a registered version history.
///
/// Returned by [`Registry::schema`](crate::Registry::schema); useful for
/// diagnostics and for asserting in tests how fields are carried forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Name of the live type.
    pub live: &'static str,
    /// Registered versions, oldest first. `versions[k - 1]` is version `k`.
    pub versions: Vec<VersionInfo>,
    /// Field copies from the live type into the latest shape. Empty when
    /// the latest shape packs itself.
    pub encode_mappings: Vec<FieldMapping>,
    /// Field copies from the latest shape into the live type. Empty when
    /// the latest shape unpacks itself.
    pub decode_mappings: Vec<FieldMapping>,
    /// Whether the latest shape declared a `Pack` hook.
    pub pack: bool,
    /// Whether the latest shape declared an `Unpack` hook.
    pub unpack: bool,
    /// Field of the latest shape that receives the version number, if any.
    pub version_field: Option<&'static str>,
}

impl Schema {
    /// The latest registered version number.
    pub fn latest_version(&self) -> u32 {
        self.versions.len() as u32
    }

    /// Information about version `version`, if registered.
    pub fn version(&self, version: u32) -> Option<&VersionInfo> {
        let index = usize::try_from(version).ok()?.checked_sub(1)?;
        self.versions.get(index)
    }
}

/// One registered version shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Version number, starting at 1.
    pub version: u32,
    /// Name of the version shape.
    pub shape: &'static str,
    /// Field copies from the previous version. Empty for version 1.
    pub mappings: Vec<FieldMapping>,
    /// Whether the shape declared an `Upgrade` hook.
    pub upgrade: bool,
}
