use thiserror::Error;

use crate::hooks::HookError;

/// Result type alias using vjson's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by registration, encoding and decoding.
#[derive(Debug, Error)]
pub enum Error {
    /// The live type was never registered.
    #[error("vjson: type not registered: {type_name}")]
    NotRegistered { type_name: &'static str },

    /// The live type was registered twice.
    #[error("vjson: type already registered: {type_name}")]
    AlreadyRegistered { type_name: &'static str },

    /// A live type or version shape cannot be used as given.
    #[error("vjson: invalid prototype {type_name}: {reason}")]
    InvalidPrototype {
        type_name: &'static str,
        reason: String,
    },

    /// Two shapes cannot be mapped onto each other.
    #[error("vjson: {0}")]
    FieldTypeMismatch(FieldMismatch),

    /// The version tag of the input is negative.
    #[error("vjson: cannot unmarshal object: negative version number {0}")]
    NegativeVersion(i64),

    /// The version tag of the input names no registered version.
    #[error("vjson: unsupported version for {type_name}: {version}")]
    UnsupportedVersion { type_name: &'static str, version: u64 },

    /// The JSON codec failed.
    #[error(transparent)]
    Codec(#[from] serde_json::Error),

    /// An upgrade, pack or unpack hook failed.
    #[error(transparent)]
    Hook(HookError),
}

impl Error {
    /// Whether this error can only be produced while registering a type.
    pub fn is_registration(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRegistered { .. }
                | Self::InvalidPrototype { .. }
                | Self::FieldTypeMismatch(_)
        )
    }

    /// The error returned by a hook, if this is a hook failure.
    pub fn hook_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Hook(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn invalid(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidPrototype {
            type_name,
            reason: reason.into(),
        }
    }
}

/// Why a field of one shape cannot be copied into a field of another.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldMismatch {
    /// A field with the same name exists in both shapes with different types.
    #[error("field {field} has different types in {source_shape} ({source_type}) and {target_shape} ({target_type})")]
    SameName {
        field: &'static str,
        source_shape: &'static str,
        source_type: &'static str,
        target_shape: &'static str,
        target_type: &'static str,
    },
    /// A renamed field points at a field of a different type.
    #[error("cannot copy field {source_field} ({source_type}) in {source_shape} to field {target_field} ({target_type}) in {target_shape} because they have different types")]
    Renamed {
        source_field: &'static str,
        source_type: &'static str,
        source_shape: &'static str,
        target_field: &'static str,
        target_type: &'static str,
        target_shape: &'static str,
    },
    /// A rename directive names a field the previous shape does not have.
    #[error("field {target_field} in {target_shape} copies from field {source_field}, which does not exist in {source_shape}")]
    MissingSource {
        source_field: &'static str,
        source_shape: &'static str,
        target_field: &'static str,
        target_shape: &'static str,
    },
}
