//! Custom conversion hooks.
//!
//! A version shape opts into a hook by implementing the trait and declaring
//! it when the history is registered (see [`Registration`]). Hooks are looked
//! up once, at registration, never per call.
//!
//! [`Registration`]: crate::Registration

/// Error returned by a hook. It is passed through to the caller unchanged as
/// [`Error::Hook`](crate::Error::Hook).
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Custom logic run after the fields of the previous version were copied.
///
/// # Example
///
/// ```
/// use vjson::{HookError, Upgrade};
///
/// #[derive(Default)]
/// struct MessageV1 { message: i64 }
///
/// #[derive(Default)]
/// struct MessageV2 { message: String }
///
/// impl Upgrade<MessageV1> for MessageV2 {
///     fn upgrade(&mut self, previous: &MessageV1) -> Result<(), HookError> {
///         self.message = previous.message.to_string();
///         Ok(())
///     }
/// }
/// ```
pub trait Upgrade<Previous> {
    /// Finish converting `previous` into `self`.
    fn upgrade(&mut self, previous: &Previous) -> Result<(), HookError>;
}

/// Custom conversion from the live value into the latest version shape.
///
/// Replaces field mapping entirely for the encode direction.
pub trait Pack<Live> {
    /// Fill `self` (a fresh default value) from `live`.
    fn pack(&mut self, live: &Live) -> Result<(), HookError>;
}

/// Custom conversion from the latest version shape into the live value.
///
/// Replaces field mapping entirely for the decode direction.
pub trait Unpack<Live> {
    /// Fill `live` from `self`.
    fn unpack(&self, live: &mut Live) -> Result<(), HookError>;
}

pub(crate) type UpgradeFn<Next, Previous> = fn(&mut Next, &Previous) -> Result<(), HookError>;
pub(crate) type PackFn<Latest, Live> = fn(&mut Latest, &Live) -> Result<(), HookError>;
pub(crate) type UnpackFn<Latest, Live> = fn(&Latest, &mut Live) -> Result<(), HookError>;
