use crate::version::VERSION_KEY;

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Top-level JSON key holding the version number. Live types may not
    /// declare a field with this name, and a latest version shape that does
    /// gets the version written into that field instead of having the key
    /// spliced into its output.
    pub version_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version_key: VERSION_KEY.to_string(),
        }
    }
}
