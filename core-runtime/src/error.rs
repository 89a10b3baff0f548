use thiserror::Error;

/// Errors raised while configuring or bootstrapping the runtime.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required host bridge was not injected.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Host bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Name of the missing capability, if this is a capability error.
    pub fn missing_capability(&self) -> Option<&str> {
        match self {
            Error::CapabilityMissing { capability, .. } => Some(capability),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
