use thiserror::Error;

use super::types::ConnectionType;

/// Errors raised while applying daemon state to the mirror tree.
#[derive(Debug, Error)]
pub enum Error {
    /// A technology path named a type this applet has no mirror for.
    #[error("unknown technology type `{0}`")]
    UnknownTechnology(String),

    /// A service arrived for a technology that is not registered.
    #[error("no technology registered for {kind} service {path}")]
    MissingTechnology { kind: ConnectionType, path: String },

    /// A wireless service without `Ethernet.Interface` cannot be grouped.
    #[error("wifi service {0} has no interface")]
    MissingInterface(String),

    #[error("malformed property {name}: {reason}")]
    MalformedProperty { name: String, reason: String },

    #[error("variant conversion failed: {0}")]
    Variant(#[from] zbus::zvariant::Error),

    /// Tearing down a change subscription failed, e.g. the proxy is gone.
    #[error("failed to cancel subscription {0}")]
    Teardown(String),
}

pub type Result<T> = std::result::Result<T, Error>;
