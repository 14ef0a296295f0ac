/// Error taxonomy for the widget core
use thiserror::Error;

/// Everything that can go wrong while driving a widget.
///
/// None of these are fatal: the controller logs them and waits for the next
/// valid input. Only `InvalidConfig` is surfaced to the embedder, at
/// construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WidgetError {
    /// The loaded scene has no object with the configured name.
    #[error("scene has no object named `{name}`")]
    MissingTarget { name: String },

    /// An inbound message carried a known type but the wrong shape.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A rotation update arrived while no model was live.
    #[error("no active scene")]
    NoActiveScene,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A browser or engine call failed.
    #[error("host error: {0}")]
    Host(String),
}

pub type Result<T> = std::result::Result<T, WidgetError>;
