/// wheelframe core - rotation smoothing and the iframe handshake
///
/// This library holds everything about the widget that does not touch the
/// browser: the smoothed rotation state, pointer normalization, the
/// parent/iframe message protocol and the lifecycle state machine. The web
/// crate feeds it events and carries out the commands it returns.

pub mod config;
pub mod error;
pub mod input;
pub mod lifecycle;
pub mod protocol;
pub mod rotation;
pub mod scene;

// Re-export commonly used types
pub use config::WidgetConfig;
pub use error::WidgetError;
pub use input::{Normalizer, Viewport};
pub use lifecycle::{Command, Controller, Phase};
pub use protocol::{InboundMessage, OutboundMessage};
pub use rotation::{Angles, Axis, AxisMapping, RotationState, Smoother};
pub use scene::{LoadTicket, RotationTarget, SceneApp, SceneHandle};
