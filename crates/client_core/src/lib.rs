//! Client-side synchronization for the lighting panel: mirrors remote device
//! state from bridge notifications and turns gestures into outbound commands.

pub mod config;
pub mod fancy;
pub mod panel;
pub mod projector;
pub mod routing;
pub mod scene;
pub mod store;
pub mod transport;

pub use config::{load_settings, ConfigError, PanelSettings};
pub use fancy::{ColorMath, ColorMathError, FancyLightCache, MissingColorMath};
pub use panel::{run_panel, Gesture, Panel, PanelEvent, PanelLayout};
pub use projector::{PanelView, UiSurface};
pub use routing::{RegistrationTable, Route};
pub use transport::{select_transport, CommandSink, SelectedTransport, TransportError};
