pub mod buffer;
pub mod server;
pub mod websocket;

pub use buffer::{OverlayBuffer, DEFAULT_GRACE};
pub use server::start_overlay_server;
pub use websocket::{OverlayEvent, WebSocketState};
