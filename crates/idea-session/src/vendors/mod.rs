//! Concrete transports: HTTP session creation and WebSocket channels.
pub mod http;
pub mod ws;

pub use http::HttpSessionApi;
pub use ws::{WsChannel, WsConnector};
