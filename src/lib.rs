//! Configuration-driven static file server.

pub mod config;
pub mod handlers;
pub mod http;
pub mod intercept;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{RoutingTable, StaticMux};
