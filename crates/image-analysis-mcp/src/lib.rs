//! Image Analysis MCP Server — cached vision-model analysis of images by URL or path.

pub mod config;
pub mod protocol;
pub mod service;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::resolve_cache_path;
pub use protocol::ProtocolHandler;
pub use service::AnalysisService;
pub use transport::StdioTransport;
