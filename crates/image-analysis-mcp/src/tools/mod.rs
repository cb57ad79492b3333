//! MCP tool implementations.

pub mod analyze_image;
pub mod analyze_image_from_path;
pub mod registry;

pub use registry::ToolRegistry;
