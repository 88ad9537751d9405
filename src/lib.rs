//! # Obsidian MCP Server
//!
//! MCP server for an Obsidian vault, talking to the Local REST API plugin.
//! Notes are parsed into a heading tree so content can be read and patched
//! by nested heading paths such as `Setup -> Install -> Linux`.
//!
//! ## Transport Features
//!
//! - `stdio` - Standard input/output (enabled by default)
//! - `http` - HTTP server support (enabled by default)

pub mod markdown;
pub mod mcp;
pub mod vault;
