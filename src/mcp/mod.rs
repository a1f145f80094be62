// MCP protocol plumbing: wire types, dispatcher, tool registry and transports
pub mod handler;
pub mod prompts;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod response;
pub mod stdio;
