/// Chat-completion request and response types
pub mod chat;
/// Function-tool definitions and tool-choice strategies
pub mod tools;
