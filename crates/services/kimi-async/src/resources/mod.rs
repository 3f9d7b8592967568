/// Chat completions resource
pub mod chat;

pub use chat::Chat;
