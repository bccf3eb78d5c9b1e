pub mod app;
pub mod chat;
pub mod protocol;
pub mod speech;
