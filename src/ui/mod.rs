pub mod app;
pub mod conversation;
pub mod repl;
pub mod theme;
