pub mod bridge;
pub mod chat;
pub mod config;
pub mod endpoints;
pub mod pipio;
pub mod records;
pub mod session;
pub mod terminal;
