pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod server;

#[cfg(test)]
mod tests;

pub const DIALOGUE_SERVER_HOST: &str = "127.0.0.1";
pub const DIALOGUE_SERVER_PORT: u16 = 25001;
pub const DIALOGUE_SERVER_ADDRESS: &str =
    const_format::concatcp!(DIALOGUE_SERVER_HOST, ":", DIALOGUE_SERVER_PORT);
