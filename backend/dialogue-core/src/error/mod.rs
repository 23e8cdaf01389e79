pub mod auth;
pub mod config;
pub mod engine;
pub mod protocol;
pub mod server;

pub use auth::AuthError;
pub use config::ConfigError;
pub use engine::EngineError;
pub use protocol::ProtocolError;
pub use server::ServerError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
