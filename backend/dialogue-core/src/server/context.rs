use crate::auth::AuthGateway;
use crate::config::ServerConfig;
use crate::server::dispatcher::RequestDispatcher;
use crate::server::registry::SessionRegistry;

/// Shared state of one running server.
///
/// Built once at startup and handed to the acceptor and every session task.
pub struct ServerContext {
    config: ServerConfig,
    registry: SessionRegistry,
    auth: AuthGateway,
    dispatcher: RequestDispatcher,
}

impl ServerContext {
    pub fn new(config: ServerConfig, auth: AuthGateway, dispatcher: RequestDispatcher) -> Self {
        Self {
            config,
            registry: SessionRegistry::new(),
            auth,
            dispatcher,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn auth(&self) -> &AuthGateway {
        &self.auth
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }
}
