mod auth_gateway;
mod config;
mod envelope;
mod protocol;
mod support;
