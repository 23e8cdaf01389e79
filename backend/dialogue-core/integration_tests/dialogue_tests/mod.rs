mod auth;
mod concurrency;
mod helpers;
mod lifecycle;
mod server;
