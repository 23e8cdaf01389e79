//! Out-of-band channel to the trusted local peer that owns the secret.
//!
//! The peer serves one client at a time: it reads a request, answers with the
//! secret and disconnects. On Unix the channel name is a Unix socket path, on
//! Windows it is a named pipe (`\\.\pipe\<name>`).

use crate::error::auth::AuthError;
use crate::protocol::AUTH_REQUEST;

use common::{ErrorLocation, RedactedSecret};

use std::io::Result as IoResult;
use std::panic::Location;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{sleep as TokioSleep, timeout as TokioTimeout};

const SECRET_BUFFER_SIZE: usize = 1024;
const CONNECT_INITIAL_INTERVAL: Duration = Duration::from_millis(50);
const CONNECT_MAX_INTERVAL: Duration = Duration::from_secs(1);

/// Ask the peer listening on `channel` for the shared secret.
///
/// Connection attempts are retried with exponential backoff, since the peer
/// briefly stops listening between clients. The whole exchange is bounded by
/// `limit`.
///
/// # Errors
///
/// - [`AuthError::Channel`] - the channel could not be reached or the exchange failed
/// - [`AuthError::Timeout`] - the peer did not answer within `limit`
/// - [`AuthError::EmptySecret`] - the peer answered with an empty secret
pub async fn fetch_secret(channel: &str, limit: Duration) -> Result<RedactedSecret, AuthError> {
    let mut backoff = ExponentialBackoff {
        initial_interval: CONNECT_INITIAL_INTERVAL,
        max_interval: CONNECT_MAX_INTERVAL,
        max_elapsed_time: Some(limit),
        ..Default::default()
    };

    debug!("Connecting to auth channel {channel}");

    let mut stream = loop {
        match connect(channel).await {
            Ok(stream) => break stream,
            Err(e) => match backoff.next_backoff() {
                Some(duration) => {
                    trace!("Auth channel not ready ({e}), retrying after {duration:?}");
                    TokioSleep(duration).await;
                }
                None => {
                    return Err(AuthError::Channel {
                        message: format!("Failed to connect to auth channel {channel}: {e}"),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            },
        }
    };

    TokioTimeout(limit, request_secret(&mut stream))
        .await
        .map_err(|_| AuthError::Timeout {
            message: format!("Auth channel {channel} did not answer within {limit:?}"),
            location: ErrorLocation::from(Location::caller()),
        })?
}

/// Send the auth marker and read the secret back in a single read.
pub(crate) async fn request_secret<S>(stream: &mut S) -> Result<RedactedSecret, AuthError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(AUTH_REQUEST.as_bytes()).await?;
    stream.flush().await?;

    let mut buffer = vec![0u8; SECRET_BUFFER_SIZE];
    let read = stream.read(&mut buffer).await?;

    let secret = String::from_utf8_lossy(&buffer[..read]).trim().to_string();
    if secret.is_empty() {
        return Err(AuthError::EmptySecret {
            message: "Auth peer answered with an empty secret".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    // Best effort: the peer disconnects on its own after answering
    let _ = stream.shutdown().await;

    Ok(RedactedSecret::new(secret))
}

#[cfg(unix)]
async fn connect(channel: &str) -> IoResult<tokio::net::UnixStream> {
    tokio::net::UnixStream::connect(channel).await
}

#[cfg(windows)]
async fn connect(
    channel: &str,
) -> IoResult<tokio::net::windows::named_pipe::NamedPipeClient> {
    let pipe_name = format!(r"\\.\pipe\{channel}");
    tokio::net::windows::named_pipe::ClientOptions::new().open(pipe_name)
}
