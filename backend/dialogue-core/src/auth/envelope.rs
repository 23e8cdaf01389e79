//! Token envelope around authenticated requests.
//!
//! Wire shape: `TOKEN:<token>|SESSION:<session>|<payload>`. The envelope is
//! parsed structurally; neither the token nor the session key is verified.

pub const TOKEN_PREFIX: &str = "TOKEN:";
pub const SESSION_PREFIX: &str = "SESSION:";
pub const FIELD_DELIMITER: char = '|';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub token: &'a str,
    pub session: &'a str,
    pub payload: &'a str,
}

impl<'a> Envelope<'a> {
    /// Split a raw message into its envelope fields.
    ///
    /// Returns `None` when the message is not enveloped. The payload keeps any
    /// further `|` characters untouched.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let rest = raw.strip_prefix(TOKEN_PREFIX)?;
        let mut fields = rest.splitn(3, FIELD_DELIMITER);

        let token = fields.next()?;
        let session = fields.next()?.strip_prefix(SESSION_PREFIX)?;
        let payload = fields.next()?;

        Some(Self {
            token,
            session,
            payload,
        })
    }
}
