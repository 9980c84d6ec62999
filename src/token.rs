use std::fmt;

/// Opaque signed session credential issued by the identity provider.
///
/// The token is short-lived and renewed transparently by the provider. The gate
/// never inspects it; claims arrive already verified alongside it on the
/// [`Principal`](crate::Principal).
///
/// # Security Properties
///
/// - Debug and Display output is always `[REDACTED]`
/// - No `Deref`, `AsRef` or `Borrow`; the raw value is reachable only through
///   [`expose`](Self::expose)
///
/// `Clone` is implemented because providers hand the same credential to every
/// principal handle they issue for a session.
///
/// # Examples
///
/// ```
/// use portal_gate::SessionToken;
///
/// let token = SessionToken::new("eyJhbGciOi...");
/// assert_eq!(format!("{:?}", token), "[REDACTED]");
/// assert_eq!(token.expose(), "eyJhbGciOi...");
/// ```
// Do NOT derive Debug or add Display that prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    raw: String,
}

impl SessionToken {
    /// Wraps a raw token string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Explicitly exposes the raw token, for handing back to the provider.
    pub fn expose(&self) -> &str {
        &self.raw
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
