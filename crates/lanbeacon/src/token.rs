//! Opaque handles identifying running broadcast servers.

use uuid::Uuid;

/// Handle for one running broadcast server, returned by
/// [`Broadcasting::start`](crate::Broadcasting::start) and passed back to
/// [`Broadcasting::stop`](crate::Broadcasting::stop).
///
/// Tokens are only ever compared for equality and used as map keys; they
/// carry no ordering and expose nothing about the server they name.  A token
/// is minted fresh for every started server and never recycled, so a token
/// whose server has been stopped is simply unknown from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerToken(Uuid);

impl ServerToken {
    pub(crate) fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
