//! Access to the authenticated identity.

use crate::types::Identity;
use parking_lot::RwLock;
use tracing::debug;

/// Supplies the current authenticated identity, if any.
pub trait SessionProvider: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;
}

/// Session holder whose identity is set by sign-in and cleared by sign-out.
#[derive(Default)]
pub struct StaticSession {
    identity: RwLock<Option<Identity>>,
}

impl StaticSession {
    /// A session with nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session already signed in as `identity`.
    pub fn signed_in(identity: impl Into<Identity>) -> Self {
        Self {
            identity: RwLock::new(Some(identity.into())),
        }
    }

    pub fn sign_in(&self, identity: impl Into<Identity>) {
        let identity = identity.into();
        debug!(%identity, "session signed in");
        *self.identity.write() = Some(identity);
    }

    pub fn sign_out(&self) {
        debug!("session signed out");
        *self.identity.write() = None;
    }
}

impl SessionProvider for StaticSession {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_and_out() {
        let session = StaticSession::anonymous();
        assert_eq!(session.current_identity(), None);

        session.sign_in("U1");
        assert_eq!(session.current_identity(), Some(Identity::new("U1")));

        session.sign_out();
        assert_eq!(session.current_identity(), None);
    }

    #[test]
    fn test_signed_in_constructor() {
        let session = StaticSession::signed_in("U9");
        assert_eq!(session.current_identity().unwrap().as_str(), "U9");
    }
}
