use crate::domain::Identity;
use parking_lot::RwLock;

/// Source of the signed-in reader, if any
pub trait IdentityProvider: Send + Sync {
    fn current(&self) -> Option<Identity>;
}

/// Identity held for the lifetime of a client session
#[derive(Debug, Default)]
pub struct SessionIdentity {
    identity: RwLock<Option<Identity>>,
}

impl SessionIdentity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: RwLock::new(Some(identity)),
        }
    }

    pub fn sign_in(&self, identity: Identity) {
        *self.identity.write() = Some(identity);
    }

    pub fn sign_out(&self) {
        *self.identity.write() = None;
    }
}

impl IdentityProvider for SessionIdentity {
    fn current(&self) -> Option<Identity> {
        self.identity.read().clone()
    }
}
