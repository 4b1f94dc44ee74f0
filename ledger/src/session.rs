//! Session resolution.
//!
//! The credential is the value of the `auth` cookie. Without a secret it is the
//! bare identity key. With a secret it is `<identity_key>.<hex HMAC-SHA256>`,
//! and anything that fails verification is reported as stale so the caller
//! clears it.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use vouch_store::{UserRecord, UserStore};
use vouch_types::{AccessTier, IdentityKey, PolicyParams, ViewerTier, VouchError};

type HmacSha256 = Hmac<Sha256>;

/// Who is making a request.
#[derive(Clone, Debug, PartialEq)]
pub enum Session {
    /// No credential was presented.
    Anonymous,
    Authenticated(UserRecord),
    /// A credential was presented but names no known user. The caller must
    /// clear it.
    Stale,
}

impl Session {
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }

    pub fn viewer_tier(&self) -> ViewerTier {
        self.user()
            .map(|u| ViewerTier::from(u.access_tier))
            .unwrap_or(ViewerTier::Anonymous)
    }

    /// The resolved user, or `Unauthenticated`.
    pub fn require_user(&self) -> Result<&UserRecord, VouchError> {
        self.user().ok_or(VouchError::Unauthenticated)
    }
}

/// Signs and verifies cookie values with HMAC-SHA256.
#[derive(Clone)]
pub struct SessionSigner {
    mac: HmacSha256,
}

impl SessionSigner {
    pub fn new(secret: &[u8]) -> Result<Self, VouchError> {
        if secret.is_empty() {
            return Err(VouchError::InvalidInput("session secret is empty".into()));
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| VouchError::Internal(format!("session key: {e}")))?;
        Ok(Self { mac })
    }

    pub fn sign(&self, key: &IdentityKey) -> String {
        let mut mac = self.mac.clone();
        mac.update(key.as_str().as_bytes());
        format!("{}.{}", key, hex::encode(mac.finalize().into_bytes()))
    }

    /// Return the identity part of `value` if its tag verifies.
    pub fn verify<'a>(&self, value: &'a str) -> Option<&'a str> {
        let (key, tag) = value.rsplit_once('.')?;
        let tag = hex::decode(tag).ok()?;
        let mut mac = self.mac.clone();
        mac.update(key.as_bytes());
        mac.verify_slice(&tag).ok().map(|_| key)
    }
}

pub struct SessionResolver<S> {
    store: Arc<S>,
    signer: Option<SessionSigner>,
    params: PolicyParams,
}

impl<S: UserStore> SessionResolver<S> {
    pub fn new(store: Arc<S>, signer: Option<SessionSigner>, params: PolicyParams) -> Self {
        Self {
            store,
            signer,
            params,
        }
    }

    /// Resolve the raw cookie value, if any, to a session.
    ///
    /// Storage failures are errors, never a silent downgrade to anonymous.
    pub fn resolve(&self, credential: Option<&str>) -> Result<Session, VouchError> {
        let raw = match credential.map(str::trim) {
            None | Some("") => return Ok(Session::Anonymous),
            Some(raw) => raw,
        };
        let claimed = match &self.signer {
            Some(signer) => match signer.verify(raw) {
                Some(key) => key,
                None => {
                    debug!("session credential failed signature check");
                    return Ok(Session::Stale);
                }
            },
            None => raw,
        };
        let Ok(key) = IdentityKey::parse(claimed) else {
            return Ok(Session::Stale);
        };
        match self.store.get_user(&key)? {
            Some(user) => Ok(Session::Authenticated(user)),
            None => {
                debug!(identity = %key, "session names unknown user");
                Ok(Session::Stale)
            }
        }
    }

    /// The cookie value that authenticates `key`.
    pub fn credential_for(&self, key: &IdentityKey) -> String {
        match &self.signer {
            Some(signer) => signer.sign(key),
            None => key.to_string(),
        }
    }

    /// Cookie lifetime in seconds for a session of `tier`.
    pub fn max_age_for(&self, tier: AccessTier) -> u64 {
        match tier {
            AccessTier::Orb => self.params.orb_session_secs,
            AccessTier::Paid => self.params.paid_session_secs,
        }
    }
}
