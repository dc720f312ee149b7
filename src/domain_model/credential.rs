use super::UserGuid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessCredential(pub String);

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshCredential(pub String);

// Keep plaintext refresh credentials out of debug logs.
impl std::fmt::Debug for RefreshCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RefreshCredential(..)")
    }
}

/// An access credential together with the refresh credential minted
/// alongside it.
///
/// `user` is set when the pair is minted and cleared with
/// [`CredentialPair::without_user`] before the pair leaves the service.
/// Pairs presented by clients never carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserGuid>,
    #[serde(rename = "access_token")]
    pub access_credential: AccessCredential,
    #[serde(rename = "refresh_token")]
    pub refresh_credential: RefreshCredential,
}

impl CredentialPair {
    pub fn presented(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        CredentialPair {
            user: None,
            access_credential: AccessCredential(access.into()),
            refresh_credential: RefreshCredential(refresh.into()),
        }
    }

    pub fn without_user(mut self) -> Self {
        self.user = None;
        self
    }
}

/// Persisted form of a credential pair. The refresh credential only
/// survives as a PHC-encoded one-way hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub user: UserGuid,
    pub access_credential: AccessCredential,
    pub refresh_credential_hash: String,
}
