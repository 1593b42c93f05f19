use serde::{Deserialize, Serialize};

/// Role resolved from an API key on the cloud side.
///
/// A producer may both write and verify; a verifier may only read the
/// verification endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiRole {
    Produttore,
    Verificatore,
}

impl ApiRole {
    pub fn can_write(self) -> bool {
        matches!(self, ApiRole::Produttore)
    }

    pub fn can_verify(self) -> bool {
        // Producer implies verify.
        true
    }
}

/// An authenticated API user: the value an `X-API-Key` header resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiUser {
    pub name: String,
    pub role: ApiRole,
}
