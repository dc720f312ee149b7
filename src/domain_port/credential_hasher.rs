/// One-way, salted transform for refresh credentials.
#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    /// Hash `secret` with a fresh salt; returns a self-describing encoding
    /// that carries the salt and work factor.
    async fn hash(&self, secret: &str) -> anyhow::Result<String>;

    /// `Ok(false)` on mismatch; `Err` only when `encoded` is not a hash this
    /// hasher understands.
    async fn verify(&self, secret: &str, encoded: &str) -> anyhow::Result<bool>;
}
