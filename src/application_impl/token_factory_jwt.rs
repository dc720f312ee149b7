use crate::application_port::{RotationError, TokenFactory};
use crate::domain_model::*;
use anyhow::bail;
use chrono::{SecondsFormat, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub algorithm: Algorithm,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    guid: String,
    create_at: String,
    jti: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshClaims {
    access: String, // the complete access credential this refresh credential belongs to
    create_at: String,
    jti: String,
}

pub struct JwtTokenFactory {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenFactory {
    pub fn try_new(cfg: JwtConfig) -> anyhow::Result<Self> {
        if !matches!(
            cfg.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            bail!("unsupported signing algorithm {:?}, expected HS256/HS384/HS512", cfg.algorithm);
        }
        if cfg.signing_key.is_empty() {
            bail!("signing key is empty");
        }

        // Issued credentials carry no expiry; lifetime is governed by the store.
        let mut validation = Validation::new(cfg.algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Ok(JwtTokenFactory {
            header: Header::new(cfg.algorithm),
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            validation,
        })
    }

    #[inline]
    fn issued_at() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    #[inline]
    fn new_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, RotationError> {
        encode(&self.header, claims, &self.encoding_key)
            .map_err(|e| RotationError::InternalError(e.to_string()))
    }
}

impl TokenFactory for JwtTokenFactory {
    fn create_pair(&self, user: &UserGuid) -> Result<CredentialPair, RotationError> {
        let access = self.sign(&AccessClaims {
            guid: user.0.clone(),
            create_at: Self::issued_at(),
            jti: Self::new_jti(),
        })?;
        let refresh = self.sign(&RefreshClaims {
            access: access.clone(),
            create_at: Self::issued_at(),
            jti: Self::new_jti(),
        })?;

        Ok(CredentialPair {
            user: Some(user.clone()),
            access_credential: AccessCredential(access),
            refresh_credential: RefreshCredential(refresh),
        })
    }

    fn check_binding(&self, pair: &CredentialPair) -> Result<(), RotationError> {
        decode::<AccessClaims>(
            &pair.access_credential.0,
            &self.decoding_key,
            &self.validation,
        )
        .map_err(|_| RotationError::Unauthorized)?;

        let refresh = decode::<RefreshClaims>(
            &pair.refresh_credential.0,
            &self.decoding_key,
            &self.validation,
        )
        .map_err(|_| RotationError::Unauthorized)?;

        if refresh.claims.access != pair.access_credential.0 {
            return Err(RotationError::Unauthorized);
        }
        Ok(())
    }
}
