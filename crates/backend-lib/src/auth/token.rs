// ============================
// passgate-lib/src/auth/token.rs
// ============================
//! Signed access/refresh token issuance and validation.
//!
//! Tokens are compact JWS strings signed with an HMAC. Access and refresh
//! tokens live in separate domains: each has its own secret and lifetime, so
//! a token minted for one domain never validates in the other.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use metrics::counter;
use passgate_common::{Subject, TokenDomain};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::clock::{Clock, SystemClock};
use crate::config::TokenSettings;
use crate::metrics as metric_names;

/// Recommended minimum secret length in bytes
pub const MIN_SECRET_BYTES: usize = 32;

/// Why a token was rejected or could not be minted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token declares an unexpected signing algorithm")]
    WrongAlgorithm,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,

    /// Signing backend failure, never caused by the presented token
    #[error("token signing failed: {0}")]
    Internal(String),
}

/// HMAC family used to sign every token of this process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl SigningAlgorithm {
    /// Name as it appears in the token header
    pub fn as_str(self) -> &'static str {
        match self {
            SigningAlgorithm::HS256 => "HS256",
            SigningAlgorithm::HS384 => "HS384",
            SigningAlgorithm::HS512 => "HS512",
        }
    }

    fn jwt_algorithm(self) -> Algorithm {
        match self {
            SigningAlgorithm::HS256 => Algorithm::HS256,
            SigningAlgorithm::HS384 => Algorithm::HS384,
            SigningAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Ok(SigningAlgorithm::HS256),
            "HS384" => Ok(SigningAlgorithm::HS384),
            "HS512" => Ok(SigningAlgorithm::HS512),
            other => Err(format!("unsupported signing algorithm '{other}', expected HS256, HS384 or HS512")),
        }
    }
}

/// Symmetric signing key. Zeroed on drop and never printed.
#[derive(Clone, Default, Deserialize)]
#[serde(from = "String")]
pub struct Secret(Zeroizing<Vec<u8>>);

impl Secret {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(Zeroizing::new(value.into_bytes()))
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::from_bytes(value.as_bytes())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<{} bytes redacted>)", self.len())
    }
}

/// Claims carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject the token authenticates
    pub sub: Subject,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Not before (Unix seconds)
    pub nbf: i64,
    /// Expires at (Unix seconds), exclusive
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

impl TokenClaims {
    pub fn subject(&self) -> &Subject {
        &self.sub
    }

    /// Token id as a UUID, when it is one
    pub fn token_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.jti).ok()
    }
}

/// A freshly minted token together with the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

struct DomainKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl DomainKeys {
    fn new(domain: TokenDomain, secret: &Secret, ttl: Duration) -> Self {
        if secret.len() < MIN_SECRET_BYTES {
            tracing::warn!(
                %domain,
                bytes = secret.len(),
                "token secret is shorter than recommended ({MIN_SECRET_BYTES} bytes)"
            );
        }
        Self {
            encoding: EncodingKey::from_secret(secret.expose()),
            decoding: DecodingKey::from_secret(secret.expose()),
            ttl,
        }
    }
}

/// Key material for both token domains, built once at startup and shared
/// read-only between the issuer and the validator.
pub struct TokenKeys {
    algorithm: SigningAlgorithm,
    access: DomainKeys,
    refresh: DomainKeys,
}

impl TokenKeys {
    pub fn new(
        algorithm: SigningAlgorithm,
        access_secret: &Secret,
        access_ttl: Duration,
        refresh_secret: &Secret,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            algorithm,
            access: DomainKeys::new(TokenDomain::Access, access_secret, access_ttl),
            refresh: DomainKeys::new(TokenDomain::Refresh, refresh_secret, refresh_ttl),
        }
    }

    pub fn from_settings(settings: &TokenSettings) -> Self {
        Self::new(
            settings.algorithm,
            &settings.access_secret,
            settings.access_ttl(),
            &settings.refresh_secret,
            settings.refresh_ttl(),
        )
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Lifetime of tokens in `domain`
    pub fn ttl(&self, domain: TokenDomain) -> Duration {
        self.domain(domain).ttl
    }

    fn domain(&self, domain: TokenDomain) -> &DomainKeys {
        match domain {
            TokenDomain::Access => &self.access,
            TokenDomain::Refresh => &self.refresh,
        }
    }
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("algorithm", &self.algorithm)
            .field("access_ttl", &self.access.ttl)
            .field("refresh_ttl", &self.refresh.ttl)
            .finish_non_exhaustive()
    }
}

/// Mints signed, time-bounded tokens
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<TokenKeys>,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        Self::with_clock(keys, Arc::new(SystemClock))
    }

    pub fn with_clock(keys: Arc<TokenKeys>, clock: Arc<dyn Clock>) -> Self {
        Self { keys, clock }
    }

    /// Issue a compact token for `subject` in `domain`
    pub fn issue(&self, subject: &Subject, domain: TokenDomain) -> Result<String, TokenError> {
        self.issue_with_claims(subject, domain).map(|issued| issued.token)
    }

    /// Issue a token and also hand back the claims it carries
    pub fn issue_with_claims(
        &self,
        subject: &Subject,
        domain: TokenDomain,
    ) -> Result<IssuedToken, TokenError> {
        let keys = self.keys.domain(domain);
        let now = self.clock.unix_timestamp();
        let ttl = i64::try_from(keys.ttl.as_secs()).unwrap_or(i64::MAX);

        let claims = TokenClaims {
            sub: subject.clone(),
            iat: now,
            nbf: now,
            exp: now.saturating_add(ttl),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(self.keys.algorithm.jwt_algorithm());
        let token = encode(&header, &claims, &keys.encoding).map_err(|e| {
            tracing::error!(%domain, error = %e, "failed to sign token");
            TokenError::Internal(e.to_string())
        })?;

        counter!(metric_names::TOKEN_ISSUED, "domain" => domain.as_str()).increment(1);
        Ok(IssuedToken { token, claims })
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer").field("keys", &self.keys).finish()
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Checks structure, algorithm, signature and validity window of a token
#[derive(Clone)]
pub struct TokenValidator {
    keys: Arc<TokenKeys>,
    clock: Arc<dyn Clock>,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        Self::with_clock(keys, Arc::new(SystemClock))
    }

    pub fn with_clock(keys: Arc<TokenKeys>, clock: Arc<dyn Clock>) -> Self {
        // The library only verifies the MAC; the validity window is checked
        // below against the injected clock with no leeway.
        let mut validation = Validation::new(keys.algorithm.jwt_algorithm());
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            keys,
            clock,
            validation,
        }
    }

    /// Validate `token` in `domain` and return its subject
    pub fn validate(&self, token: &str, domain: TokenDomain) -> Result<Subject, TokenError> {
        self.validate_claims(token, domain).map(|claims| claims.sub)
    }

    /// Validate `token` in `domain` and return all of its claims
    pub fn validate_claims(
        &self,
        token: &str,
        domain: TokenDomain,
    ) -> Result<TokenClaims, TokenError> {
        let result = self.check(token, domain);
        if let Err(ref reason) = result {
            tracing::debug!(%domain, %reason, "token rejected");
            counter!(metric_names::TOKEN_REJECTED, "domain" => domain.as_str()).increment(1);
        }
        result
    }

    fn check(&self, token: &str, domain: TokenDomain) -> Result<TokenClaims, TokenError> {
        let alg = parse_structure(token)?;
        if alg != self.keys.algorithm.as_str() {
            return Err(TokenError::WrongAlgorithm);
        }

        let data = decode::<TokenClaims>(token, &self.keys.domain(domain).decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::InvalidAlgorithm => TokenError::WrongAlgorithm,
                _ => TokenError::Malformed,
            })?;
        let claims = data.claims;

        let now = self.clock.unix_timestamp();
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }
        if now < claims.nbf {
            return Err(TokenError::NotYetValid);
        }

        Ok(claims)
    }
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidator").field("keys", &self.keys).finish()
    }
}

/// Split the token, decode header and payload, and return the declared algorithm.
fn parse_structure(token: &str) -> Result<String, TokenError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };

    let header = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| TokenError::Malformed)?;
    let header: RawHeader = serde_json::from_slice(&header).map_err(|_| TokenError::Malformed)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice::<TokenClaims>(&payload).map_err(|_| TokenError::Malformed)?;

    Ok(header.alg)
}
