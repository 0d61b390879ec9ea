//! Credentials and credential sources for registry authentication.

use crate::error::Error;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// One complete set of authentication material for a single request attempt.
///
/// The fields mirror the per-registry entries of a docker-style config file, and
/// more than one of them may be populated at once. The strongest populated shape
/// wins when the `Authorization` header is built: a registry token over a
/// username/password pair, the pair over a pre-encoded `auth` value. A credential
/// with no populated shape is anonymous and attaches nothing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credential {
    /// Username of a `Basic` username/password pair.
    pub username: String,
    /// Password of a `Basic` username/password pair.
    pub password: Token,
    /// Pre-encoded `base64(username:password)` value, sent verbatim in a `Basic`
    /// header without re-encoding.
    pub auth: Token,
    /// Short-lived registry token sent in a `Bearer` header.
    pub registry_token: Token,
}

impl Credential {
    /// Credential for `Basic` authentication from a username/password pair.
    pub fn basic(username: impl Into<String>, password: impl Into<Token>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Credential for `Bearer` authentication from a registry token.
    pub fn bearer(registry_token: impl Into<Token>) -> Self {
        Self {
            registry_token: registry_token.into(),
            ..Self::default()
        }
    }

    /// Value of the `Authorization` header this credential resolves to, or `None`
    /// for an anonymous credential.
    pub fn authorization_header(&self) -> Option<String> {
        let registry_token = self.registry_token.expose_secret();
        if !registry_token.is_empty() {
            return Some(format!("Bearer {}", registry_token));
        }

        let password = self.password.expose_secret();
        if !self.username.is_empty() && !password.is_empty() {
            let encoded = STANDARD.encode(format!("{}:{}", self.username, password));
            return Some(format!("Basic {}", encoded));
        }

        // `auth` is already base64 encoded, use it as-is
        let auth = self.auth.expose_secret();
        if !auth.is_empty() {
            return Some(format!("Basic {}", auth));
        }

        None
    }
}

/// Source of the credentials presented to a registry.
///
/// Implementations hand back fully resolved credentials; acquiring, caching or
/// refreshing them is their concern, not the transport's.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Resolves the credential to use for the next request.
    async fn resolve(&self) -> Result<Credential, Error>;

    /// Resolves every candidate credential, in the order they should be tried.
    ///
    /// Defaults to the single credential returned by
    /// [`resolve`](CredentialSource::resolve). Sources backed by more than one
    /// credential override this to expose their full fallback order.
    async fn resolve_all(&self) -> Result<Vec<Credential>, Error> {
        Ok(vec![self.resolve().await?])
    }
}

/// A fixed credential is its own source.
#[async_trait]
impl CredentialSource for Credential {
    async fn resolve(&self) -> Result<Credential, Error> {
        Ok(self.clone())
    }
}

/// Ordered list of credentials tried in turn until the registry accepts one.
#[derive(Clone, Debug, Default)]
pub struct CredentialChain {
    credentials: Vec<Credential>,
}

impl CredentialChain {
    /// Creates a chain from a list of credentials, in fallback order.
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self { credentials }
    }

    /// Appends a credential at the end of the chain.
    pub fn push(&mut self, credential: Credential) {
        self.credentials.push(credential);
    }
}

impl From<Vec<Credential>> for CredentialChain {
    fn from(credentials: Vec<Credential>) -> Self {
        Self::new(credentials)
    }
}

#[async_trait]
impl CredentialSource for CredentialChain {
    async fn resolve(&self) -> Result<Credential, Error> {
        self.credentials.first().cloned().ok_or(Error::NoCredentials)
    }

    async fn resolve_all(&self) -> Result<Vec<Credential>, Error> {
        Ok(self.credentials.clone())
    }
}

/// Wrapper for a secret string that makes it harder to accidentally expose secrets
/// and ensures the backing memory is wiped on drop.
///
/// It is a wrapper around a [`secrecy::Secret`](secrecy::Secret).
///
/// ```rust
/// # use registry_auth::Token;
/// let token = Token::new("supersecret");
///
/// // The secret is redacted when printed with Debug
/// assert!(!format!("{:?}", token).contains("supersecret"));
///
/// // But can be manually exposed calling `expose_secret()`...
/// assert_eq!(token.expose_secret(), "supersecret");
///
/// // ... Or if serialized with Serde
/// let serialized = serde_json::to_string(&token).unwrap();
/// assert!(serialized.contains("supersecret"));
/// ```
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Token(#[serde(serialize_with = "serialize_secret")] Secret<String>);

impl Token {
    /// Wraps a secret string in a new `Token`.
    pub fn new<T: Into<String>>(s: T) -> Self {
        Self(Secret::new(s.into()))
    }

    /// Exposes a reference to the underlying secret string.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Default for Token {
    fn default() -> Self {
        Token::new("")
    }
}

impl<T> From<T> for Token
where
    T: Into<String>,
{
    fn from(s: T) -> Self {
        Token::new(s)
    }
}

fn serialize_secret<S>(secret: &Secret<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::ser::Serializer,
{
    secret.expose_secret().serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Credential::bearer("abc") => Some("Bearer abc".to_string()); "bearer token")]
    #[test_case(Credential {
        username: "u".into(),
        password: "p".into(),
        auth: "dTpw".into(),
        registry_token: "abc".into(),
    } => Some("Bearer abc".to_string()); "bearer wins over every other shape")]
    #[test_case(Credential::basic("u", "p") => Some("Basic dTpw".to_string()); "username password pair")]
    #[test_case(Credential {
        username: "u".into(),
        password: "p".into(),
        auth: "c3RhbGU6c3RhbGU=".into(),
        ..Credential::default()
    } => Some("Basic dTpw".to_string()); "pair wins over pre-encoded value")]
    #[test_case(Credential {
        auth: "dTpw".into(),
        ..Credential::default()
    } => Some("Basic dTpw".to_string()); "pre-encoded value is used verbatim")]
    #[test_case(Credential {
        username: "u".into(),
        auth: "dTpw".into(),
        ..Credential::default()
    } => Some("Basic dTpw".to_string()); "incomplete pair falls back to pre-encoded value")]
    #[test_case(Credential {
        password: "p".into(),
        ..Credential::default()
    } => None; "password without username is anonymous")]
    #[test_case(Credential::default() => None; "empty credential is anonymous")]
    fn authorization_header_selection(credential: Credential) -> Option<String> {
        credential.authorization_header()
    }

    #[test]
    fn deserializes_docker_style_config_entries() {
        let credential: Credential =
            serde_json::from_str(r#"{"username":"u","password":"p"}"#).unwrap();
        assert_eq!(credential.authorization_header().as_deref(), Some("Basic dTpw"));

        let credential: Credential = serde_json::from_str(r#"{"auth":"dTpw"}"#).unwrap();
        assert_eq!(credential.authorization_header().as_deref(), Some("Basic dTpw"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let credential = Credential::basic("u", "hunter2");
        assert!(!format!("{:?}", credential).contains("hunter2"));
    }

    #[tokio::test]
    async fn chain_resolves_candidates_in_insertion_order() {
        let chain = CredentialChain::new(vec![
            Credential::bearer("first"),
            Credential::bearer("second"),
        ]);

        let all = chain.resolve_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].authorization_header().as_deref(), Some("Bearer first"));
        assert_eq!(all[1].authorization_header().as_deref(), Some("Bearer second"));

        let single = chain.resolve().await.unwrap();
        assert_eq!(single.authorization_header().as_deref(), Some("Bearer first"));
    }

    #[tokio::test]
    async fn empty_chain_has_no_credential_to_resolve() {
        let result = CredentialChain::default().resolve().await;
        assert!(matches!(result, Err(Error::NoCredentials)));
    }

    #[tokio::test]
    async fn single_credential_is_a_one_element_candidate_list() {
        let all = Credential::bearer("abc").resolve_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].authorization_header().as_deref(), Some("Bearer abc"));
    }
}
