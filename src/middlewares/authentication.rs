use crate::{
    credentials::{Credential, CredentialSource},
    error::Error,
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderValue, AUTHORIZATION, HOST},
    Request, Response, StatusCode, Url,
};
use reqwest_middleware::{Middleware, Next};
use std::{
    borrow::Cow,
    fmt::{self, Debug, Formatter},
    sync::Arc,
};
use task_local_extensions::Extensions;

/// Reqwest middleware to inject registry credentials into outgoing HTTP requests.
///
/// The credential source is asked for its candidates on every request, and each
/// candidate is tried in order: a `401 Unauthorized` or `403 Forbidden` answer
/// moves on to the next one, any other status is handed back to the caller
/// immediately. The response to the last candidate is always handed back as-is,
/// even when it is still a rejection, so callers keep full visibility into its
/// status and body. Network-level failures abort the whole call without fallback.
pub struct AuthenticationMiddleware {
    credential_source: Arc<dyn CredentialSource>,
    target_host: String,
}

impl AuthenticationMiddleware {
    /// Creates a middleware attaching credentials from `credential_source` to
    /// requests addressed to `target_host` (either `host` or `host:port`).
    pub fn new(
        credential_source: Arc<dyn CredentialSource>,
        target_host: impl Into<String>,
    ) -> Self {
        Self {
            credential_source,
            target_host: target_host.into(),
        }
    }

    /// A request is only eligible for credentials when its declared `Host` header
    /// or its URL authority matches the configured host exactly, so a client
    /// shared across hosts never leaks credentials to anyone but the registry.
    fn targets_configured_host(&self, request: &Request) -> bool {
        let declared = request
            .headers()
            .get(HOST)
            .and_then(|host| host.to_str().ok());

        declared == Some(self.target_host.as_str())
            || url_authority(request.url()) == self.target_host
    }

    fn attach_credential(
        &self,
        request: &mut Request,
        credential: &Credential,
    ) -> Result<(), Error> {
        if !self.targets_configured_host(request) {
            return Ok(());
        }

        if let Some(header) = credential.authorization_header() {
            let mut value = HeaderValue::from_str(&header)?;
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        Ok(())
    }
}

#[async_trait]
impl Middleware for AuthenticationMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let candidates = self.credential_source.resolve_all().await?;
        let (final_credential, leading) = match candidates.split_last() {
            Some(split) => split,
            None => return Err(Error::NoCredentials.into()),
        };

        let mut request = req;
        for (attempt, credential) in leading.iter().enumerate() {
            // Each attempt runs on a fresh copy of the original request, so a
            // header set for an earlier candidate never lingers into the next one.
            let retry_request = request.try_clone().ok_or(Error::UnclonableRequest)?;

            self.attach_credential(&mut request, credential)?;
            let response = next.clone().run(request, extensions).await?;

            let status = response.status();
            if status != StatusCode::UNAUTHORIZED && status != StatusCode::FORBIDDEN {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            tracing::debug!(
                "Credential {}/{} rejected by {} with status {}: {}",
                attempt + 1,
                leading.len() + 1,
                self.target_host,
                status,
                body
            );
            request = retry_request;
        }

        // Last candidate: the response is the caller's whatever its status.
        self.attach_credential(&mut request, final_credential)?;
        next.run(request, extensions).await
    }
}

impl Debug for AuthenticationMiddleware {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationMiddleware")
            .field("target_host", &self.target_host)
            .finish_non_exhaustive()
    }
}

/// Authority (`host` or `host:port`) of a request URL. The port is omitted when
/// the URL uses the default port for its scheme.
fn url_authority(url: &Url) -> Cow<'_, str> {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => Cow::Owned(format!("{}:{}", host, port)),
        (Some(host), None) => Cow::Borrowed(host),
        (None, _) => Cow::Borrowed(""),
    }
}
