//! Assembly of a ready-to-use HTTP client for a single registry host.

use crate::{
    credentials::CredentialSource,
    middlewares::{
        authentication::AuthenticationMiddleware,
        inject_user_agent::InjectUserAgentMiddleware,
        retry_idempotent::{DynRetryPolicy, RetryIdempotentMiddleware},
    },
};
use reqwest_middleware::ClientWithMiddleware;
use reqwest_retry::{policies::ExponentialBackoff, RetryPolicy};
use reqwest_tracing::TracingMiddleware;
use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

/// Builder for an HTTP client that authenticates against a single registry host.
///
/// The built client is an ordinary [`ClientWithMiddleware`]: requests for the
/// configured host carry credentials, everything else passes through untouched.
pub struct RegistryClientBuilder {
    client: reqwest::Client,
    credential_source: Arc<dyn CredentialSource>,
    target_host: String,
    retry_policy: Option<DynRetryPolicy>,
}

impl RegistryClientBuilder {
    /// Creates a new builder for the given registry host (`host` or `host:port`)
    /// and credential source.
    pub fn new(target_host: impl Into<String>, credential_source: Arc<dyn CredentialSource>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credential_source,
            target_host: target_host.into(),
            retry_policy: Some(DynRetryPolicy(Arc::new(
                ExponentialBackoff::builder().build_with_max_retries(3),
            ))),
        }
    }

    /// Consumes the builder and builds the client.
    ///
    /// Middlewares run outermost first: tracing, User-Agent injection, transient
    /// retry, then credential injection. Credentials sit innermost so every retry
    /// resolves them afresh.
    pub fn build(self) -> ClientWithMiddleware {
        let mut builder = reqwest_middleware::ClientBuilder::new(self.client)
            .with(TracingMiddleware::default())
            .with(InjectUserAgentMiddleware::new());

        if let Some(retry_policy) = self.retry_policy {
            builder = builder.with(RetryIdempotentMiddleware::new(retry_policy));
        }

        builder
            .with(AuthenticationMiddleware::new(
                self.credential_source,
                self.target_host,
            ))
            .build()
    }

    /// Sets a specific reqwest [`Client`](reqwest::Client) to use.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Sets a specific [`RetryPolicy`](retry_policies::RetryPolicy) to use when
    /// retrying transient failures of idempotent requests.
    ///
    /// To disable automatic retrying of failed requests, use `None`.
    pub fn with_retry_policy(
        mut self,
        retry_policy: impl Into<Option<Arc<dyn RetryPolicy + Send + Sync + 'static>>>,
    ) -> Self {
        self.retry_policy = retry_policy.into().map(DynRetryPolicy);
        self
    }
}

impl Debug for RegistryClientBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryClientBuilder")
            .field("target_host", &self.target_host)
            .finish_non_exhaustive()
    }
}
