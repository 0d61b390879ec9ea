//! Transparent credential injection for container registry clients.
//!
//! This crate sits between your code and a plain [`reqwest::Client`] and attaches
//! the right `Authorization` header to every request addressed to a single,
//! configured registry host. When more than one candidate credential is available
//! (say, a keychain or a list of robot accounts), rejected attempts automatically
//! fall back to the next candidate until one is accepted or the candidates are
//! exhausted.
//!
//! # Usage
//!
//! Build a client for your registry host from one or more credentials:
//!
//! ```rust,no_run
//! use registry_auth::{Credential, CredentialChain, RegistryClientBuilder};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let chain = CredentialChain::new(vec![
//!     Credential::bearer("eyJhbGciOi..."),
//!     Credential::basic("ci-bot", "hunter2"),
//! ]);
//!
//! let client = RegistryClientBuilder::new("registry.example.com", Arc::new(chain)).build();
//!
//! let response = client
//!     .get("https://registry.example.com/v2/")
//!     .send()
//!     .await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```
//!
//! Requests going anywhere other than the configured host are passed through
//! untouched, so a single client can safely serve mixed traffic without leaking
//! registry credentials to third parties.
//!
//! The building blocks are ordinary [`reqwest_middleware`] middlewares, so they
//! compose with any other middleware stack. Use
//! [`AuthenticationMiddleware`](crate::middlewares::authentication::AuthenticationMiddleware)
//! directly if you want to assemble the client yourself.

#![deny(missing_debug_implementations)]
#![forbid(unsafe_code)]

pub mod client;
pub mod credentials;
pub mod error;
pub mod middlewares;

pub use client::RegistryClientBuilder;
pub use credentials::{Credential, CredentialChain, CredentialSource, Token};
pub use error::Error;
pub use middlewares::authentication::AuthenticationMiddleware;
