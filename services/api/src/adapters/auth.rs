//! services/api/src/adapters/auth.rs
//!
//! Adapter for the hosted passwordless authentication backend, implementing
//! the `AuthService` port. Speaks the GoTrue-style REST surface the original
//! hosted service exposes: `/auth/v1/otp`, `/auth/v1/user`, `/auth/v1/logout`.

use async_trait::async_trait;
use idea_polisher_core::domain::User;
use idea_polisher_core::ports::{AuthService, PortError, PortResult};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AuthService` against a hosted magic-link
/// endpoint, authenticated with a publishable anon key.
#[derive(Clone)]
pub struct HostedAuthAdapter {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl HostedAuthAdapter {
    /// Creates a new `HostedAuthAdapter`. `base_url` has no trailing slash.
    pub fn new(http: reqwest::Client, base_url: String, anon_key: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
    create_user: bool,
}

#[derive(Deserialize)]
struct SessionUser {
    id: Uuid,
    email: Option<String>,
}

#[derive(Deserialize)]
struct AuthErrorBody {
    #[serde(alias = "msg", alias = "message", alias = "error_description")]
    message: Option<String>,
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<AuthErrorBody>().await {
        Ok(AuthErrorBody { message: Some(msg) }) => msg,
        _ => format!("auth service returned {}", status),
    }
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for HostedAuthAdapter {
    /// Asks the hosted service to email a one-time login link.
    async fn request_magic_link(&self, email: &str) -> PortResult<()> {
        let response = self
            .http
            .post(self.endpoint("/auth/v1/otp"))
            .header("apikey", &self.anon_key)
            .json(&OtpRequest { email, create_user: true })
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else if response.status().is_client_error() {
            // Typically a rejected email address; the provider's message is
            // fit for display.
            Err(PortError::Service(error_message(response).await))
        } else {
            Err(PortError::Network(error_message(response).await))
        }
    }

    /// Resolves an access token to its user. An unrecognized token is not an
    /// error, it is simply no session.
    async fn current_session(&self, access_token: &str) -> PortResult<Option<User>> {
        let response = self
            .http
            .get(self.endpoint("/auth/v1/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let user = response
                    .json::<SessionUser>()
                    .await
                    .map_err(|e| PortError::Network(e.to_string()))?;
                Ok(Some(User {
                    user_id: user.id,
                    email: user.email,
                }))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Err(PortError::Network(error_message(response).await)),
        }
    }

    async fn sign_out(&self, access_token: &str) -> PortResult<()> {
        let response = self
            .http
            .post(self.endpoint("/auth/v1/logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;

        // A token that is already dead is a successful sign-out.
        if response.status().is_success() || response.status() == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(PortError::Network(error_message(response).await))
        }
    }
}
