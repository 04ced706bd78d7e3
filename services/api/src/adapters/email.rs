//! services/api/src/adapters/email.rs
//!
//! Adapter for the transactional email relay, implementing the
//! `EmailDeliveryService` port. The relay is a web3forms-style endpoint
//! accepting a single JSON submission per delivery.

use async_trait::async_trait;
use idea_polisher_core::ports::{EmailDeliveryService, PortError, PortResult};
use serde::Serialize;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `EmailDeliveryService` by posting a form
/// submission to a hosted relay.
#[derive(Clone)]
pub struct FormRelayEmailAdapter {
    http: reqwest::Client,
    endpoint: String,
    access_key: String,
    from_name: String,
}

impl FormRelayEmailAdapter {
    /// Creates a new `FormRelayEmailAdapter`.
    pub fn new(
        http: reqwest::Client,
        endpoint: String,
        access_key: String,
        from_name: String,
    ) -> Self {
        Self {
            http,
            endpoint,
            access_key,
            from_name,
        }
    }
}

#[derive(Serialize)]
struct Submission<'a> {
    access_key: &'a str,
    subject: &'a str,
    from_name: &'a str,
    message: &'a str,
    to_email: &'a str,
}

//=========================================================================================
// `EmailDeliveryService` Trait Implementation
//=========================================================================================

#[async_trait]
impl EmailDeliveryService for FormRelayEmailAdapter {
    /// Submits one outbound delivery. Fire-and-forget: nothing is retained
    /// after the outcome is reported.
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> PortResult<()> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&Submission {
                access_key: &self.access_key,
                subject,
                from_name: &self.from_name,
                message: body,
                to_email: recipient,
            })
            .send()
            .await
            .map_err(|e| PortError::Delivery(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            Err(PortError::Delivery(format!(
                "relay returned {}: {}",
                status, detail
            )))
        }
    }
}
