//! HTTP delivery of command results to `response_url`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use tracing::debug;
use uuid::Uuid;

use crate::application::ports::{Callback, CallbackSender};
use crate::shared::errors::CallbackError;

pub struct HttpCallbackSender {
    client: Client,
}

impl HttpCallbackSender {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self, CallbackError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| CallbackError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    fn build_headers(callback: &Callback) -> Result<HeaderMap, CallbackError> {
        let mut headers = HeaderMap::new();
        let mut put = |name: &'static str, value: &str| -> Result<(), CallbackError> {
            let value = HeaderValue::from_str(value)
                .map_err(|_| CallbackError::Request(format!("invalid {name} header")))?;
            headers.insert(name, value);
            Ok(())
        };
        put("x-request-id", &Uuid::new_v4().to_string())?;
        put("x-correlation-id", &callback.correlation_id)?;
        put("ocpi-from-country-code", &callback.from_country_code)?;
        put("ocpi-from-party-id", &callback.from_party_id)?;
        put("ocpi-to-country-code", &callback.to_country_code)?;
        put("ocpi-to-party-id", &callback.to_party_id)?;

        if let Some(party) = &callback.party {
            let value = HeaderValue::from_str(&format!("Token {}", party.token))
                .map_err(|_| CallbackError::Request("invalid party token".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl CallbackSender for HttpCallbackSender {
    async fn send(&self, callback: &Callback) -> Result<(), CallbackError> {
        let headers = Self::build_headers(callback)?;
        let response = self
            .client
            .post(&callback.response_url)
            .headers(headers)
            .json(&callback.body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    CallbackError::Connect(callback.response_url.clone())
                } else {
                    CallbackError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        debug!(
            response_url = callback.response_url.as_str(),
            status = status.as_u16(),
            "Callback answered"
        );
        if status.is_success() {
            Ok(())
        } else {
            Err(CallbackError::Status(status.as_u16()))
        }
    }
}
