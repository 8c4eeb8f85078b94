//! OAuth client-credentials token exchange.

use serde::{Deserialize, Serialize};

use crate::domain::error::DcaError;

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenResponse {
    pub(crate) fn into_token(self) -> Result<String, DcaError> {
        match self.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(DcaError::Api {
                reason: format!(
                    "error obtaining access token: {}",
                    self.error_description
                        .or(self.error)
                        .unwrap_or_else(|| "no access_token in response".to_string())
                ),
            }),
        }
    }
}

pub fn request_access_token(
    client: &reqwest::blocking::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String, DcaError> {
    let form = TokenRequest {
        grant_type: "client_credentials",
        client_id,
        client_secret,
    };

    tracing::debug!(%token_url, "requesting access token");
    let response = client
        .post(token_url)
        .form(&form)
        .send()
        .map_err(|e| DcaError::Api {
            reason: format!("token request failed: {e}"),
        })?;

    let body: TokenResponse = response.json().map_err(|e| DcaError::Api {
        reason: format!("token response was not JSON: {e}"),
    })?;
    body.into_token()
}
