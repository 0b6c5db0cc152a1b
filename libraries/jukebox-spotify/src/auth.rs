//! Token exchange against the accounts service.

use crate::error::{error_from_response, Endpoint, Result, RemoteServiceError};
use crate::types::{SpotifyConfig, TokenGrant, TokenResponse};
use reqwest::Client;
use tracing::{debug, warn};

/// Authentication client for the accounts service.
pub struct AuthClient<'a> {
    http: &'a Client,
    config: &'a SpotifyConfig,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(http: &'a Client, config: &'a SpotifyConfig) -> Self {
        Self { http, config }
    }

    fn token_url(&self) -> String {
        format!("{}/api/token", self.config.accounts_url)
    }

    /// Client-credentials flow, authenticated with HTTP basic auth.
    pub async fn client_credentials(&self) -> Result<TokenGrant> {
        let url = self.token_url();
        debug!(url = %url, "Requesting client credentials token");

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        self.read_grant(response).await
    }

    /// Authorization-code flow.
    pub async fn authorization_code(&self, code: &str) -> Result<TokenGrant> {
        let url = self.token_url();
        debug!(url = %url, "Exchanging authorization code");

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        let grant = self.read_grant(response).await?;
        if grant.refresh_token.is_none() {
            warn!("Authorization code exchange returned no refresh token");
        }
        Ok(grant)
    }

    /// Refresh an expired user access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let url = self.token_url();
        debug!(url = %url, "Refreshing access token");

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        self.read_grant(response).await
    }

    /// Authorization page URL for the clerk's browser.
    pub fn authorize_url(&self, state: &str) -> String {
        let base = format!("{}/authorize", self.config.accounts_url);
        let scope = self.config.scopes.join(" ");
        let params = [
            ("response_type", "code"),
            ("client_id", self.config.client_id.as_str()),
            ("scope", scope.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("state", state),
        ];

        match url::Url::parse_with_params(&base, &params) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(error = %e, base = %base, "Invalid accounts URL, building authorize URL by hand");
                let query = params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join("&");
                format!("{}?{}", base, query)
            }
        }
    }

    async fn read_grant(&self, response: reqwest::Response) -> Result<TokenGrant> {
        let status = response.status();

        if status.is_success() {
            let token: TokenResponse = response.json().await.map_err(|e| {
                RemoteServiceError::Transient(format!("Failed to parse token response: {}", e))
            })?;
            debug!(expires_in = token.expires_in, "Token exchange successful");
            Ok(token.into())
        } else {
            let err = error_from_response(response, Endpoint::Token).await;
            warn!(status = %status, error = %err, "Token exchange rejected");
            Err(err)
        }
    }
}
