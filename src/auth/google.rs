//! Service-account and installed-app flows backed by `yup-oauth2`.

use std::path::Path;

use tracing::info;
use yup_oauth2::{
    AccessToken, InstalledFlowAuthenticator, InstalledFlowReturnMethod,
    ServiceAccountAuthenticator,
};

use super::token::{DRIVE_SCOPE, TokenSource};
use crate::{DriveError, Result};

fn bearer_from(token: std::result::Result<AccessToken, yup_oauth2::Error>) -> Result<String> {
    let token = token.map_err(|err| DriveError::Auth(format!("token request failed: {err}")))?;
    token
        .token()
        .filter(|token| !token.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| DriveError::Auth("token response missing access_token".to_string()))
}

impl TokenSource {
    /// Signs JWT bearer grants with the key in `key_path` (a service account JSON key).
    pub async fn service_account(key_path: &Path) -> Result<Self> {
        let key = yup_oauth2::read_service_account_key(key_path)
            .await
            .map_err(|err| {
                DriveError::Auth(format!(
                    "read service account key {} failed: {err}",
                    key_path.display()
                ))
            })?;
        info!(client_email = key.client_email.as_str(), "using service account");

        let auth = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|err| DriveError::Auth(format!("service account setup failed: {err}")))?;

        Ok(Self::from_fn("service_account", move || {
            let auth = auth.clone();
            async move { bearer_from(auth.token(&[DRIVE_SCOPE]).await) }
        }))
    }

    /// Browser-delegated consent. The first token request opens a local redirect listener and
    /// prints the consent URL; tokens are cached at `token_cache_path` when given.
    pub async fn installed_flow(
        client_secret_path: &Path,
        token_cache_path: Option<&Path>,
    ) -> Result<Self> {
        let secret = yup_oauth2::read_application_secret(client_secret_path)
            .await
            .map_err(|err| {
                DriveError::Auth(format!(
                    "read client secret {} failed: {err}",
                    client_secret_path.display()
                ))
            })?;

        let mut builder =
            InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::HTTPRedirect);
        if let Some(path) = token_cache_path {
            builder = builder.persist_tokens_to_disk(path.to_path_buf());
        }
        let auth = builder
            .build()
            .await
            .map_err(|err| DriveError::Auth(format!("installed flow setup failed: {err}")))?;

        Ok(Self::from_fn("installed_flow", move || {
            let auth = auth.clone();
            async move { bearer_from(auth.token(&[DRIVE_SCOPE]).await) }
        }))
    }
}
