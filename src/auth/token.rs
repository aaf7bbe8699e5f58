use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use reqwest::header::HeaderValue;
use tracing::debug;

use crate::config::{DEFAULT_ACCESS_TOKEN_KEYS, DriveAuth, Env, resolve_field, resolve_key_path};
use crate::{DriveError, Result};

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

type TokenFetch = dyn Fn() -> BoxFuture<'static, Result<String>> + Send + Sync;

/// An authorized client handle.
///
/// Built once and passed to [`DriveClient`](crate::DriveClient); cloning shares the
/// underlying authenticator and its token cache.
#[derive(Clone)]
pub struct TokenSource {
    kind: &'static str,
    fetch: Arc<TokenFetch>,
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSource")
            .field("kind", &self.kind)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TokenSource {
    pub fn from_fn<F, Fut>(kind: &'static str, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            kind,
            fetch: Arc::new(move || fetch().boxed()),
        }
    }

    /// A fixed bearer token, e.g. one minted by `gcloud auth print-access-token`.
    pub fn static_token(token: impl Into<String>) -> Result<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(DriveError::Auth("access token must be non-empty".to_string()));
        }
        Ok(Self::from_fn("static", move || {
            let token = token.clone();
            async move { Ok(token) }
        }))
    }

    pub async fn from_auth(auth: &DriveAuth, env: &Env) -> Result<Self> {
        match auth {
            DriveAuth::ServiceAccount {
                key_path,
                key_path_keys,
            } => {
                let path = resolve_key_path(env, key_path.as_deref(), key_path_keys)?;
                Self::from_service_account_path(&path).await
            }
            DriveAuth::InstalledFlow {
                client_secret_path,
                token_cache_path,
            } => {
                Self::from_installed_flow_paths(
                    std::path::Path::new(client_secret_path),
                    token_cache_path.as_deref().map(std::path::Path::new),
                )
                .await
            }
            DriveAuth::AccessTokenEnv { keys } => {
                let token =
                    resolve_field(env, None, keys, DEFAULT_ACCESS_TOKEN_KEYS, "access token")?;
                Self::static_token(token)
            }
        }
    }

    pub fn kind(&self) -> &str {
        self.kind
    }

    pub async fn token(&self) -> Result<String> {
        let token = (self.fetch)().await?;
        debug!(kind = self.kind, "obtained access token");
        Ok(token)
    }

    pub(crate) async fn authorization(&self) -> Result<HeaderValue> {
        let token = self.token().await?;
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|err| {
            DriveError::Auth(format!("access token is not a valid header value: {err}"))
        })?;
        value.set_sensitive(true);
        Ok(value)
    }

    #[cfg(feature = "oauth")]
    async fn from_service_account_path(path: &std::path::Path) -> Result<Self> {
        Self::service_account(path).await
    }

    #[cfg(not(feature = "oauth"))]
    async fn from_service_account_path(path: &std::path::Path) -> Result<Self> {
        Err(DriveError::Config(format!(
            "service account key {} requires the `oauth` feature",
            path.display()
        )))
    }

    #[cfg(feature = "oauth")]
    async fn from_installed_flow_paths(
        client_secret_path: &std::path::Path,
        token_cache_path: Option<&std::path::Path>,
    ) -> Result<Self> {
        Self::installed_flow(client_secret_path, token_cache_path).await
    }

    #[cfg(not(feature = "oauth"))]
    async fn from_installed_flow_paths(
        client_secret_path: &std::path::Path,
        _token_cache_path: Option<&std::path::Path>,
    ) -> Result<Self> {
        Err(DriveError::Config(format!(
            "installed flow secret {} requires the `oauth` feature",
            client_secret_path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_yields_bearer_header() -> Result<()> {
        let tokens = TokenSource::static_token("  ya29.abc \n")?;
        assert_eq!(tokens.kind(), "static");
        assert_eq!(tokens.token().await?, "ya29.abc");

        let header = tokens.authorization().await?;
        assert!(header.is_sensitive());
        assert_eq!(header.to_str().unwrap_or_default(), "Bearer ya29.abc");
        Ok(())
    }

    #[test]
    fn static_token_rejects_blank() {
        let err = TokenSource::static_token("   ").expect_err("blank token");
        assert!(matches!(err, DriveError::Auth(_)), "{err}");
    }

    #[test]
    fn debug_redacts_token() -> Result<()> {
        let tokens = TokenSource::static_token("ya29.secret")?;
        let rendered = format!("{tokens:?}");
        assert!(!rendered.contains("ya29.secret"));
        assert!(rendered.contains("<redacted>"));
        Ok(())
    }

    #[tokio::test]
    async fn access_token_env_reads_custom_keys() -> Result<()> {
        let env = Env::from_dotenv_str("GDRIVE_TEST_TOKEN=tok-from-env\n")?;
        let auth = DriveAuth::AccessTokenEnv {
            keys: vec!["GDRIVE_TEST_TOKEN".to_string()],
        };
        let tokens = TokenSource::from_auth(&auth, &env).await?;
        assert_eq!(tokens.token().await?, "tok-from-env");
        Ok(())
    }

    #[tokio::test]
    async fn access_token_env_reports_tried_keys() {
        let auth = DriveAuth::AccessTokenEnv {
            keys: vec!["GDRIVE_TEST_UNSET_TOKEN".to_string()],
        };
        let err = TokenSource::from_auth(&auth, &Env::default())
            .await
            .expect_err("missing token");
        assert!(err.to_string().contains("GDRIVE_TEST_UNSET_TOKEN"), "{err}");
    }

    #[tokio::test]
    async fn missing_service_account_key_is_an_error() -> Result<()> {
        let env = Env::from_dotenv_str("GDRIVE_TEST_KEY=/nonexistent/gdrive-key.json\n")?;
        let auth = DriveAuth::ServiceAccount {
            key_path: None,
            key_path_keys: vec!["GDRIVE_TEST_KEY".to_string()],
        };
        let err = TokenSource::from_auth(&auth, &env)
            .await
            .expect_err("missing key file");
        assert!(err.to_string().contains("gdrive-key.json"), "{err}");
        Ok(())
    }
}
