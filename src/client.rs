use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::auth::TokenSource;
use crate::config::{DEFAULT_BASE_URL, DEFAULT_UPLOAD_BASE_URL, DriveConfig, Env, HttpTimeouts};
use crate::query::{FOLDER_MIME_TYPE, MAX_PAGE_SIZE, Query};
use crate::store::{RemoteEntry, RemoteStore, UploadRequest};
use crate::utils::http::{location_header, send_checked, send_checked_json};
use crate::{DriveError, Result};

const LIST_FIELDS: &str = "files(id,name,mimeType,parents,trashed)";

#[derive(Debug, Deserialize)]
struct FilesListResponse {
    #[serde(default)]
    files: Vec<RemoteEntry>,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

/// Drive v3 over HTTP.
#[derive(Debug, Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    base_url: String,
    upload_base_url: String,
    tokens: TokenSource,
}

impl DriveClient {
    pub fn new(tokens: TokenSource) -> Result<Self> {
        let http = build_http_client(HttpTimeouts::default(), &BTreeMap::new())?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            tokens,
        })
    }

    pub async fn from_config(config: &DriveConfig, env: &Env) -> Result<Self> {
        let tokens = TokenSource::from_auth(&config.auth(), env).await?;
        let http = build_http_client(config.timeouts(), &config.http_headers)?;
        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            upload_base_url: config.upload_base_url().to_string(),
            tokens,
        })
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_upload_base_url(mut self, upload_base_url: impl Into<String>) -> Self {
        self.upload_base_url = upload_base_url.into();
        self
    }

    pub fn tokens(&self) -> &TokenSource {
        &self.tokens
    }

    async fn authorized(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        Ok(req.header(AUTHORIZATION, self.tokens.authorization().await?))
    }

    /// Opens a resumable session with `metadata`, then streams the file into it.
    async fn resumable_upload(
        &self,
        init: reqwest::RequestBuilder,
        metadata: serde_json::Value,
        request: UploadRequest,
    ) -> Result<String> {
        let init = init
            .query(&[("uploadType", "resumable"), ("fields", "id")])
            .header("X-Upload-Content-Type", request.mime_type.as_str())
            .header("X-Upload-Content-Length", request.len)
            .json(&metadata);
        let response = send_checked(self.authorized(init).await?).await?;
        let session_uri = location_header(&response)?;
        debug!(name = request.name.as_str(), "resumable session opened");

        let body = reqwest::Body::wrap_stream(ReaderStream::new(request.file));
        let put = self
            .http
            .put(session_uri)
            .header(CONTENT_LENGTH, request.len)
            .body(body);
        let parsed = send_checked_json::<IdResponse>(self.authorized(put).await?).await?;
        Ok(parsed.id)
    }
}

#[async_trait]
impl RemoteStore for DriveClient {
    async fn query(&self, query: &Query) -> Result<Vec<RemoteEntry>> {
        let page_size = MAX_PAGE_SIZE.to_string();
        let q = query.render();
        let mut req = self
            .http
            .get(join_endpoint(&self.base_url, "files"))
            .query(&[("pageSize", page_size.as_str()), ("fields", LIST_FIELDS)]);
        if !q.is_empty() {
            req = req.query(&[("q", q.as_str())]);
        }
        let parsed = send_checked_json::<FilesListResponse>(self.authorized(req).await?).await?;
        debug!(q = q.as_str(), count = parsed.files.len(), "files.list");
        Ok(parsed.files)
    }

    async fn create_file(&self, request: UploadRequest) -> Result<String> {
        let metadata = json!({
            "name": request.name,
            "mimeType": request.mime_type,
            "parents": request.parents,
        });
        let init = self.http.post(join_endpoint(&self.upload_base_url, "files"));
        self.resumable_upload(init, metadata, request).await
    }

    async fn update_file(&self, file_id: &str, request: UploadRequest) -> Result<String> {
        let metadata = json!({
            "name": request.name,
            "mimeType": request.mime_type,
        });
        let init = self.http.patch(join_endpoint(
            &self.upload_base_url,
            &format!("files/{file_id}"),
        ));
        self.resumable_upload(init, metadata, request).await
    }

    async fn create_folder(&self, name: &str, parents: &[String]) -> Result<String> {
        let metadata = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": parents,
        });
        let req = self
            .http
            .post(join_endpoint(&self.base_url, "files"))
            .query(&[("fields", "id")])
            .json(&metadata);
        let parsed = send_checked_json::<IdResponse>(self.authorized(req).await?).await?;
        Ok(parsed.id)
    }

    async fn download(
        &self,
        file_id: &str,
        dest: &Path,
        progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<u64> {
        let req = self
            .http
            .get(join_endpoint(&self.base_url, &format!("files/{file_id}")))
            .query(&[("alt", "media")]);
        let response = send_checked(self.authorized(req).await?).await?;
        let total = response.content_length().filter(|len| *len > 0);

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            if let Some(total) = total {
                progress((written as f64 / total as f64).min(1.0));
            }
        }
        file.flush().await?;

        if total.is_none() {
            progress(1.0);
        }
        Ok(written)
    }
}

pub(crate) fn join_endpoint(base_url: &str, endpoint: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    format!("{base}/{endpoint}")
}

fn header_map_from_pairs(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            DriveError::Config(format!("invalid http header name {name:?}: {err}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|err| {
            DriveError::Config(format!("invalid http header value for {name:?}: {err}"))
        })?;
        out.insert(header_name, header_value);
    }
    Ok(out)
}

fn build_http_client(
    timeouts: HttpTimeouts,
    headers: &BTreeMap<String, String>,
) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().connect_timeout(timeouts.connect);
    if let Some(total) = timeouts.total {
        builder = builder.timeout(total);
    }
    if !headers.is_empty() {
        builder = builder.default_headers(header_map_from_pairs(headers)?);
    }
    builder.build().map_err(DriveError::RemoteUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_endpoints_without_double_slashes() {
        assert_eq!(
            join_endpoint("https://www.googleapis.com/drive/v3/", "/files"),
            "https://www.googleapis.com/drive/v3/files"
        );
        assert_eq!(join_endpoint("http://h/x", "files/abc"), "http://h/x/files/abc");
    }

    #[test]
    fn rejects_invalid_default_headers() {
        let headers = BTreeMap::from([("bad header".to_string(), "v".to_string())]);
        let err = header_map_from_pairs(&headers).expect_err("invalid name");
        assert!(matches!(err, DriveError::Config(_)), "{err}");
    }
}
