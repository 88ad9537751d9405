use crate::markdown::target::{PatchOperation, TargetType, WIRE_DELIMITER};
use crate::vault::config::ObsidianConfig;
use crate::vault::error::VaultError;
use crate::vault::types::{ApiErrorBody, FileInfo, FileList, NoteJson};
use path_absolutize::Absolutize;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{Map, Value};
use std::future::Future;
use std::path::{Component, Path};
use std::pin::Pin;
use tracing::{debug, instrument};

const MARKDOWN: &str = "text/markdown";
const NOTE_JSON: &str = "application/vnd.olrapi.note+json";

/// Vault paths are resolved against this virtual root, so `..` can never
/// leave the vault.
const VIRTUAL_ROOT: &str = "/vault";

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Client for the Obsidian Local REST API plugin.
#[derive(Clone, Debug)]
pub struct ObsidianClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ObsidianClient {
    pub fn new(config: &ObsidianConfig) -> Result<Self, VaultError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self))]
    pub async fn test_connection(&self) -> Result<(), VaultError> {
        let response = self.send(self.request(Method::GET, "/vault/")).await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(VaultError::api(
                status.as_u16(),
                format!("connection test failed with status: {}", status.as_u16()),
            )),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_files_in_vault(&self) -> Result<Vec<FileInfo>, VaultError> {
        self.list("").await
    }

    /// Direct entries of `dir`.
    #[instrument(skip(self))]
    pub async fn list_files_in_dir(&self, dir: &str) -> Result<Vec<FileInfo>, VaultError> {
        let dir = normalize_path(dir)?;
        self.list(&dir).await
    }

    /// Entries of `dir` with sub-directories expanded down to `max_depth`
    /// levels (0 for no limit).
    #[instrument(skip(self))]
    pub async fn list_directory_tree(
        &self,
        dir: &str,
        max_depth: usize,
    ) -> Result<Vec<FileInfo>, VaultError> {
        let dir = normalize_path(dir)?;
        self.list_tree(dir, 1, max_depth).await
    }

    fn list_tree(
        &self,
        dir: String,
        depth: usize,
        max_depth: usize,
    ) -> BoxFuture<'_, Result<Vec<FileInfo>, VaultError>> {
        Box::pin(async move {
            let mut entries = self.list(&dir).await?;

            if max_depth == 0 || depth < max_depth {
                for entry in entries.iter_mut().filter(|entry| entry.is_dir()) {
                    let children = self.list_tree(entry.path.clone(), depth + 1, max_depth).await?;
                    entry.children = Some(children);
                }
            }

            Ok(entries)
        })
    }

    async fn list(&self, dir: &str) -> Result<Vec<FileInfo>, VaultError> {
        let endpoint = if dir.is_empty() {
            "/vault/".to_string()
        } else {
            format!("/vault/{}/", encode_path(dir))
        };

        let response = self.send(self.request(Method::GET, &endpoint)).await?;
        let listing: FileList = response
            .json()
            .await
            .map_err(|err| VaultError::decode(err.to_string()))?;

        Ok(listing
            .files
            .iter()
            .map(|entry| FileInfo::from_listing(dir, entry))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_file_contents(&self, path: &str) -> Result<String, VaultError> {
        let endpoint = self.file_endpoint(path)?;
        let response = self.send(self.request(Method::GET, &endpoint)).await?;

        Ok(response.text().await?)
    }

    #[instrument(skip(self, content))]
    pub async fn append_content(&self, path: &str, content: &str) -> Result<(), VaultError> {
        let endpoint = self.file_endpoint(path)?;
        let request = self
            .request(Method::POST, &endpoint)
            .header(CONTENT_TYPE, MARKDOWN)
            .body(content.to_string());

        self.send(request).await.map(drop)
    }

    #[instrument(skip(self, content))]
    pub async fn put_content(&self, path: &str, content: &str) -> Result<(), VaultError> {
        let endpoint = self.file_endpoint(path)?;
        let request = self
            .request(Method::PUT, &endpoint)
            .header(CONTENT_TYPE, MARKDOWN)
            .body(content.to_string());

        self.send(request).await.map(drop)
    }

    #[instrument(skip(self))]
    pub async fn delete_file(&self, path: &str) -> Result<(), VaultError> {
        let endpoint = self.file_endpoint(path)?;
        self.send(self.request(Method::DELETE, &endpoint))
            .await
            .map(drop)
    }

    /// Insert `content` relative to a heading, block or frontmatter field.
    /// Heading targets are expected in the `::` form.
    #[instrument(skip(self, content))]
    pub async fn patch_content(
        &self,
        path: &str,
        operation: PatchOperation,
        target_type: TargetType,
        target: &str,
        content: &str,
    ) -> Result<(), VaultError> {
        let endpoint = self.file_endpoint(path)?;
        let mut request = self
            .request(Method::PATCH, &endpoint)
            .header(CONTENT_TYPE, MARKDOWN)
            .header("Operation", operation.as_str())
            .header("Target-Type", target_type.as_str())
            .header("Target", urlencoding::encode(target).into_owned())
            .header("Trim-Target-Whitespace", "true");

        if target_type == TargetType::Heading && target.contains(WIRE_DELIMITER) {
            request = request.header("Target-Delimiter", WIRE_DELIMITER);
        }

        self.send(request.body(content.to_string())).await.map(drop)
    }

    #[instrument(skip(self))]
    pub async fn get_frontmatter(&self, path: &str) -> Result<Map<String, Value>, VaultError> {
        let endpoint = self.file_endpoint(path)?;
        let request = self.request(Method::GET, &endpoint).header(ACCEPT, NOTE_JSON);
        let note: NoteJson = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|err| VaultError::decode(err.to_string()))?;

        Ok(note.frontmatter)
    }

    /// Replace (or create) one frontmatter field. The value is sent as a JSON
    /// string.
    #[instrument(skip(self))]
    pub async fn set_frontmatter(&self, path: &str, field: &str, value: &str) -> Result<(), VaultError> {
        let endpoint = self.file_endpoint(path)?;
        let request = self
            .request(Method::PATCH, &endpoint)
            .header("Operation", PatchOperation::Replace.as_str())
            .header("Target-Type", TargetType::Frontmatter.as_str())
            .header("Target", urlencoding::encode(field.trim()).into_owned())
            .header("Create-Target-If-Missing", "true")
            .json(&value);

        self.send(request).await.map(drop)
    }

    fn file_endpoint(&self, path: &str) -> Result<String, VaultError> {
        let path = normalize_path(path)?;
        if path.is_empty() {
            return Err(VaultError::invalid_path("file path cannot be empty"));
        }

        Ok(format!("/vault/{}", encode_path(&path)))
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        debug!(%method, endpoint, "obsidian request");
        self.http
            .request(method, format!("{}{}", self.base_url, endpoint))
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, VaultError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(error) => format!("{} (code {})", error.message, error.error_code),
                Err(_) => body,
            };
            debug!(status = status.as_u16(), %message, "obsidian request failed");

            return Err(VaultError::api(status.as_u16(), message));
        }

        Ok(response)
    }
}

/// Resolve `path` inside the vault and return it relative to the vault root,
/// `/`-separated. Leading slashes and `.` segments are dropped; `..` may not
/// climb above the root.
pub fn normalize_path(path: &str) -> Result<String, VaultError> {
    let relative = path.trim().trim_start_matches('/');
    if relative.is_empty() {
        return Ok(String::new());
    }

    // Anchored at the virtual root so `..` is resolved against it and not
    // against the working directory.
    let joined = Path::new(VIRTUAL_ROOT).join(relative);
    let resolved = joined
        .absolutize_virtually(VIRTUAL_ROOT)
        .map_err(|_| VaultError::invalid_path_traversal(path))?;

    let inside = resolved
        .strip_prefix(VIRTUAL_ROOT)
        .map_err(|_| VaultError::invalid_path_traversal(path))?;

    let mut segments = Vec::new();
    for component in inside.components() {
        match component {
            Component::Normal(segment) => match segment.to_str() {
                Some(segment) => segments.push(segment),
                None => return Err(VaultError::invalid_path(format!("{:?} is not valid UTF-8", path))),
            },
            _ => return Err(VaultError::invalid_path_traversal(path)),
        }
    }

    Ok(segments.join("/"))
}

/// Percent-encode every segment of an already normalized path.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::mock::MockVault;
    use crate::vault::types::FileType;
    use axum::http::Method as HttpMethod;
    use serde_json::json;

    const INDEX: &str = "---\nstatus: draft\n---\n# Index";

    #[test]
    fn should_normalize_vault_paths() {
        assert_eq!("notes/a.md", normalize_path("notes/a.md").unwrap());
        assert_eq!("notes/a.md", normalize_path("/notes/./a.md").unwrap());
        assert_eq!("a.md", normalize_path("notes/../a.md").unwrap());
        assert_eq!("", normalize_path(" / ").unwrap());

        match normalize_path("../outside.md") {
            Err(VaultError::InvalidPath { reason }) => {
                assert_eq!("path traversal detected: \"../outside.md\"", reason)
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(normalize_path("notes/../../x.md").is_err());
    }

    #[test]
    fn should_encode_each_segment() {
        assert_eq!("Daily%20Notes/a%23b.md", encode_path("Daily Notes/a#b.md"));
    }

    #[tokio::test]
    async fn should_test_connection() {
        let vault = MockVault::spawn(&[]).await;

        assert!(vault.client().test_connection().await.is_ok());

        let err = vault.client_with_key("wrong").test_connection().await.unwrap_err();
        assert_eq!(Some(401), err.status());
        assert_eq!("API error 401: Authorization required (code 40101)", err.to_string());
    }

    #[tokio::test]
    async fn should_list_files() {
        let vault = MockVault::spawn(&[]).await;
        let client = vault.client();

        let files = client.list_files_in_vault().await.unwrap();
        assert_eq!(2, files.len());
        assert_eq!(FileType::Directory, files[0].file_type);
        assert_eq!("index.md", files[1].path);

        let files = client.list_files_in_dir("/Projects").await.unwrap();
        let paths: Vec<&str> = files.iter().map(|file| file.path.as_str()).collect();
        assert_eq!(vec!["Projects/Archive", "Projects/plan.md"], paths);
    }

    #[tokio::test]
    async fn should_expand_directory_tree_within_depth() {
        let vault = MockVault::spawn(&[]).await;
        let client = vault.client();

        let tree = client.list_directory_tree("Projects", 2).await.unwrap();
        let archive = tree[0].children.as_ref().unwrap();
        assert_eq!("Projects/Archive/old.md", archive[0].path);
        assert!(tree[1].children.is_none());

        let shallow = client.list_directory_tree("Projects", 1).await.unwrap();
        assert!(shallow[0].children.is_none());
    }

    #[tokio::test]
    async fn should_read_file_with_encoded_path() {
        let vault = MockVault::spawn(&[("Daily Notes/2024-01-01.md", "# Today")]).await;
        let client = vault.client();

        assert_eq!("# Today", client.get_file_contents("Daily Notes/2024-01-01.md").await.unwrap());
        assert_eq!("Daily Notes/2024-01-01.md", vault.requests()[0].path);

        let err = client.get_file_contents("missing.md").await.unwrap_err();
        assert_eq!(Some(404), err.status());
        assert!(err.to_string().contains("File not found"));
    }

    #[tokio::test]
    async fn should_reject_traversal_before_sending() {
        let vault = MockVault::spawn(&[]).await;

        let err = vault.client().get_file_contents("../../etc/passwd").await.unwrap_err();
        assert!(matches!(err, VaultError::InvalidPath { .. }));
        assert!(vault.requests().is_empty());
    }

    #[tokio::test]
    async fn should_send_write_requests() {
        let vault = MockVault::spawn(&[]).await;
        let client = vault.client();

        client.append_content("index.md", "more").await.unwrap();
        client.put_content("new.md", "# New").await.unwrap();
        client.delete_file("old.md").await.unwrap();

        let requests = vault.requests();
        assert_eq!(HttpMethod::POST, requests[0].method);
        assert_eq!("more", requests[0].body);
        assert_eq!(MARKDOWN, requests[0].headers["content-type"]);
        assert_eq!(HttpMethod::PUT, requests[1].method);
        assert_eq!("new.md", requests[1].path);
        assert_eq!(HttpMethod::DELETE, requests[2].method);
    }

    #[tokio::test]
    async fn should_send_patch_headers() {
        let vault = MockVault::spawn(&[]).await;
        let client = vault.client();

        client
            .patch_content(
                "index.md",
                PatchOperation::Append,
                TargetType::Heading,
                "Index::Setup Steps",
                "- new",
            )
            .await
            .unwrap();
        client
            .patch_content("index.md", PatchOperation::Replace, TargetType::Block, "abc", "x")
            .await
            .unwrap();

        let requests = vault.requests();
        let headers = &requests[0].headers;
        assert_eq!("append", headers["operation"]);
        assert_eq!("heading", headers["target-type"]);
        assert_eq!("Index%3A%3ASetup%20Steps", headers["target"]);
        assert_eq!("::", headers["target-delimiter"]);
        assert_eq!("true", headers["trim-target-whitespace"]);
        assert_eq!("- new", requests[0].body);

        assert!(requests[1].headers.get("target-delimiter").is_none());
        assert_eq!("block", requests[1].headers["target-type"]);
    }

    #[tokio::test]
    async fn should_get_and_set_frontmatter() {
        let vault = MockVault::spawn(&[("index.md", INDEX)]).await;
        let client = vault.client();

        let frontmatter = client.get_frontmatter("index.md").await.unwrap();
        assert_eq!(json!("draft"), frontmatter["status"]);

        client.set_frontmatter("index.md", "status", "done").await.unwrap();

        let requests = vault.requests();
        let set = &requests[1];
        assert_eq!(HttpMethod::PATCH, set.method);
        assert_eq!("\"done\"", set.body);
        assert_eq!("frontmatter", set.headers["target-type"]);
        assert_eq!("replace", set.headers["operation"]);
        assert_eq!("true", set.headers["create-target-if-missing"]);
        assert_eq!("application/json", set.headers["content-type"]);
    }
}
