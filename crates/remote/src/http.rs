//! HTTP implementation of the remote API.
//!
//! Targets the `generativelanguage` REST surface. The API key is resolved
//! from the environment on every request (hot rotation, never cached) and
//! passed as the `key` query parameter.

use clinidocs_core::{config::AppConfig, AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::api::{FileSearchApi, MAX_PAGE_SIZE};
use crate::types::{DocumentPage, GenerateOutcome, Operation, StagedFile, Store, StorePage};

/// Boundary for the multipart/related upload body.
const UPLOAD_BOUNDARY: &str = "clinidocs-upload-boundary";

/// Reqwest-backed client for the hosted file-search service.
pub struct GenAiHttpApi {
    config: AppConfig,
    client: reqwest::Client,
}

impl GenAiHttpApi {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Resolve the API key from the environment for this one request.
    fn key(&self) -> AppResult<String> {
        self.config.resolve_api_key()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// The media upload endpoint lives under `/upload/v1beta`, parallel to
    /// the metadata surface under `/v1beta`.
    fn upload_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if base.ends_with("/v1beta") {
            format!("{}/upload/v1beta/files", base.trim_end_matches("/v1beta"))
        } else {
            format!("{}/upload/files", base)
        }
    }

    /// Map a non-success status to the typed taxonomy and a success body to T.
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Self::status_error(status, context, &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Transport(format!("{}: invalid response body: {}", context, e)))
    }

    fn status_error(status: reqwest::StatusCode, context: &str, body: &str) -> AppError {
        match status.as_u16() {
            404 => AppError::NotFound(context.to_string()),
            401 | 403 => AppError::CredentialInvalid(format!("{} ({})", context, status)),
            _ => AppError::RemoteOperation(format!("{} ({}): {}", context, status, body)),
        }
    }

    fn send_error(context: &str, err: reqwest::Error) -> AppError {
        AppError::Transport(format!("{}: {}", context, err))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreListResponse {
    #[serde(default)]
    file_search_stores: Option<Vec<Store>>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentListResponse {
    #[serde(default)]
    documents: Option<Vec<crate::types::RemoteDocument>>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateStoreRequest<'a> {
    display_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: StagedFile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportFileRequest<'a> {
    file_name: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    tools: Vec<Tool<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool<'a> {
    file_search: FileSearchTool<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileSearchTool<'a> {
    file_search_store_names: &'a [String],
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Option<Vec<serde_json::Value>>,
}

#[async_trait::async_trait]
impl FileSearchApi for GenAiHttpApi {
    async fn list_stores_page(&self, page_token: Option<&str>) -> AppResult<StorePage> {
        let key = self.key()?;
        let mut request = self
            .client
            .get(self.url("fileSearchStores"))
            .query(&[("key", key.as_str())])
            .query(&[("pageSize", MAX_PAGE_SIZE)]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::send_error("list stores", e))?;

        let body: StoreListResponse = Self::read_json(response, "list stores").await?;

        Ok(StorePage {
            stores: body.file_search_stores.unwrap_or_default(),
            next_page_token: body.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn create_store(&self, display_name: &str) -> AppResult<Store> {
        let key = self.key()?;
        let response = self
            .client
            .post(self.url("fileSearchStores"))
            .query(&[("key", key.as_str())])
            .json(&CreateStoreRequest { display_name })
            .send()
            .await
            .map_err(|e| Self::send_error("create store", e))?;

        Self::read_json(response, "create store").await
    }

    async fn delete_store(&self, name: &str, force: bool) -> AppResult<()> {
        let key = self.key()?;
        let response = self
            .client
            .delete(self.url(name))
            .query(&[("key", key.as_str()), ("force", if force { "true" } else { "false" })])
            .send()
            .await
            .map_err(|e| Self::send_error("delete store", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Self::status_error(status, name, &body));
        }

        Ok(())
    }

    async fn list_documents_page(
        &self,
        store_name: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> AppResult<DocumentPage> {
        let key = self.key()?;
        let mut request = self
            .client
            .get(self.url(&format!("{}/documents", store_name)))
            .query(&[("key", key.as_str())])
            .query(&[("pageSize", page_size.min(MAX_PAGE_SIZE))]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::send_error("list documents", e))?;

        let body: DocumentListResponse = Self::read_json(response, "list documents").await?;

        Ok(DocumentPage {
            documents: body.documents.unwrap_or_default(),
            next_page_token: body.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn upload_file(
        &self,
        bytes: Vec<u8>,
        display_name: &str,
        mime_type: &str,
    ) -> AppResult<StagedFile> {
        let key = self.key()?;

        // multipart/related: JSON metadata part followed by the media part
        let metadata = serde_json::json!({ "file": { "displayName": display_name } });
        let mut body = Vec::with_capacity(bytes.len() + 512);
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{m}\r\n--{b}\r\nContent-Type: {t}\r\n\r\n",
                b = UPLOAD_BOUNDARY,
                m = metadata,
                t = mime_type,
            )
            .as_bytes(),
        );
        body.extend_from_slice(&bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", UPLOAD_BOUNDARY).as_bytes());

        let response = self
            .client
            .post(self.upload_url())
            .query(&[("key", key.as_str()), ("uploadType", "multipart")])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", UPLOAD_BOUNDARY),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| Self::send_error("upload file", e))?;

        let body: UploadResponse = Self::read_json(response, "upload file").await?;
        Ok(body.file)
    }

    async fn import_file(&self, store_name: &str, file_name: &str) -> AppResult<Operation> {
        let key = self.key()?;
        let response = self
            .client
            .post(self.url(&format!("{}:importFile", store_name)))
            .query(&[("key", key.as_str())])
            .json(&ImportFileRequest { file_name })
            .send()
            .await
            .map_err(|e| Self::send_error("import file", e))?;

        Self::read_json(response, "import file").await
    }

    async fn get_operation(&self, operation_name: &str) -> AppResult<Operation> {
        let key = self.key()?;
        let response = self
            .client
            .get(self.url(operation_name))
            .query(&[("key", key.as_str())])
            .send()
            .await
            .map_err(|e| Self::send_error("get operation", e))?;

        Self::read_json(response, "get operation").await
    }

    async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
        store_names: &[String],
    ) -> AppResult<GenerateOutcome> {
        let key = self.key()?;
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
            tools: vec![Tool {
                file_search: FileSearchTool {
                    file_search_store_names: store_names,
                },
            }],
        };

        let response = self
            .client
            .post(self.url(&format!("models/{}:generateContent", model)))
            .query(&[("key", key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::send_error("generate content", e))?;

        let body: GenerateResponse = Self::read_json(response, "generate content").await?;

        let Some(candidate) = body.candidates.and_then(|mut c| {
            if c.is_empty() {
                None
            } else {
                Some(c.remove(0))
            }
        }) else {
            tracing::warn!("No candidates in generation response");
            return Ok(GenerateOutcome::default());
        };

        let grounding_chunk_count = candidate
            .grounding_metadata
            .and_then(|m| m.grounding_chunks)
            .map(|c| c.len())
            .unwrap_or(0);

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(GenerateOutcome {
            text,
            grounding_chunk_count,
        })
    }
}
