use crate::markdown::error::TargetError;
use crate::markdown::headings::{extract_headings, find_heading};
use crate::markdown::resolver::{ResolveMode, resolve_with, split_path, validate_heading_target};
use crate::markdown::select::{Selector, SelectorType, select};
use crate::markdown::structure::discover;
use crate::markdown::target::{PatchOperation, TargetType, normalize_target};
use crate::markdown::{Forest, parse};
use crate::mcp::render;
use crate::mcp::requests::*;
use crate::vault::client::ObsidianClient;
use crate::vault::error::VaultError;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use std::sync::Arc;
use tracing::instrument;

const INSTRUCTIONS: &str = "This server gives access to an Obsidian vault through the Local REST API plugin. \
Use obsidian_discover_structure to list the patch targets of a note before calling obsidian_patch_content. \
Nested heading targets are written as \"Parent -> Child\".";

#[derive(Clone, Debug)]
pub struct ObsidianMCP {
    tool_router: ToolRouter<ObsidianMCP>,
    client: Arc<ObsidianClient>,
}

fn success(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

fn failure(text: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(text.into())])
}

fn require(name: &str, value: &str) -> Result<(), McpError> {
    if value.trim().is_empty() {
        return Err(McpError::invalid_params(format!("{} cannot be empty", name), None));
    }
    Ok(())
}

fn store_error(context: String, err: VaultError) -> McpError {
    tracing::error!(%err, "{}", context);
    match err {
        VaultError::InvalidPath { .. } => McpError::invalid_params(format!("{}: {}", context, err), None),
        _ => McpError::internal_error(format!("{}: {}", context, err), None),
    }
}

fn invalid_argument(err: TargetError) -> McpError {
    McpError::invalid_params(err.to_string(), None)
}

fn serialization_error(err: serde_json::Error) -> McpError {
    McpError::internal_error(format!("failed to serialize result: {}", err), None)
}

#[tool_router]
impl ObsidianMCP {
    pub fn new(client: Arc<ObsidianClient>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            client,
        }
    }

    async fn read_document(&self, filepath: &str) -> Result<String, McpError> {
        require("filepath", filepath)?;
        self.client
            .get_file_contents(filepath)
            .await
            .map_err(|err| store_error(format!("failed to get file contents for {}", filepath), err))
    }

    async fn read_forest(&self, filepath: &str) -> Result<Forest, McpError> {
        Ok(parse(&self.read_document(filepath).await?))
    }

    #[tool(description = "Check that the Obsidian Local REST API is reachable with the configured key")]
    #[instrument(skip(self))]
    async fn obsidian_test_connection(&self) -> Result<CallToolResult, McpError> {
        self.client
            .test_connection()
            .await
            .map_err(|err| store_error("connection test failed".to_string(), err))?;

        Ok(success(render::connection(self.client.base_url())))
    }

    #[tool(description = "List all files and directories in the root of the vault")]
    #[instrument(skip(self))]
    async fn obsidian_list_files_in_vault(&self) -> Result<CallToolResult, McpError> {
        let files = self
            .client
            .list_files_in_vault()
            .await
            .map_err(|err| store_error("failed to list files in vault".to_string(), err))?;

        Ok(success(render::vault_files(&files)))
    }

    #[tool(description = "List the files of a vault directory as JSON, expanding sub-directories down to max_depth levels (default 3, 0 for no limit)")]
    #[instrument(skip(self))]
    async fn obsidian_list_files_in_dir(
        &self,
        Parameters(ListFilesInDirRequest { dirpath, max_depth }): Parameters<ListFilesInDirRequest>,
    ) -> Result<CallToolResult, McpError> {
        require("dirpath", &dirpath)?;

        let items = self
            .client
            .list_directory_tree(&dirpath, max_depth)
            .await
            .map_err(|err| store_error(format!("failed to list files in directory {}", dirpath), err))?;

        let json = render::directory_listing(&dirpath, max_depth, &items).map_err(serialization_error)?;
        Ok(success(json))
    }

    #[tool(description = "Return the raw content of a file in the vault")]
    #[instrument(skip(self))]
    async fn obsidian_get_file_contents(
        &self,
        Parameters(FileRequest { filepath }): Parameters<FileRequest>,
    ) -> Result<CallToolResult, McpError> {
        let content = self.read_document(&filepath).await?;
        Ok(success(render::file_contents(&filepath, &content)))
    }

    #[tool(description = "Append content to the end of a file, creating it if it does not exist")]
    #[instrument(skip(self, content))]
    async fn obsidian_append_content(
        &self,
        Parameters(WriteContentRequest { filepath, content }): Parameters<WriteContentRequest>,
    ) -> Result<CallToolResult, McpError> {
        require("filepath", &filepath)?;

        self.client
            .append_content(&filepath, &content)
            .await
            .map_err(|err| store_error(format!("failed to append content to {}", filepath), err))?;

        Ok(success(format!(
            "Successfully appended content to {}\n\nContent appended:\n{}",
            filepath, content
        )))
    }

    #[tool(description = "Create a file or replace its whole content")]
    #[instrument(skip(self, content))]
    async fn obsidian_put_content(
        &self,
        Parameters(WriteContentRequest { filepath, content }): Parameters<WriteContentRequest>,
    ) -> Result<CallToolResult, McpError> {
        require("filepath", &filepath)?;

        self.client
            .put_content(&filepath, &content)
            .await
            .map_err(|err| store_error(format!("failed to put content to {}", filepath), err))?;

        Ok(success(format!("Successfully created/updated {}", filepath)))
    }

    #[tool(description = "Delete a file or directory from the vault. Requires confirm=true")]
    #[instrument(skip(self))]
    async fn obsidian_delete_file(
        &self,
        Parameters(DeleteFileRequest { filepath, confirm }): Parameters<DeleteFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        require("filepath", &filepath)?;
        if !confirm {
            return Err(McpError::invalid_params(
                format!("deleting {} requires confirm=true", filepath),
                None,
            ));
        }

        self.client
            .delete_file(&filepath)
            .await
            .map_err(|err| store_error(format!("failed to delete {}", filepath), err))?;

        Ok(success(format!("Successfully deleted {}", filepath)))
    }

    #[tool(description = "Insert content relative to a heading, block reference or frontmatter field. \
        operation is append, prepend or replace; target_type is heading, block or frontmatter. \
        Nested heading targets use \"Parent -> Child\"; heading targets are checked against the file first")]
    #[instrument(skip(self, content))]
    async fn obsidian_patch_content(
        &self,
        Parameters(PatchContentRequest { filepath, operation, target_type, target, content }): Parameters<PatchContentRequest>,
    ) -> Result<CallToolResult, McpError> {
        require("filepath", &filepath)?;
        require("target", &target)?;

        let target_type: TargetType = target_type.parse().map_err(invalid_argument)?;
        let operation: PatchOperation = operation.parse().map_err(invalid_argument)?;
        let mut target = normalize_target(target_type, &target);

        if target_type == TargetType::Heading {
            let forest = self.read_forest(&filepath).await?;
            match validate_heading_target(&forest, &target) {
                Ok(exact) => target = exact,
                Err(err @ TargetError::NotFound { .. }) => {
                    tracing::debug!(%err, "patch target rejected");
                    return Ok(failure(format!("{} in file {}", err, filepath)));
                }
                Err(err) => return Err(invalid_argument(err)),
            }
        }

        if let Err(err) = self
            .client
            .patch_content(&filepath, operation, target_type, &target, &content)
            .await
        {
            tracing::error!(%err, %filepath, %target, "patch failed");
            return Err(McpError::internal_error(
                render::patch_failed(&filepath, &err.to_string(), operation, target_type, &target, content.len()),
                None,
            ));
        }

        Ok(success(render::patched(&filepath, operation, target_type, &target, &content)))
    }

    #[tool(description = "List every patch target of a file as JSON: heading paths (down to max_depth, default 3, 0 for no limit), block references and frontmatter fields")]
    #[instrument(skip(self))]
    async fn obsidian_discover_structure(
        &self,
        Parameters(DiscoverStructureRequest { filepath, max_depth }): Parameters<DiscoverStructureRequest>,
    ) -> Result<CallToolResult, McpError> {
        let forest = self.read_forest(&filepath).await?;
        let structure = discover(filepath.as_str(), &forest, max_depth);

        let json = serde_json::to_string_pretty(&structure).map_err(serialization_error)?;
        Ok(success(json))
    }

    #[tool(description = "Return the content under a heading path such as \"Setup -> Install -> Linux\". \
        Each segment must be a direct sub-heading of the previous one unless permissive=true")]
    #[instrument(skip(self))]
    async fn obsidian_get_nested_content(
        &self,
        Parameters(NestedContentRequest { filepath, nested_path, permissive }): Parameters<NestedContentRequest>,
    ) -> Result<CallToolResult, McpError> {
        let segments = split_path(&nested_path);
        let forest = self.read_forest(&filepath).await?;
        let mode = if permissive {
            ResolveMode::Permissive
        } else {
            ResolveMode::Strict
        };

        match resolve_with(&forest, &segments, mode) {
            Ok(node) => Ok(success(render::nested_content(&filepath, &nested_path, node))),
            Err(err @ TargetError::NotFound { .. }) => {
                Ok(failure(render::not_found(&err.to_string(), forest.roots())))
            }
            Err(err) => Err(invalid_argument(err)),
        }
    }

    #[tool(description = "Select headings, block-reference candidates or frontmatter from a file. \
        selector_type is heading, block or frontmatter; an empty query selects everything of that type")]
    #[instrument(skip(self))]
    async fn obsidian_read_content(
        &self,
        Parameters(ReadContentRequest { filepath, selector_type, query, level, exact }): Parameters<ReadContentRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind: SelectorType = selector_type.parse().map_err(invalid_argument)?;
        let forest = self.read_forest(&filepath).await?;

        let selector = Selector {
            kind,
            query,
            level,
            exact,
        };
        let matches = select(&forest, &selector);

        Ok(success(render::read_content(
            &filepath,
            &selector_type,
            &selector,
            &matches,
            forest.roots(),
        )))
    }

    #[tool(description = "List the headings of a file with their level and line")]
    #[instrument(skip(self))]
    async fn obsidian_get_headings(
        &self,
        Parameters(FileRequest { filepath }): Parameters<FileRequest>,
    ) -> Result<CallToolResult, McpError> {
        let content = self.read_document(&filepath).await?;
        Ok(success(render::headings(&filepath, &extract_headings(&content))))
    }

    #[tool(description = "Return the text under the first heading whose title contains the given text (or equals it when exact=true)")]
    #[instrument(skip(self))]
    async fn obsidian_get_heading_content(
        &self,
        Parameters(HeadingContentRequest { filepath, heading, exact }): Parameters<HeadingContentRequest>,
    ) -> Result<CallToolResult, McpError> {
        require("heading", &heading)?;

        let content = self.read_document(&filepath).await?;
        let headings = extract_headings(&content);

        match find_heading(&headings, &heading, exact) {
            Some(found) => Ok(success(render::heading_content(&filepath, found))),
            None => Ok(failure(render::heading_not_found(&filepath, &heading, &headings))),
        }
    }

    #[tool(description = "Return the frontmatter of a file as JSON")]
    #[instrument(skip(self))]
    async fn obsidian_get_frontmatter(
        &self,
        Parameters(FileRequest { filepath }): Parameters<FileRequest>,
    ) -> Result<CallToolResult, McpError> {
        require("filepath", &filepath)?;

        let frontmatter = self
            .client
            .get_frontmatter(&filepath)
            .await
            .map_err(|err| store_error("failed to get frontmatter".to_string(), err))?;

        let text = render::frontmatter(&filepath, &frontmatter).map_err(serialization_error)?;
        Ok(success(text))
    }

    #[tool(description = "Set one frontmatter field of a file, creating the field if it is missing")]
    #[instrument(skip(self))]
    async fn obsidian_set_frontmatter(
        &self,
        Parameters(SetFrontmatterRequest { filepath, field, value }): Parameters<SetFrontmatterRequest>,
    ) -> Result<CallToolResult, McpError> {
        require("filepath", &filepath)?;
        require("field", &field)?;

        self.client
            .set_frontmatter(&filepath, &field, &value)
            .await
            .map_err(|err| store_error("failed to set frontmatter".to_string(), err))?;

        Ok(success(format!(
            "Frontmatter field '{}' set to '{}' for file {}",
            field, value, filepath
        )))
    }
}

#[tool_handler()]
impl ServerHandler for ObsidianMCP {
    async fn initialize(
        &self,
        _request: InitializeRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        if let Some(http_request_part) = context.extensions.get::<axum::http::request::Parts>() {
            let initialize_headers = &http_request_part.headers;
            let initialize_uri = &http_request_part.uri;
            tracing::info!(?initialize_headers, %initialize_uri, "initialize from http server");
        }
        Ok(self.get_info())
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}
