use rmcp::schemars;
use serde::Deserialize;

fn default_max_depth() -> usize {
    3
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FileRequest {
    #[schemars(description = "path of the file, relative to the vault root")]
    pub filepath: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFilesInDirRequest {
    #[schemars(description = "path of the directory, relative to the vault root")]
    pub dirpath: String,

    #[schemars(description = "how many directory levels to expand (default 3, 0 for no limit)")]
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WriteContentRequest {
    #[schemars(description = "path of the file, relative to the vault root")]
    pub filepath: String,

    #[schemars(description = "markdown content to write")]
    pub content: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteFileRequest {
    #[schemars(description = "path of the file or directory to delete")]
    pub filepath: String,

    #[schemars(description = "must be true to confirm the deletion")]
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PatchContentRequest {
    #[schemars(description = "path of the file, relative to the vault root")]
    pub filepath: String,

    #[schemars(description = "one of: append, prepend, replace")]
    pub operation: String,

    #[schemars(description = "one of: heading, block, frontmatter")]
    pub target_type: String,

    #[schemars(
        description = "heading path (\"Parent -> Child\" or \"Parent::Child\"), block ID or frontmatter field"
    )]
    pub target: String,

    #[schemars(description = "content to insert")]
    pub content: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DiscoverStructureRequest {
    #[schemars(description = "path of the file, relative to the vault root")]
    pub filepath: String,

    #[schemars(description = "heading depth to descend into (default 3, 0 for no limit)")]
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct NestedContentRequest {
    #[schemars(description = "path of the file, relative to the vault root")]
    pub filepath: String,

    #[schemars(description = "heading path such as \"Setup -> Install -> Linux\"")]
    pub nested_path: String,

    #[schemars(
        description = "also match sub-headings at any depth, not only direct children (default false)"
    )]
    #[serde(default)]
    pub permissive: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReadContentRequest {
    #[schemars(description = "path of the file, relative to the vault root")]
    pub filepath: String,

    #[schemars(description = "one of: heading, block, frontmatter")]
    pub selector_type: String,

    #[schemars(description = "text to look for; empty selects everything of the type")]
    #[serde(default)]
    pub query: String,

    #[schemars(description = "heading level to restrict to (0 for any)")]
    #[serde(default)]
    pub level: usize,

    #[schemars(description = "match the whole text instead of a substring (default false)")]
    #[serde(default)]
    pub exact: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct HeadingContentRequest {
    #[schemars(description = "path of the file, relative to the vault root")]
    pub filepath: String,

    #[schemars(description = "heading title to look for")]
    pub heading: String,

    #[schemars(description = "compare titles verbatim instead of by substring (default false)")]
    #[serde(default)]
    pub exact: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetFrontmatterRequest {
    #[schemars(description = "path of the file, relative to the vault root")]
    pub filepath: String,

    #[schemars(description = "frontmatter field to set")]
    pub field: String,

    #[schemars(description = "new value of the field")]
    pub value: String,
}
