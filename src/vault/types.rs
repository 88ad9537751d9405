use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `GET /vault/` and `GET /vault/{dir}/`.
#[derive(Debug, Deserialize)]
pub struct FileList {
    pub files: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    File,
    Directory,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileInfo>>,
}

impl FileInfo {
    /// Build an entry from a listing name, relative to `parent`. Directory
    /// entries carry a trailing `/`.
    pub fn from_listing(parent: &str, entry: &str) -> Self {
        let (name, file_type) = match entry.strip_suffix('/') {
            Some(name) => (name, FileType::Directory),
            None => (entry, FileType::File),
        };

        let parent = parent.trim_matches('/');
        let path = if parent.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", parent, name)
        };

        Self {
            name: name.to_string(),
            file_type,
            path,
            children: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// Error body returned by the REST API.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "errorCode")]
    pub error_code: u32,
    pub message: String,
}

/// `application/vnd.olrapi.note+json` representation of a note.
#[derive(Debug, Default, Deserialize)]
pub struct NoteJson {
    #[serde(default)]
    pub frontmatter: Map<String, Value>,
}
