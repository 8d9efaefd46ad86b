use serde::{Deserialize, Deserializer, Serialize};

/// Default number of records requested per listing page (the API maximum).
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Metadata for a file (or folder) stored in Drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// Opaque, stable identifier
    #[serde(default)]
    pub id: String,
    /// Display name, not guaranteed unique
    #[serde(default)]
    pub name: String,
    /// Size in bytes; 0 when the API reports none (folders, native docs)
    #[serde(default, deserialize_with = "size_from_api")]
    pub size: u64,
    /// Folder IDs this file currently lives in
    #[serde(default)]
    pub parents: Vec<String>,
    /// MIME type reported by Drive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DriveFile {
    /// Create a file record with the given id, name and size.
    pub fn new(id: impl Into<String>, name: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size,
            parents: Vec::new(),
            mime_type: None,
            description: None,
        }
    }

    /// Set the parent folders
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Set the MIME type
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Returns true if this file lists `folder` among its parents.
    pub fn is_in(&self, folder: &str) -> bool {
        self.parents.iter().any(|p| p == folder)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    /// Files on this page
    #[serde(default)]
    pub files: Vec<DriveFile>,
    /// Token for the next page, absent on the last page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Parameters for a `files.list` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Drive search expression, e.g. `'root' in parents`
    pub q: String,
    /// Partial-response field mask for each file
    pub fields: String,
    /// Sort key
    pub order_by: String,
    /// Records per page
    pub page_size: u32,
}

impl ListQuery {
    /// Query with the default field mask, ordered by name.
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            fields: "id,name,size,parents".to_string(),
            order_by: "name".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Every file owned by the authenticated principal.
    pub fn owned_by_me() -> Self {
        Self::new("'me' in owners").with_fields("size")
    }

    /// Files whose parent set includes `folder_id`.
    pub fn children_of(folder_id: &str) -> Self {
        Self::new(format!("'{}' in parents", escape_query_literal(folder_id)))
    }

    /// Files directly under the principal's root folder.
    pub fn root_children() -> Self {
        Self::children_of("root")
    }

    /// Restrict the per-file field mask
    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = fields.into();
        self
    }

    /// Set the page size (clamped to 1..=1000)
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, DEFAULT_PAGE_SIZE);
        self
    }

    /// The full `fields` parameter, including the pagination token.
    pub fn fields_param(&self) -> String {
        format!("files({}),nextPageToken", self.fields)
    }
}

/// Metadata sent with a `files.copy` call.
///
/// Carries no `id`, so the store assigns a fresh identity to the copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyRequest {
    /// Name of the new file
    pub name: String,
    /// Parents of the new file
    pub parents: Vec<String>,
    /// MIME type to keep
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Description to keep
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CopyRequest {
    /// Build a copy template from a snapshot, targeting `destination`.
    pub fn from_snapshot(snapshot: &DriveFile, destination: &str) -> Self {
        Self {
            name: snapshot.name.clone(),
            parents: vec![destination.to_string()],
            mime_type: snapshot.mime_type.clone(),
            description: snapshot.description.clone(),
        }
    }
}

/// Escape a value for use inside a single-quoted Drive query literal.
pub fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Drive encodes int64 fields as JSON strings; accept either form.
fn size_from_api<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Text(String),
        Number(u64),
    }

    match Option::<Size>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Size::Number(n)) => Ok(n),
        Some(Size::Text(s)) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_list_from_api_json() {
        let json = r#"{
            "files": [
                {"id": "a1", "name": "A", "size": "60", "parents": ["src"]},
                {"id": "f1", "name": "Folder", "mimeType": "application/vnd.google-apps.folder"}
            ],
            "nextPageToken": "tok"
        }"#;

        let list: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.files.len(), 2);
        assert_eq!(list.files[0].size, 60);
        assert!(list.files[0].is_in("src"));
        assert_eq!(list.files[1].size, 0);
        assert_eq!(list.next_page_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_size_accepts_number() {
        let file: DriveFile = serde_json::from_str(r#"{"id":"x","size":42}"#).unwrap();
        assert_eq!(file.size, 42);
    }

    #[test]
    fn test_size_rejects_garbage() {
        assert!(serde_json::from_str::<DriveFile>(r#"{"id":"x","size":"many"}"#).is_err());
    }

    #[test]
    fn test_last_page_has_no_token() {
        let list: FileList = serde_json::from_str(r#"{"files": []}"#).unwrap();
        assert!(list.next_page_token.is_none());
    }

    #[test]
    fn test_list_query_builders() {
        let q = ListQuery::children_of("abc123");
        assert_eq!(q.q, "'abc123' in parents");
        assert_eq!(q.order_by, "name");
        assert_eq!(q.page_size, 1000);
        assert_eq!(q.fields_param(), "files(id,name,size,parents),nextPageToken");

        let owned = ListQuery::owned_by_me();
        assert_eq!(owned.q, "'me' in owners");
        assert_eq!(owned.fields_param(), "files(size),nextPageToken");

        assert_eq!(ListQuery::root_children().q, "'root' in parents");
    }

    #[test]
    fn test_page_size_is_clamped() {
        assert_eq!(ListQuery::new("x").with_page_size(0).page_size, 1);
        assert_eq!(ListQuery::new("x").with_page_size(5000).page_size, 1000);
        assert_eq!(ListQuery::new("x").with_page_size(50).page_size, 50);
    }

    #[test]
    fn test_escape_query_literal() {
        assert_eq!(escape_query_literal("it's"), "it\\'s");
        assert_eq!(escape_query_literal("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_copy_request_drops_identity() {
        let snapshot = DriveFile::new("orig", "report.pdf", 10)
            .with_parents(["src"])
            .with_mime_type("application/pdf");
        let req = CopyRequest::from_snapshot(&snapshot, "dst");

        assert_eq!(req.parents, vec!["dst".to_string()]);
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["name"], "report.pdf");
        assert_eq!(json["mimeType"], "application/pdf");
        assert!(json.get("description").is_none());
    }
}
