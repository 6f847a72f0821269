//! Resource library metadata.
//!
//! Files themselves live in a storage bucket; these rows only describe them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCategory {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCategoryDraft {
    pub name: String,
    pub description: Option<String>,
}

impl Entity for ResourceCategory {
    const TABLE: &'static str = "resource_categories";
    const ENTITY_TYPE: &'static str = "resource_category";
    type Draft = ResourceCategoryDraft;
    type Patch = ResourceCategoryDraft;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub file_name: String,
    pub file_url: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub uploaded_by: Option<Uuid>,
    #[serde(default)]
    pub download_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Resource {
    pub fn kind(&self) -> FileKind {
        FileKind::from_mime(self.file_type.as_deref())
    }

    pub fn display_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDraft {
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_url: String,
    pub file_size: u64,
    pub file_type: Option<String>,
    pub category_id: Option<Uuid>,
    pub uploaded_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourcePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_count: Option<i64>,
}

impl Entity for Resource {
    const TABLE: &'static str = "resources";
    const ENTITY_TYPE: &'static str = "resource";
    type Draft = ResourceDraft;
    type Patch = ResourcePatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Coarse file category used to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Pdf,
    Document,
    Spreadsheet,
    Presentation,
    Archive,
    Text,
}

impl FileKind {
    /// Classifies by substring of the MIME type; unknown types are `Text`.
    pub fn from_mime(file_type: Option<&str>) -> Self {
        let Some(file_type) = file_type else {
            return Self::Text;
        };
        let t = file_type.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| t.contains(n));

        if has(&["image"]) {
            Self::Image
        } else if has(&["video"]) {
            Self::Video
        } else if has(&["audio"]) {
            Self::Audio
        } else if has(&["pdf"]) {
            Self::Pdf
        } else if has(&["word", "document"]) {
            Self::Document
        } else if has(&["excel", "spreadsheet"]) {
            Self::Spreadsheet
        } else if has(&["powerpoint", "presentation"]) {
            Self::Presentation
        } else if has(&["zip", "rar", "archive"]) {
            Self::Archive
        } else {
            Self::Text
        }
    }
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size with base-1024 units and at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && exponent < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        exponent += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
    }

    #[test]
    fn test_sizes_beyond_gb_stay_in_gb() {
        assert_eq!(format_file_size(2 * 1024u64.pow(4)), "2048 GB");
    }

    #[test]
    fn test_file_kind() {
        assert_eq!(FileKind::from_mime(Some("image/png")), FileKind::Image);
        assert_eq!(FileKind::from_mime(Some("application/pdf")), FileKind::Pdf);
        assert_eq!(
            FileKind::from_mime(Some("application/vnd.ms-excel")),
            FileKind::Spreadsheet
        );
        assert_eq!(FileKind::from_mime(Some("application/zip")), FileKind::Archive);
        assert_eq!(FileKind::from_mime(None), FileKind::Text);
    }
}
