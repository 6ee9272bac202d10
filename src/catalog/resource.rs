//! Resource entry as delivered by the library service.

use std::fmt;

use serde::{Deserialize, Deserializer};

use super::icons::{FileIcon, icon_for_asset};

/// Opaque resource identifier.
///
/// The service may send ids as JSON strings or numbers; both decode to the
/// same textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(String);

impl ResourceId {
    /// Creates an id from its textual form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the textual form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

/// A single downloadable file entry in the library.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Resource {
    /// Service-assigned id, unique within one catalog snapshot.
    #[serde(rename = "_id", alias = "id")]
    pub id: ResourceId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Link to the stored file.
    #[serde(rename = "imageUrl", alias = "assetUrl", default)]
    pub asset_url: String,
    /// Category label.
    #[serde(default)]
    pub category: String,
}

impl Resource {
    /// Creates a resource entry.
    #[must_use]
    pub fn new(
        id: impl Into<ResourceId>,
        title: impl Into<String>,
        asset_url: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            asset_url: asset_url.into(),
            category: category.into(),
        }
    }

    /// URL the user opens to download the file.
    #[must_use]
    pub fn download_url(&self) -> &str {
        &self.asset_url
    }

    /// Preview icon for the asset's file type.
    #[must_use]
    pub fn icon(&self) -> FileIcon {
        icon_for_asset(&self.asset_url)
    }
}
