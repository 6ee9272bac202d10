//! Static file-type → preview icon table.

/// Preview icon shown next to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileIcon {
    Pdf,
    Spreadsheet,
    Document,
    Photo,
    Image,
    Movie,
    Video,
    Audio,
    /// Fallback for unknown or missing extensions.
    Generic,
}

impl FileIcon {
    /// Asset name used by the view.
    #[must_use]
    pub fn asset_name(self) -> &'static str {
        match self {
            Self::Pdf => "pdf.png",
            Self::Spreadsheet => "excel.png",
            Self::Document => "docs.png",
            Self::Photo => "jpg.png",
            Self::Image => "image-icon.png",
            Self::Movie => "mp4.png",
            Self::Video => "video-icon.png",
            Self::Audio => "audio-icon.png",
            Self::Generic => "default-icon.png",
        }
    }

    /// Short tag for terminal rendering.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Spreadsheet => "XLS",
            Self::Document => "DOC",
            Self::Photo | Self::Image => "IMG",
            Self::Movie | Self::Video => "VID",
            Self::Audio => "AUD",
            Self::Generic => "FILE",
        }
    }
}

/// Looks up the icon for a lower-cased extension.
#[must_use]
pub fn icon_for_extension(extension: &str) -> FileIcon {
    match extension {
        "pdf" => FileIcon::Pdf,
        "xls" | "xlsx" => FileIcon::Spreadsheet,
        "doc" | "docx" => FileIcon::Document,
        "jpg" | "jpeg" | "png" => FileIcon::Photo,
        "gif" => FileIcon::Image,
        "mp4" => FileIcon::Movie,
        "webm" | "ogg" => FileIcon::Video,
        "mp3" | "wav" => FileIcon::Audio,
        _ => FileIcon::Generic,
    }
}

/// Picks the icon from the text after the last `.` of an asset URL.
#[must_use]
pub fn icon_for_asset(asset_url: &str) -> FileIcon {
    asset_url
        .rsplit_once('.')
        .map_or(FileIcon::Generic, |(_, extension)| {
            icon_for_extension(&extension.to_lowercase())
        })
}
