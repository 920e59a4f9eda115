// Attachment resolver: classify a local file by extension, then hand it to
// an uploader and turn the result into a `FileReference` part.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::AttachmentError;
use crate::history::FileReference;

/// MIME type used when no enabled category claims the extension.
///
/// Kept as-is even though it is a poor guess for unknown files: callers rely
/// on classification never failing.
pub const FALLBACK_MIME_TYPE: &str = "video/mp4";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaCategory {
    Video,
    Image,
    Audio,
    /// Listed so the table is complete, but never matched.
    Document,
}

/// Categories in the order they are checked.
pub const CATEGORIES: [MediaCategory; 4] = [
    MediaCategory::Video,
    MediaCategory::Image,
    MediaCategory::Audio,
    MediaCategory::Document,
];

impl MediaCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaCategory::Video => "video",
            MediaCategory::Image => "image",
            MediaCategory::Audio => "audio",
            MediaCategory::Document => "document",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            MediaCategory::Video => &[
                "mp4", "mpeg", "mov", "avi", "x-flv", "mpg", "webm", "wmv", "3gpp",
            ],
            MediaCategory::Image => &["png", "jpeg", "webp", "heic", "heif"],
            MediaCategory::Audio => &["wav", "mp3", "aiff", "aac", "ogg", "flac"],
            MediaCategory::Document => &["pdf"],
        }
    }

    /// Document uploads are not supported yet.
    pub fn is_enabled(self) -> bool {
        !matches!(self, MediaCategory::Document)
    }
}

/// Lower-cased extension of the final path segment, if it has one.
pub fn extension(file_path: &str) -> Option<String> {
    let (_, ext) = display_name(file_path).rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Map a path to `"<category>/<extension>"`, or [`FALLBACK_MIME_TYPE`].
pub fn classify(file_path: &str) -> String {
    let Some(ext) = extension(file_path) else {
        return FALLBACK_MIME_TYPE.to_string();
    };
    CATEGORIES
        .iter()
        .filter(|category| category.is_enabled())
        .find(|category| category.extensions().contains(&ext.as_str()))
        .map(|category| format!("{}/{}", category.as_str(), ext))
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}

/// Final path segment, used as the remote display name.
pub fn display_name(file_path: &str) -> &str {
    file_path
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_path)
}

/// A file the operator asked to attach, classified but not yet uploaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentCandidate {
    pub file_path: PathBuf,
    pub resolved_mime_type: String,
    pub display_name: String,
}

impl AttachmentCandidate {
    /// Build a candidate from what the operator typed. Surrounding quotes
    /// from terminal drag-and-drop are stripped and `~/` is expanded.
    pub fn from_input(raw: &str) -> Self {
        let trimmed = raw.trim().trim_matches(|c: char| c == '"' || c == '\'');
        let file_path = expand_home(trimmed);
        AttachmentCandidate {
            file_path,
            resolved_mime_type: classify(trimmed),
            display_name: display_name(trimmed).to_string(),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Handle returned by the remote file service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    pub mime_type: String,
    pub uri: String,
}

/// Anything that can push a local file to the remote file service.
pub trait FileUploader {
    fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, AttachmentError>;
}

impl<T: FileUploader + ?Sized> FileUploader for &T {
    fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, AttachmentError> {
        (**self).upload_file(path, mime_type, display_name)
    }
}

/// Upload a candidate and return the part to attach to the pending turn.
pub fn upload<U: FileUploader>(
    uploader: &U,
    candidate: &AttachmentCandidate,
) -> Result<FileReference, AttachmentError> {
    let uploaded = uploader.upload_file(
        &candidate.file_path,
        &candidate.resolved_mime_type,
        &candidate.display_name,
    )?;
    info!(name = %uploaded.name, "Uploaded file: {} ({})", uploaded.display_name, uploaded.uri);
    Ok(FileReference {
        mime_type: uploaded.mime_type,
        uri: uploaded.uri,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn known_extensions_map_to_their_category() {
        assert_eq!(classify("clip.mp4"), "video/mp4");
        assert_eq!(classify("photo.png"), "image/png");
        assert_eq!(classify("song.flac"), "audio/flac");
        assert_eq!(classify("/tmp/a.b/trailer.webm"), "video/webm");
        assert_eq!(classify("legacy.3gpp"), "video/3gpp");
    }

    #[test]
    fn every_enabled_table_entry_round_trips() {
        for category in CATEGORIES.iter().filter(|c| c.is_enabled()) {
            for ext in category.extensions() {
                let path = format!("some/dir/file.{ext}");
                assert_eq!(classify(&path), format!("{}/{}", category.as_str(), ext));
            }
        }
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(classify("PHOTO.PNG"), "image/png");
        assert_eq!(classify("Voice.Mp3"), "audio/mp3");
    }

    #[test]
    fn unknown_or_missing_extension_falls_back() {
        assert_eq!(classify("notes.pdf"), FALLBACK_MIME_TYPE);
        assert_eq!(classify("README"), FALLBACK_MIME_TYPE);
        assert_eq!(classify("archive.tar.gz"), FALLBACK_MIME_TYPE);
        assert_eq!(classify("photo.jpg"), FALLBACK_MIME_TYPE);
        assert_eq!(classify("release.v2/README"), FALLBACK_MIME_TYPE);
        assert_eq!(classify(""), FALLBACK_MIME_TYPE);
    }

    #[test]
    fn document_category_is_disabled() {
        assert!(!MediaCategory::Document.is_enabled());
        assert!(MediaCategory::Document.extensions().contains(&"pdf"));
    }

    #[test]
    fn display_name_is_last_segment() {
        assert_eq!(display_name("/home/me/videos/clip.mp4"), "clip.mp4");
        assert_eq!(display_name("clip.mp4"), "clip.mp4");
        assert_eq!(display_name(r"C:\media\song.wav"), "song.wav");
        assert_eq!(display_name("dir/"), "");
    }

    #[test]
    fn candidate_strips_quotes_and_whitespace() {
        let candidate = AttachmentCandidate::from_input("  '/tmp/My Photo.PNG'\n");
        assert_eq!(candidate.file_path, PathBuf::from("/tmp/My Photo.PNG"));
        assert_eq!(candidate.resolved_mime_type, "image/png");
        assert_eq!(candidate.display_name, "My Photo.PNG");
    }

    #[test]
    fn candidate_expands_home() {
        let candidate = AttachmentCandidate::from_input("~/clip.mov");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(candidate.file_path, home.join("clip.mov"));
        }
        assert_eq!(candidate.display_name, "clip.mov");
        assert_eq!(candidate.resolved_mime_type, "video/mov");
    }

    struct RecordingUploader {
        calls: RefCell<Vec<(PathBuf, String, String)>>,
    }

    impl FileUploader for RecordingUploader {
        fn upload_file(
            &self,
            path: &Path,
            mime_type: &str,
            display_name: &str,
        ) -> Result<UploadedFile, AttachmentError> {
            self.calls.borrow_mut().push((
                path.to_path_buf(),
                mime_type.to_string(),
                display_name.to_string(),
            ));
            Ok(UploadedFile {
                name: "files/abc".into(),
                display_name: display_name.into(),
                mime_type: mime_type.into(),
                uri: "https://example.invalid/files/abc".into(),
            })
        }
    }

    #[test]
    fn upload_passes_classification_and_name() {
        let uploader = RecordingUploader {
            calls: RefCell::new(Vec::new()),
        };
        let candidate = AttachmentCandidate::from_input("media/song.ogg");
        let reference = upload(&uploader, &candidate).unwrap();
        assert_eq!(reference.mime_type, "audio/ogg");
        assert_eq!(reference.uri, "https://example.invalid/files/abc");
        assert_eq!(
            uploader.calls.borrow().as_slice(),
            &[(
                PathBuf::from("media/song.ogg"),
                "audio/ogg".to_string(),
                "song.ogg".to_string()
            )]
        );
    }

    #[test]
    fn upload_error_is_returned() {
        struct Failing;
        impl FileUploader for Failing {
            fn upload_file(&self, _: &Path, _: &str, _: &str) -> Result<UploadedFile, AttachmentError> {
                Err(AttachmentError::Status {
                    status: 400,
                    body: "bad file".into(),
                })
            }
        }
        let candidate = AttachmentCandidate::from_input("x.png");
        let err = upload(&Failing, &candidate).unwrap_err();
        assert!(err.to_string().contains("bad file"));
    }
}
