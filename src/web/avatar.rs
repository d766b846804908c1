use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::{Error, Result};

/// Default avatar file, relative to the working directory.
pub const DEFAULT_AVATAR: &str = "aurora_avatar.jpg";

/// Avatar shown next to the user's messages.
pub const USER_AVATAR: &str = "👤";

/// The assistant's avatar image, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AvatarAsset {
    path: PathBuf,
    bytes: Bytes,
    content_type: &'static str,
}

impl AvatarAsset {
    /// Read the image at `path`.
    ///
    /// # Errors
    ///
    /// A missing file is [`Error::MissingResource`]; the web surface cannot
    /// start without it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::missing_resource(
                format!(
                    "Avatar image not found! Please make sure '{}' is in the same folder as the app.",
                    path.display()
                ),
                path,
            ));
        }
        let bytes = fs::read(path)
            .map_err(|err| Error::io(format!("cannot read {}", path.display()), err))?;
        Ok(Self {
            path: path.to_path_buf(),
            bytes: Bytes::from(bytes),
            content_type: content_type_for(path),
        })
    }

    /// An in-memory avatar.
    pub fn from_bytes(bytes: impl Into<Bytes>, content_type: &'static str) -> Self {
        Self {
            path: PathBuf::new(),
            bytes: bytes.into(),
            content_type,
        }
    }

    /// Where the image was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The image itself.
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// MIME type derived from the file extension.
    pub fn content_type(&self) -> &'static str {
        self.content_type
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn missing_avatar_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_AVATAR);
        let err = AvatarAsset::load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingResource);
        assert!(!err.kind().is_recoverable());
        assert_eq!(
            err.to_string(),
            format!(
                "Avatar image not found! Please make sure '{}' is in the same folder as the app.",
                path.display()
            )
        );
    }

    #[test]
    fn loads_with_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar.PNG");
        fs::write(&path, b"\x89PNG").unwrap();
        let avatar = AvatarAsset::load(&path).unwrap();
        assert_eq!(avatar.content_type(), "image/png");
        assert_eq!(avatar.bytes().as_ref(), b"\x89PNG");
        assert_eq!(avatar.path(), path.as_path());
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        assert_eq!(
            content_type_for(Path::new("avatar.bin")),
            "application/octet-stream"
        );
        assert_eq!(content_type_for(Path::new("aurora_avatar.jpg")), "image/jpeg");
    }
}
