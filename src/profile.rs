//! Session bootstrapping: the profile form and the immutable session config
//!
//! Avatar problems are never fatal; a partner without a picture is fine.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum avatar size (5MB)
pub const MAX_AVATAR_SIZE: u64 = 5 * 1024 * 1024;

/// Immutable configuration for one chat session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    pub user_display_name: String,
    pub partner_display_name: String,
    pub partner_avatar: Option<PartnerAvatar>,
}

/// Embeddable partner picture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerAvatar {
    pub media_type: String,
    /// Base64 (standard alphabet) image bytes
    pub data: String,
}

impl PartnerAvatar {
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.into(),
            data: BASE64.encode(bytes),
        }
    }

    /// Render as a `data:` URL for direct use in an `<img src>`
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }

    /// Read a local image file
    pub async fn load(path: &Path) -> Result<Self, AvatarError> {
        let media_type = mime_guess::from_path(path)
            .first()
            .filter(|m| m.type_() == mime_guess::mime::IMAGE)
            .ok_or_else(|| AvatarError::UnsupportedType(path.to_path_buf()))?;

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|source| AvatarError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if !metadata.is_file() {
            return Err(AvatarError::NotAFile(path.to_path_buf()));
        }
        if metadata.len() > MAX_AVATAR_SIZE {
            return Err(AvatarError::TooLarge(metadata.len()));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AvatarError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_bytes(media_type.essence_str(), &bytes))
    }

    /// Accept an already-encoded upload after checking it is a sane image payload
    pub fn from_upload(media_type: &str, data: &str) -> Result<Self, AvatarError> {
        if !media_type.starts_with("image/") {
            return Err(AvatarError::UnsupportedMediaType(media_type.to_string()));
        }
        let bytes = BASE64.decode(data.trim()).map_err(AvatarError::Encoding)?;
        if bytes.len() as u64 > MAX_AVATAR_SIZE {
            return Err(AvatarError::TooLarge(bytes.len() as u64));
        }
        Ok(Self::from_bytes(media_type, &bytes))
    }
}

/// Why an avatar could not be captured
#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("not an image type: {}", .0.display())]
    UnsupportedType(PathBuf),
    #[error("not an image media type: {0}")]
    UnsupportedMediaType(String),
    #[error("not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("image too large: {0} bytes (max {max} bytes)", max = MAX_AVATAR_SIZE)]
    TooLarge(u64),
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid base64 payload: {0}")]
    Encoding(#[source] base64::DecodeError),
}

/// Where the partner avatar comes from
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AvatarSource {
    /// A file on the machine running the service
    File { path: PathBuf },
    /// An image the client already encoded
    Upload { media_type: String, data: String },
}

/// The setup form
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileForm {
    pub user_name: String,
    pub partner_name: String,
    #[serde(default)]
    pub avatar: Option<AvatarSource>,
}

/// Form validation failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Your name is required")]
    MissingUserName,
    #[error("Partner name is required")]
    MissingPartnerName,
}

impl ProfileForm {
    /// Validate the form and produce the session config
    pub async fn submit(self) -> Result<SessionConfig, ProfileError> {
        let user_display_name = self.user_name.trim().to_string();
        let partner_display_name = self.partner_name.trim().to_string();
        if user_display_name.is_empty() {
            return Err(ProfileError::MissingUserName);
        }
        if partner_display_name.is_empty() {
            return Err(ProfileError::MissingPartnerName);
        }

        let partner_avatar = match self.avatar {
            Some(source) => capture_avatar(source).await,
            None => None,
        };

        tracing::info!(
            user = %user_display_name,
            partner = %partner_display_name,
            has_avatar = partner_avatar.is_some(),
            "Profile submitted"
        );

        Ok(SessionConfig {
            user_display_name,
            partner_display_name,
            partner_avatar,
        })
    }
}

async fn capture_avatar(source: AvatarSource) -> Option<PartnerAvatar> {
    let result = match source {
        AvatarSource::File { path } => PartnerAvatar::load(&path).await,
        AvatarSource::Upload { media_type, data } => PartnerAvatar::from_upload(&media_type, &data),
    };
    match result {
        Ok(avatar) => Some(avatar),
        Err(e) => {
            tracing::warn!(error = %e, "Avatar unavailable, continuing without one");
            None
        }
    }
}
