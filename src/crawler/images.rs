//! Image capture policy
//!
//! Decides whether an image discovered on a page is worth downloading and
//! where it should land on disk. Checks run in order: minimum size, then
//! Content-Type, then whether the destination file already exists.

use crate::config::ImageConfig;
use crate::crawler::fetcher::Fetcher;
use crate::TrawlError;
use std::path::PathBuf;

/// Outcome of running one image URL through the filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageDecision {
    /// Smaller than the configured threshold, or size not reported
    TooSmall { size: Option<u64> },

    /// Content-Type missing or outside `image/`
    NotAnImage { content_type: Option<String> },

    /// Accepted, but a file already sits at the destination
    AlreadyStored(PathBuf),

    /// Accepted and should be downloaded to this path
    Accepted(PathBuf),
}

impl ImageDecision {
    /// True when the image passed the size and type checks
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_) | Self::AlreadyStored(_))
    }
}

/// Size and type gate in front of image downloads
#[derive(Debug, Clone)]
pub struct ImageFilter {
    min_size: Option<u64>,
    media_dir: PathBuf,
}

impl ImageFilter {
    pub fn new(min_size: Option<u64>, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            min_size,
            media_dir: media_dir.into(),
        }
    }

    /// Runs the size and type checks and resolves the destination path
    pub async fn evaluate<F>(&self, fetcher: &F, image_url: &str) -> Result<ImageDecision, TrawlError>
    where
        F: Fetcher + ?Sized,
    {
        if let Some(min_size) = self.min_size {
            let size = fetcher.head_size(image_url).await?;
            if size.map_or(true, |size| size < min_size) {
                return Ok(ImageDecision::TooSmall { size });
            }
        }

        let content_type = fetcher.content_type(image_url).await?;
        let Some(extension) = content_type.as_deref().and_then(image_extension) else {
            return Ok(ImageDecision::NotAnImage { content_type });
        };

        let destination = self.media_dir.join(image_file_name(image_url, &extension));
        if destination.exists() {
            Ok(ImageDecision::AlreadyStored(destination))
        } else {
            Ok(ImageDecision::Accepted(destination))
        }
    }

    /// True when the image passes the size and type checks
    pub async fn accept<F>(&self, fetcher: &F, image_url: &str) -> Result<bool, TrawlError>
    where
        F: Fetcher + ?Sized,
    {
        Ok(self.evaluate(fetcher, image_url).await?.is_accepted())
    }

    /// Evaluates an image and downloads it when accepted and not yet stored
    pub async fn capture<F>(&self, fetcher: &F, image_url: &str) -> Result<ImageDecision, TrawlError>
    where
        F: Fetcher + ?Sized,
    {
        let decision = self.evaluate(fetcher, image_url).await?;
        if let ImageDecision::Accepted(destination) = &decision {
            fetcher.fetch_to_file(image_url, destination).await?;
        }
        Ok(decision)
    }
}

impl From<&ImageConfig> for ImageFilter {
    fn from(config: &ImageConfig) -> Self {
        Self::new(config.min_size, &config.media_dir)
    }
}

/// File extension implied by an `image/*` Content-Type
///
/// Parameters such as `; charset=...` are ignored. Returns None for anything
/// that is not an image.
pub fn image_extension(content_type: &str) -> Option<String> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let subtype = mime.strip_prefix("image/")?;
    if subtype.is_empty() {
        None
    } else {
        Some(subtype.to_string())
    }
}

/// Deterministic file name for an image URL
///
/// Every character outside `[A-Za-z0-9 ]` is dropped and the extension is
/// appended, so the same URL always maps to the same file.
pub fn image_file_name(image_url: &str, extension: &str) -> String {
    let stem: String = image_url
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    format!("{}.{}", stem, extension)
}
