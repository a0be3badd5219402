use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ForumError;

/// Path prefix under which stored uploads are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Longest file extension carried over from the client's file name.
const MAX_EXTENSION_LEN: usize = 16;

/// An upload that has been fully written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDescriptor {
    pub original_name: String,
    pub stored_name: String,
}

/// Turns stored uploads into absolute public URLs.
#[derive(Debug, Clone)]
pub struct AttachmentResolver {
    public_base_url: String,
}

impl AttachmentResolver {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn resolve(&self, upload: Option<&UploadDescriptor>) -> Option<String> {
        upload.map(|u| format!("{}{}/{}", self.public_base_url, UPLOADS_ROUTE, u.stored_name))
    }
}

/// On-disk storage for post attachments.
///
/// Every file lands at `{dir}/{unix-millis}-{uuid}{ext}`, so two uploads in
/// the same millisecond still get distinct names.
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub async fn new(dir: PathBuf, max_bytes: usize) -> anyhow::Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir, max_bytes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<UploadDescriptor, ForumError> {
        if bytes.is_empty() {
            return Err(ForumError::Invalid("Uploaded file is empty".into()));
        }
        if bytes.len() > self.max_bytes {
            return Err(ForumError::PayloadTooLarge);
        }

        let stored_name = stored_name_for(original_name);
        let path = self.dir.join(&stored_name);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to create {}: {}", path.display(), e))?;
        write_or_discard(&mut file, &path, bytes).await?;

        info!("Stored upload {} as {} ({} bytes)", original_name, stored_name, bytes.len());
        Ok(UploadDescriptor {
            original_name: original_name.to_string(),
            stored_name,
        })
    }

    /// Delete a stored upload. Missing files are not an error.
    pub async fn remove(&self, stored_name: &str) -> anyhow::Result<()> {
        match fs::remove_file(self.dir.join(stored_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Upload {} already gone", stored_name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Writes and flushes `bytes`, removing `path` if either step fails so no
/// truncated upload is left behind to be served.
async fn write_or_discard<W>(writer: &mut W, path: &Path, bytes: &[u8]) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match writer.write_all(bytes).await {
        Ok(()) => writer.flush().await,
        Err(e) => Err(e),
    };

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(path).await {
            warn!("Failed to remove partial upload {}: {}", path.display(), cleanup);
        }
        anyhow::bail!("failed to write {}: {}", path.display(), e);
    }
    Ok(())
}

fn stored_name_for(original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= MAX_EXTENSION_LEN)
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("{}-{}{}", Utc::now().timestamp_millis(), Uuid::new_v4().simple(), ext)
}
