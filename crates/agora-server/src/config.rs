use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use agora_api::content::ContentPolicy;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["your_jwt_secret", "change-me", "dev-secret-change-me"];

/// Process configuration, read once from the environment at startup and
/// handed to the services that need it.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub public_url: String,
    pub jwt_secret: String,
    pub max_upload_bytes: usize,
    pub policy: ContentPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("AGORA_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("AGORA_JWT_SECRET is unset or still a placeholder; set it in .env and restart");
        }

        let host = get("AGORA_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("AGORA_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("AGORA_PORT must be a port number")?;
        let max_upload_mb: usize = get("AGORA_MAX_UPLOAD_MB")
            .unwrap_or_else(|| "50".into())
            .parse()
            .context("AGORA_MAX_UPLOAD_MB must be a whole number")?;

        Ok(Self {
            db_path: get("AGORA_DB_PATH").unwrap_or_else(|| "agora.db".into()).into(),
            uploads_dir: get("AGORA_UPLOADS_DIR").unwrap_or_else(|| "./uploads".into()).into(),
            public_url: get("AGORA_PUBLIC_URL").unwrap_or_else(|| format!("http://localhost:{}", port)),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            policy: ContentPolicy {
                cascade_delete_comments: flag(get("AGORA_CASCADE_DELETE_COMMENTS"))?,
                require_existing_post: flag(get("AGORA_REQUIRE_EXISTING_POST"))?,
            },
            host,
            port,
            jwt_secret,
        })
    }
}

fn flag(value: Option<String>) -> Result<bool> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
        Some(v) => bail!("expected true/false, got '{}'", v),
    }
}
