//! Configuration and signing-secret loaders for Palaver.
//!
//! Reads `config.toml` from the data directory (`~/.palaver/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.
//!
//! The token signing secret never lives in `config.toml`. It comes from
//! `PALAVER_SIGNING_SECRET`, or from `{data_dir}/signing.key`, which is
//! generated on first use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use palaver_types::config::GlobalConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PALAVER_DATA_DIR";
/// Environment variable carrying the signing secret.
pub const SIGNING_SECRET_ENV: &str = "PALAVER_SIGNING_SECRET";
/// Key file name inside the data directory.
pub const SIGNING_KEY_FILE: &str = "signing.key";

const GENERATED_SECRET_LEN: usize = 32;
const KEY_READ_ATTEMPTS: usize = 50;
const KEY_READ_BACKOFF: Duration = Duration::from_millis(20);

/// Errors from resolving the signing secret.
///
/// SECURITY: never includes key material.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to access signing key file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("signing key file {0} is not valid hex")]
    Malformed(PathBuf),
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `PALAVER_DATA_DIR` environment variable
/// 2. `~/.palaver`
/// 3. `.palaver` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".palaver");
    }

    PathBuf::from(".palaver")
}

/// Resolve the token signing secret.
///
/// `PALAVER_SIGNING_SECRET` wins when set and non-empty. Otherwise the hex
/// key in `{data_dir}/signing.key` is used, created with 32 random bytes if
/// it does not exist yet.
pub async fn load_signing_secret(data_dir: &Path) -> Result<Vec<u8>, SecretError> {
    if let Ok(value) = std::env::var(SIGNING_SECRET_ENV) {
        let secret = SecretString::from(value);
        if !secret.expose_secret().is_empty() {
            tracing::debug!("Using signing secret from {SIGNING_SECRET_ENV}");
            return Ok(secret.expose_secret().as_bytes().to_vec());
        }
    }

    load_or_create_key_file(&data_dir.join(SIGNING_KEY_FILE)).await
}

async fn load_or_create_key_file(path: &Path) -> Result<Vec<u8>, SecretError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => decode_key(path, &content),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => create_key_file(path).await,
        Err(err) => Err(io_error(path, err)),
    }
}

/// Create the key file with owner-only permissions from the first byte.
///
/// `create_new` makes creation atomic: when another process wins the race,
/// its key is read back instead of being overwritten.
async fn create_key_file(path: &Path) -> Result<Vec<u8>, SecretError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(path, e))?;
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = match options.open(path).await {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            tracing::debug!("Signing key appeared at {}, reading it", path.display());
            return read_existing_key(path).await;
        }
        Err(err) => return Err(io_error(path, err)),
    };

    let mut secret = vec![0u8; GENERATED_SECRET_LEN];
    OsRng.fill_bytes(&mut secret);
    file.write_all(hex_encode(&secret).as_bytes())
        .await
        .map_err(|e| io_error(path, e))?;
    file.sync_all().await.map_err(|e| io_error(path, e))?;

    tracing::info!("Generated new signing key at {}", path.display());
    Ok(secret)
}

/// Read a key file another process just created. It may still be empty
/// for a moment while that process writes it.
async fn read_existing_key(path: &Path) -> Result<Vec<u8>, SecretError> {
    for _ in 0..KEY_READ_ATTEMPTS {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| io_error(path, e))?;
        if !content.trim().is_empty() {
            return decode_key(path, &content);
        }
        tokio::time::sleep(KEY_READ_BACKOFF).await;
    }
    Err(SecretError::Malformed(path.to_path_buf()))
}

fn decode_key(path: &Path, content: &str) -> Result<Vec<u8>, SecretError> {
    hex_decode(content.trim()).ok_or_else(|| SecretError::Malformed(path.to_path_buf()))
}

fn io_error(path: &Path, source: std::io::Error) -> SecretError {
    SecretError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.is_empty() || s.len() % 2 != 0 || !s.is_ascii() {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.auth.token_lifetime_secs, 3600);
        assert_eq!(config.chat.default_history_limit, 10);
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[auth]
token_lifetime_secs = 600

[server]
host = "0.0.0.0"
port = 9000
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.auth.token_lifetime_secs, 600);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.chat.max_history_limit, 100);
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.auth.token_lifetime_secs, 3600);
    }

    #[tokio::test]
    async fn key_file_is_created_once_and_reused() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join(SIGNING_KEY_FILE);

        let first = load_or_create_key_file(&path).await.unwrap();
        assert_eq!(first.len(), GENERATED_SECRET_LEN);
        assert!(path.exists());

        let second = load_or_create_key_file(&path).await.unwrap();
        assert_eq!(first, second);

        // Losing the creation race reads the existing key back.
        let third = create_key_file(&path).await.unwrap();
        assert_eq!(first, third);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_starts_agree_on_one_key() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SIGNING_KEY_FILE);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let path = path.clone();
            handles.push(tokio::spawn(async move {
                load_or_create_key_file(&path).await.unwrap()
            }));
        }

        let mut keys = Vec::new();
        for handle in handles {
            keys.push(handle.await.unwrap());
        }
        let on_disk = load_or_create_key_file(&path).await.unwrap();
        assert!(keys.iter().all(|key| *key == on_disk));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SIGNING_KEY_FILE);
        load_or_create_key_file(&path).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn malformed_key_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SIGNING_KEY_FILE);
        tokio::fs::write(&path, "zz-not-hex").await.unwrap();

        let err = load_or_create_key_file(&path).await.unwrap_err();
        assert!(matches!(err, SecretError::Malformed(_)));
    }

    #[test]
    fn hex_roundtrip() {
        let bytes = vec![0x00, 0x0f, 0xa5, 0xff];
        assert_eq!(hex_encode(&bytes), "000fa5ff");
        assert_eq!(hex_decode("000fa5ff"), Some(bytes));
        assert_eq!(hex_decode("abc"), None);
        assert_eq!(hex_decode(""), None);
    }
}
