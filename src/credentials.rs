//! Credential storage for DQM profiles.
//!
//! Profiles live in `<data dir>/crownpeak-dqm/credentials.json`. When
//! encryption is initialized, each profile is sealed with AES-256-GCM under a
//! random master key, itself sealed with a key derived from the user's
//! password via PBKDF2 and kept in `master.key` next to the credentials file.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::Config;
use crate::dqm::{CredentialProvider, DqmCredentials};
use crate::error::{Error, Result};

/// Secure container for the master key that zeroizes on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct SecureMasterKey(Vec<u8>);

impl SecureMasterKey {
    fn new(key: Vec<u8>) -> Self {
        Self(key)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => panic!("PBKDF2 iteration count must be non-zero"),
};

const SALT_LEN: usize = 16;

const NONCE_LEN: usize = 12;

/// Owner read/write only.
const CREDENTIAL_FILE_MODE: u32 = 0o600;

const ENCRYPTED_PREFIX: &str = "enc:";

/// A stored DQM profile.
///
/// `website_id` and `base_url` are kept in clear for listing; the full
/// profile (including the API key) is in `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub name: String,
    pub website_id: String,
    pub base_url: String,
    /// "enc:base64(nonce+ciphertext)" or plain base64 of the profile JSON
    pub value: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl StoredProfile {
    pub fn is_encrypted(&self) -> bool {
        self.value.starts_with(ENCRYPTED_PREFIX)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MasterKeyFile {
    salt: String,
    encrypted_key: String,
}

/// Credential store backed by a JSON file.
#[derive(Default, Serialize, Deserialize)]
pub struct CredentialStore {
    profiles: HashMap<String, StoredProfile>,
    #[serde(skip)]
    path: PathBuf,
    #[serde(skip)]
    master_key: Option<SecureMasterKey>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("path", &self.path)
            .field("profiles", &self.profiles)
            .field(
                "master_key",
                &self.master_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl CredentialStore {
    /// Default location of the credentials file.
    pub fn default_path() -> PathBuf {
        Config::data_dir().join("credentials.json")
    }

    /// Load the store from its default location.
    pub async fn load() -> Result<Self> {
        Self::load_from(Self::default_path()).await
    }

    /// Load a store from `path` (locked; encrypted profiles need [`unlock`]).
    ///
    /// [`unlock`]: CredentialStore::unlock
    pub async fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !tokio::fs::try_exists(&path)
            .await
            .map_err(|e| Error::Storage(format!("Failed to check credentials path: {}", e)))?
        {
            return Ok(Self {
                path,
                ..Self::default()
            });
        }

        let content = read_file(&path, "credentials").await?;
        let mut store: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("Failed to parse credentials: {}", e)))?;
        store.path = path;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn master_key_path(&self) -> PathBuf {
        self.path.with_file_name("master.key")
    }

    pub fn is_encryption_initialized(&self) -> bool {
        self.master_key_path().exists()
    }

    pub fn is_unlocked(&self) -> bool {
        self.master_key.is_some()
    }

    /// Create a new master key protected by `password` and unlock the store.
    pub async fn initialize_encryption(&mut self, password: &str) -> Result<()> {
        if self.is_encryption_initialized() {
            return Err(Error::Storage(
                "Encryption already initialized. Use unlock instead.".to_string(),
            ));
        }

        let rng = SystemRandom::new();

        let mut salt = [0u8; SALT_LEN];
        rng.fill(&mut salt)
            .map_err(|_| Error::Storage("Failed to generate salt".to_string()))?;

        let mut master_key = vec![0u8; 32];
        rng.fill(&mut master_key)
            .map_err(|_| Error::Storage("Failed to generate master key".to_string()))?;

        let mut derived_key = derive_key(password, &salt);
        let encrypted_master_key = encrypt_data(&master_key, &derived_key, &rng);
        derived_key.zeroize();

        let master_key_file = MasterKeyFile {
            salt: STANDARD.encode(salt),
            encrypted_key: STANDARD.encode(encrypted_master_key?),
        };
        let content = serde_json::to_string_pretty(&master_key_file)
            .map_err(|e| Error::Storage(format!("Failed to serialize master key: {}", e)))?;
        write_secure_file(&self.master_key_path(), &content, "master key").await?;

        self.master_key = Some(SecureMasterKey::new(master_key));
        Ok(())
    }

    /// Unlock with `password`. A store without encryption needs no unlock.
    pub async fn unlock(&mut self, password: &str) -> Result<()> {
        if !self.is_encryption_initialized() {
            return Ok(());
        }

        let content = read_file(&self.master_key_path(), "master key").await?;
        let master_key_file: MasterKeyFile = serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("Failed to parse master key: {}", e)))?;

        let salt = STANDARD
            .decode(&master_key_file.salt)
            .map_err(|_| Error::Storage("Invalid password".to_string()))?;
        let encrypted_key = STANDARD
            .decode(&master_key_file.encrypted_key)
            .map_err(|_| Error::Storage("Invalid password".to_string()))?;

        let mut derived_key = derive_key(password, &salt);
        let master_key = decrypt_data(&encrypted_key, &derived_key);
        derived_key.zeroize();

        let master_key = master_key.map_err(|_| Error::Storage("Invalid password".to_string()))?;
        self.master_key = Some(SecureMasterKey::new(master_key));
        Ok(())
    }

    pub async fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self)
            .map_err(|e| Error::Storage(format!("Failed to serialize credentials: {}", e)))?;
        write_secure_file(&self.path, &content, "credentials").await
    }

    /// Store `credentials` under `name` and persist the store.
    pub async fn set_profile(&mut self, name: &str, credentials: &DqmCredentials) -> Result<()> {
        credentials.validate()?;
        if self.is_encryption_initialized() && !self.is_unlocked() {
            return Err(Error::Storage(
                "Credential store is encrypted but not unlocked".to_string(),
            ));
        }

        let now = chrono::Utc::now();
        let rng = SystemRandom::new();
        let plaintext = serde_json::to_vec(credentials)?;

        let value = match &self.master_key {
            Some(master_key) => {
                let encrypted = encrypt_data(&plaintext, master_key.as_bytes(), &rng)?;
                format!("{}{}", ENCRYPTED_PREFIX, STANDARD.encode(encrypted))
            }
            None => STANDARD.encode(&plaintext),
        };

        let profile = StoredProfile {
            name: name.to_string(),
            website_id: credentials.website_id.clone(),
            base_url: credentials.base_url.clone(),
            value,
            created_at: self
                .profiles
                .get(name)
                .map(|p| p.created_at)
                .unwrap_or(now),
            updated_at: now,
        };

        self.profiles.insert(name.to_string(), profile);
        self.save().await
    }

    /// Get a profile, decrypting it if needed.
    pub fn get_profile(&self, name: &str) -> Result<Option<DqmCredentials>> {
        let Some(profile) = self.profiles.get(name) else {
            return Ok(None);
        };

        let plaintext = match profile.value.strip_prefix(ENCRYPTED_PREFIX) {
            Some(encoded) => {
                let master_key = self.master_key.as_ref().ok_or_else(|| {
                    Error::Storage("Credential is encrypted but store is not unlocked".to_string())
                })?;
                let encrypted = STANDARD
                    .decode(encoded)
                    .map_err(|_| Error::Storage("Failed to decrypt credential".to_string()))?;
                decrypt_data(&encrypted, master_key.as_bytes())
                    .map_err(|_| Error::Storage("Failed to decrypt credential".to_string()))?
            }
            None => STANDARD
                .decode(&profile.value)
                .map_err(|e| Error::Storage(format!("Failed to decode credential: {}", e)))?,
        };

        let raw = String::from_utf8(plaintext)
            .map_err(|_| Error::Storage("Invalid UTF-8 in credential".to_string()))?;
        DqmCredentials::from_json(&raw).map(Some)
    }

    /// Profile JSON for `name`, as handed to a node through its context.
    pub fn resolve_json(&self, name: &str) -> Result<Option<String>> {
        self.get_profile(name)?
            .map(|creds| serde_json::to_string(&creds).map_err(Error::from))
            .transpose()
    }

    /// All profiles sorted by name (values stay sealed).
    pub fn list(&self) -> Vec<&StoredProfile> {
        let mut profiles: Vec<&StoredProfile> = self.profiles.values().collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        profiles
    }

    pub async fn delete(&mut self, name: &str) -> Result<bool> {
        let existed = self.profiles.remove(name).is_some();
        if existed {
            self.save().await?;
        }
        Ok(existed)
    }

    /// Mask a secret for display.
    pub fn mask_value(value: &str) -> String {
        let chars: Vec<char> = value.chars().collect();
        if chars.len() <= 4 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..2].iter().collect();
            let tail: String = chars[chars.len() - 2..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }
}

#[async_trait]
impl CredentialProvider for CredentialStore {
    async fn credentials(&self, profile: &str) -> Result<DqmCredentials> {
        debug!(profile, "Resolving DQM credential profile from store");
        self.get_profile(profile)?.ok_or_else(|| {
            Error::Credential(format!(
                "Credential '{}' not found. Add it with: crownpeak-dqm credentials set {}",
                profile, profile
            ))
        })
    }
}

fn derive_key(password: &str, salt: &[u8]) -> [u8; 32] {
    let mut derived_key = [0u8; 32];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        PBKDF2_ITERATIONS,
        salt,
        password.as_bytes(),
        &mut derived_key,
    );
    derived_key
}

async fn read_file(path: &Path, label: &str) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Storage(format!("Failed to read {}: {}", label, e)))
}

async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create directory: {}", e)))?;
    }
    Ok(())
}

async fn write_secure_file(path: &Path, content: &str, label: &str) -> Result<()> {
    ensure_parent_dir(path).await?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| Error::Storage(format!("Failed to write {}: {}", label, e)))?;
    set_file_permissions_owner_only(path).await
}

#[cfg(unix)]
async fn set_file_permissions_owner_only(path: &Path) -> Result<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, Permissions::from_mode(CREDENTIAL_FILE_MODE))
        .await
        .map_err(|e| Error::Storage(format!("Failed to secure file permissions: {}", e)))
}

#[cfg(not(unix))]
async fn set_file_permissions_owner_only(_path: &Path) -> Result<()> {
    Ok(())
}

/// Encrypt with AES-256-GCM; output is nonce followed by ciphertext+tag.
fn encrypt_data(plaintext: &[u8], key: &[u8], rng: &SystemRandom) -> Result<Vec<u8>> {
    let unbound_key = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| Error::Storage("Failed to create encryption key".to_string()))?;
    let key = LessSafeKey::new(unbound_key);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| Error::Storage("Failed to generate nonce".to_string()))?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut ciphertext = plaintext.to_vec();
    key.seal_in_place_append_tag(nonce, Aad::empty(), &mut ciphertext)
        .map_err(|_| Error::Storage("Encryption failed".to_string()))?;

    let mut result = nonce_bytes.to_vec();
    result.extend(ciphertext);
    Ok(result)
}

fn decrypt_data(ciphertext: &[u8], key: &[u8]) -> std::result::Result<Vec<u8>, ()> {
    if ciphertext.len() < NONCE_LEN {
        return Err(());
    }

    let (nonce_bytes, encrypted) = ciphertext.split_at(NONCE_LEN);
    let nonce_array: [u8; NONCE_LEN] = nonce_bytes.try_into().map_err(|_| ())?;
    let nonce = Nonce::assume_unique_for_key(nonce_array);

    let unbound_key = UnboundKey::new(&AES_256_GCM, key).map_err(|_| ())?;
    let key = LessSafeKey::new(unbound_key);

    let mut data = encrypted.to_vec();
    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut data)
        .map_err(|_| ())?;

    Ok(plaintext.to_vec())
}
