//! Age-encrypted, identity-file-backed secret store (spec §4.1, §4.8).
//!
//! `SecureStore` is the only component that ever holds plaintext
//! configuration: it reads the age identity once at startup, and every
//! `Get`/`Save` call decrypts or encrypts against the `config_blobs` table
//! through [`crate::database::Database`]. No other component is allowed to
//! persist plaintext.
//!
//! The teacher never encrypts data at rest this way (its `encrypt_data`
//! helper used raw AES-GCM over a symmetric key read from an environment
//! variable); `age` is new to the dependency tree for exactly this reason,
//! chosen because it is the idiomatic ecosystem crate for identity-file
//! based encryption in Rust (see DESIGN.md).

use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use age::secrecy::ExposeSecret;

use crate::database::Database;
use crate::errors::{AppError, ErrorCode};

/// Holds the age identity/recipient pair and a database handle, and
/// performs encrypt-on-save / decrypt-on-get against the `config_blobs`
/// table.
pub struct SecureStore {
    identity: age::x25519::Identity,
    recipient: age::x25519::Recipient,
    db: Database,
}

impl SecureStore {
    /// Loads the age identity from `identity_path` (read once, at startup)
    /// and binds this store to `db` for blob persistence.
    ///
    /// # Errors
    /// Returns [`AppError`] if the identity file is missing, unreadable, or
    /// does not contain a valid `AGE-SECRET-KEY-1...` line.
    pub fn load(identity_path: &Path, db: Database) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(identity_path).map_err(|e| {
            AppError::new(
                ErrorCode::InternalError,
                format!("reading age identity {}: {e}", identity_path.display()),
            )
        })?;
        let identity_line = contents
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .ok_or_else(|| {
                AppError::new(ErrorCode::InternalError, "age identity file has no key line")
            })?;
        let identity = age::x25519::Identity::from_str(identity_line)
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("parsing age identity: {e}")))?;
        let recipient = identity.to_public();
        Ok(Self {
            identity,
            recipient,
            db,
        })
    }

    /// Decrypts and returns the plaintext and format tag of a config blob.
    ///
    /// When `generation` is `None`, fetches the highest generation for
    /// `scope` (the startup-load path in spec §4.8); otherwise fetches the
    /// exact generation requested.
    ///
    /// # Errors
    /// Returns [`ErrorCode::NotFound`] if no matching row exists, or
    /// [`ErrorCode::InternalError`] if decryption fails.
    pub async fn get(
        &self,
        scope: &str,
        generation: Option<i64>,
    ) -> Result<(Vec<u8>, String), AppError> {
        let blob = match generation {
            Some(gen) => self.db.config_blobs().get(scope, gen).await?,
            None => self.db.config_blobs().get_latest(scope).await?,
        }
        .ok_or(ErrorCode::NotFound)?;

        let decryptor = age::Decryptor::new(&blob.ciphertext[..])
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("age decryptor: {e}")))?;
        let age::Decryptor::Recipients(decryptor) = decryptor else {
            return Err(AppError::new(
                ErrorCode::InternalError,
                "config blob is not recipient-encrypted",
            ));
        };
        let mut plaintext = Vec::new();
        let identities: Vec<&dyn age::Identity> = vec![&self.identity];
        let mut reader = decryptor
            .decrypt(identities.into_iter())
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("age decrypt: {e}")))?;
        reader
            .read_to_end(&mut plaintext)
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("reading plaintext: {e}")))?;
        Ok((plaintext, blob.format))
    }

    /// Encrypts `plaintext` and installs it as the next generation for
    /// `scope`.
    ///
    /// # Errors
    /// Returns [`AppError`] if encryption or the database insert fails.
    pub async fn save(
        &self,
        scope: &str,
        plaintext: &[u8],
        format: &str,
        description: &str,
    ) -> Result<i64, AppError> {
        let recipients: Vec<Box<dyn age::Recipient + Send>> =
            vec![Box::new(self.recipient.clone())];
        let encryptor = age::Encryptor::with_recipients(recipients.into_iter().map(|r| r as _))
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("age encryptor: {e}")))?;
        let mut ciphertext = Vec::new();
        let mut writer = encryptor
            .wrap_output(&mut ciphertext)
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("age wrap: {e}")))?;
        writer
            .write_all(plaintext)
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("age write: {e}")))?;
        writer
            .finish()
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("age finish: {e}")))?;

        self.db
            .config_blobs()
            .insert_next_generation(scope, &ciphertext, format, description)
            .await
            .map_err(Into::into)
    }

    /// The secret export is only ever used by the admin binary to print the
    /// public recipient string for operator bootstrap instructions.
    #[must_use]
    pub fn recipient_string(&self) -> String {
        self.recipient.to_string()
    }

    #[allow(dead_code)]
    fn expose_identity_for_tests(&self) -> String {
        self.identity.to_string().expose_secret().to_string()
    }
}
