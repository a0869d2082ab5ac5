//! Cryptographic primitives (spec §4.1).
//!
//! Centralizes password hashing, per-user signing-key derivation, JWT
//! mint/verify, the fast unverified user-id extraction, PKCE, and the
//! age-encrypted `SecureStore`. Grounded in the teacher's `crypto/keys.rs`
//! and `auth.rs` for style (doc density, `#[must_use]`, `zeroize` on key
//! material) though every algorithm here is new: the teacher signs A2A
//! protocol messages with Ed25519, this backend signs session tokens with
//! a credential-derived HMAC key.

/// Password hashing and constant-time verification.
pub mod password;
/// HMAC-derived per-user signing key and HS256 JWT mint/verify/parse.
pub mod jwt;
/// PKCE code verifier and S256 challenge generation.
pub mod pkce;
/// Age-encrypted, identity-file-backed secret store for config blobs.
pub mod secure_store;

pub use jwt::{Claims, SigningKey, TokenType};
pub use secure_store::SecureStore;
