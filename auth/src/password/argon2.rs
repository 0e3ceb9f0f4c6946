use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::errors::PasswordError;

/// Fixed salt for hashing when there is no stored hash to verify against.
const DUMMY_SALT: &str = "ZHVtbXlzYWx0ZHVtbXlzYWx0";

/// Password hashing implementation.
///
/// Provides salted one-way password hashing (internally uses Argon2id).
/// The cost parameters are fixed for the lifetime of an instance; hashes
/// produced under different parameters still verify because each stored
/// hash carries its own parameters.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create a new password hasher with the Argon2id default cost.
    ///
    /// # Returns
    /// PasswordHasher instance configured with secure defaults
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Create a password hasher with an explicit Argon2id cost.
    ///
    /// # Arguments
    /// * `memory_kib` - Memory cost in KiB
    /// * `iterations` - Number of passes over memory
    /// * `parallelism` - Degree of parallelism (lanes)
    ///
    /// # Returns
    /// PasswordHasher instance using the given cost
    ///
    /// # Errors
    /// * `InvalidParameters` - Parameters are outside Argon2's accepted range
    pub fn with_cost(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| PasswordError::InvalidParameters(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext password securely.
    ///
    /// A fresh random salt is generated on every call, so hashing the same
    /// password twice yields two different strings.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// Parameters and salt are taken from the stored hash, and the digest
    /// comparison is constant-time.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored password hash in PHC string format
    ///
    /// # Returns
    /// True if password matches, false otherwise
    ///
    /// # Errors
    /// * `VerificationFailed` - Stored hash is not a valid PHC string
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            PasswordError::VerificationFailed(format!("Invalid password hash: {}", e))
        })?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Spend the same work as `verify` without a stored hash.
    ///
    /// Used when the account does not exist, so the response takes as long
    /// as a wrong password would. Always returns `false`.
    pub fn verify_dummy(&self, password: &str) -> bool {
        if let Ok(salt) = SaltString::from_b64(DUMMY_SALT) {
            let _ = self.argon2.hash_password(password.as_bytes(), &salt);
        }
        false
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
