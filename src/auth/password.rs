use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

/// Salted Argon2 hash in PHC string form.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// A stored hash that cannot be parsed counts as a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!(error = %e, "argon2 parse hash error");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

/// Runs a full verification against a throwaway hash so that a login for an
/// unknown account costs the same as a wrong password. Always `false`.
pub fn verify_dummy_password(plain: &str) -> bool {
    lazy_static! {
        static ref DUMMY_HASH: Option<String> = hash_password("dummy-password-never-matches").ok();
    }
    match DUMMY_HASH.as_deref() {
        Some(hash) => {
            let _ = verify_password(plain, hash);
        }
        None => error!("dummy password hash unavailable"),
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash));
    }

    #[test]
    fn hash_never_contains_plaintext() {
        let password = "password123";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!hash.contains(password));
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("password123").expect("hash a");
        let b = hash_password("password123").expect("hash b");
        assert_ne!(a, b);
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn dummy_verification_never_matches() {
        assert!(!verify_dummy_password("password123"));
        assert!(!verify_dummy_password("dummy-password-never-matches"));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-valid-hash"));
    }
}
