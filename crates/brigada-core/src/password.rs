use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal_error(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal_error(format!("Failed to verify password: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash_password("turno-de-noche").unwrap();
        assert_ne!(hashed, "turno-de-noche");
        assert!(verify_password("turno-de-noche", &hashed).unwrap());
        assert!(!verify_password("turno-de-dia", &hashed).unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let a = hash_password("parque-central").unwrap();
        let b = hash_password("parque-central").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("x", "not-a-bcrypt-hash").is_err());
    }
}
