//! JWT claim structures.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Access token claims.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    /// Role slug: `jefe`, `mando`, `bombero` or `empleado`
    pub role: String,
    pub mando_especial: bool,
    /// Permission names granted by the role and the mando especial flag
    pub permissions: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

/// Refresh token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    /// Unique token identifier so two refresh tokens issued in the same second differ
    pub jti: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_claims_round_trip_through_json() {
        let claims = Claims {
            sub: "5f7c1a2e-0000-0000-0000-000000000001".to_string(),
            email: "ana@bomberos.es".to_string(),
            role: "mando".to_string(),
            mando_especial: false,
            permissions: vec!["guards:manage".to_string()],
            exp: 2_000_000_000,
            iat: 1_999_999_000,
        };
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains(r#""role":"mando""#));
        let back: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.permissions, claims.permissions);
    }

    #[test]
    fn refresh_claims_do_not_parse_as_access_claims() {
        let json = r#"{"sub":"u","exp":1,"iat":1,"jti":"x"}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
    }
}
