//! Bootstrap account creation. The first `jefe` can only be created here;
//! after that chiefs manage personnel through the API.

use anyhow::{Context, bail};
use brigada_core::hash_password;
use brigada_models::{Dni, Email, UserId};
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct NewChief {
    pub first_name: String,
    pub last_name: String,
    pub dni: Dni,
    pub email: Email,
    pub password: String,
}

impl NewChief {
    /// Validates raw input before anything touches the database.
    pub fn parse(
        first_name: &str,
        last_name: &str,
        dni: &str,
        email: &str,
        password: &str,
    ) -> anyhow::Result<Self> {
        let first_name = first_name.trim();
        let last_name = last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            bail!("first and last name are required");
        }
        if password.chars().count() < 8 {
            bail!("password must be at least 8 characters");
        }
        Ok(Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            dni: Dni::new(dni)?,
            email: Email::new(email)?,
            password: password.to_string(),
        })
    }
}

pub async fn create_chief(db: &PgPool, chief: &NewChief) -> anyhow::Result<UserId> {
    let hashed = hash_password(&chief.password).map_err(|e| e.error)?;

    let id = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (first_name, last_name, dni, email, password, role)
         VALUES ($1, $2, $3, $4, $5, 'jefe')
         ON CONFLICT DO NOTHING
         RETURNING id",
    )
    .bind(&chief.first_name)
    .bind(&chief.last_name)
    .bind(&chief.dni)
    .bind(&chief.email)
    .bind(&hashed)
    .fetch_optional(db)
    .await
    .context("failed to insert chief")?;

    match id {
        Some(id) => {
            tracing::info!(user_id = %id, "chief created");
            Ok(id)
        }
        None => bail!("a user with this email or DNI already exists"),
    }
}
