use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use brigada_core::AppError;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect::<Vec<_>>();
    messages.sort();
    messages.join(", ")
}

fn data_error_message(body_text: &str) -> String {
    let message = body_text
        .strip_prefix(DATA_ERROR_PREFIX)
        .unwrap_or(body_text);
    // serde_json appends the position; clients only need the field and reason
    match message.find(" at line ") {
        Some(idx) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

/// JSON body extractor that also runs `validator` rules.
///
/// Rejections:
/// - missing field, wrong JSON type, bad syntax or content type: 400
/// - a value a domain type refuses (DNI, e-mail, unknown enum variant): 422
/// - a `#[validate]` rule failing: 422
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let error_msg = rejection.body_text();

                if error_msg.contains("missing field") {
                    let field = error_msg
                        .split("missing field `")
                        .nth(1)
                        .and_then(|s| s.split('`').next())
                        .unwrap_or("unknown");
                    return AppError::new(
                        StatusCode::BAD_REQUEST,
                        anyhow!("{} is required", field),
                    );
                }

                if error_msg.contains("invalid type") {
                    return AppError::new(
                        StatusCode::BAD_REQUEST,
                        anyhow!("Invalid field type in request"),
                    );
                }

                match rejection {
                    JsonRejection::MissingJsonContentType(_) => AppError::new(
                        StatusCode::BAD_REQUEST,
                        anyhow!("Missing 'Content-Type: application/json' header"),
                    ),
                    JsonRejection::JsonDataError(_) => AppError::new(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        anyhow!("{}", data_error_message(&error_msg)),
                    ),
                    _ => AppError::new(StatusCode::BAD_REQUEST, anyhow!("Invalid request body")),
                }
            })?;

        value.validate().map_err(|errors| {
            AppError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                anyhow!("{}", format_errors(&errors)),
            )
        })?;

        Ok(ValidatedJson(value))
    }
}
