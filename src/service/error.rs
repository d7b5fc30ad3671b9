use thiserror::Error;
use uuid::Uuid;

use crate::error::{ErrorMessage, HttpError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Donation amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("Musician {0} not found")]
    MusicianNotFound(Uuid),

    #[error("Musician {0} has not completed payment account setup")]
    PayeeNotEligible(Uuid),

    #[error("Donation {0} not found")]
    DonationNotFound(Uuid),

    #[error("Show {0} not found for this musician")]
    ShowNotFound(Uuid),

    #[error("Payment gateway declined the authorization: {0}")]
    GatewayDeclined(String),

    #[error("Payment gateway unreachable: {0}")]
    GatewayUnreachable(String),

    #[error("Payment gateway timed out after {0}s")]
    GatewayTimeout(u64),

    #[error("Stats bootstrap timed out after {0}s")]
    BootstrapTimeout(u64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::MusicianNotFound(_)
            | ServiceError::DonationNotFound(_)
            | ServiceError::ShowNotFound(_) => HttpError::not_found(error.to_string()),

            ServiceError::InvalidAmount(_) | ServiceError::Validation(_) => {
                HttpError::bad_request(error.to_string())
            }

            ServiceError::PayeeNotEligible(_) | ServiceError::GatewayDeclined(_) => {
                HttpError::payment_required(error.to_string())
            }

            ServiceError::GatewayUnreachable(_) | ServiceError::GatewayTimeout(_) => {
                HttpError::bad_gateway(error.to_string())
            }

            // Database errors carry internals the client has no business
            // seeing; the detail stays in the logs.
            ServiceError::Database(_) => {
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }

            _ => HttpError::server_error(error.to_string()),
        }
    }
}
