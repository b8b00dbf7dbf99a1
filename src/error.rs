//! Error types for cutting-plan generation.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("invalid stock: {reason}")]
    InvalidStock { reason: String },

    #[error("invalid piece on line {line}: {reason}")]
    InvalidPiece { line: usize, reason: String },

    #[error("{count} piece(s) do not fit the stock: {labels}")]
    OversizedPieces { count: usize, labels: String },
}

impl PlanError {
    pub fn invalid_bar(length: f64) -> Self {
        PlanError::InvalidStock {
            reason: format!("bar length must be positive, got {length}"),
        }
    }

    pub fn invalid_sheet(width: f64, height: f64) -> Self {
        PlanError::InvalidStock {
            reason: format!("sheet dimensions must be positive, got {width}x{height}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
