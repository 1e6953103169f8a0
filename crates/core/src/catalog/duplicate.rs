//! Module duplication and input checks.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::catalog::types::{ModuleContent, PricingType};

/// Suffix appended to the code of a duplicated module.
pub const COPY_CODE_SUFFIX: &str = "-copy";

/// Suffix appended to the title of a duplicated module.
pub const COPY_TITLE_SUFFIX: &str = " (copy)";

/// Longest module code a row can hold.
pub const MAX_CODE_LEN: usize = 64;

/// Longest module title a row can hold.
pub const MAX_TITLE_LEN: usize = 255;

/// Catalog errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Duration must be positive.
    #[error("Module duration must be positive (got {0})")]
    InvalidDuration(Decimal),
    /// Price must not be negative.
    #[error("Module price must not be negative (got {0})")]
    NegativePrice(Decimal),
    /// Hourly and fixed pricing need a price.
    #[error("A price is required for {0} pricing")]
    PriceRequired(PricingType),
    /// Code or title is blank.
    #[error("Field {0} must not be empty")]
    EmptyField(&'static str),
    /// Code or title is longer than its column.
    #[error("Field {field} must be at most {max} characters")]
    TooLong {
        /// Offending field.
        field: &'static str,
        /// Column length.
        max: usize,
    },
}

impl CatalogError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDuration(_) => "INVALID_DURATION",
            Self::NegativePrice(_) => "INVALID_PRICE",
            Self::PriceRequired(_) => "PRICE_REQUIRED",
            Self::EmptyField(_) | Self::TooLong { .. } => "VALIDATION_ERROR",
        }
    }
}

impl ModuleContent {
    /// Checks the business rules a stored module must satisfy.
    ///
    /// # Errors
    /// Returns the first rule broken.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.code.trim().is_empty() {
            return Err(CatalogError::EmptyField("code"));
        }
        if self.title.trim().is_empty() {
            return Err(CatalogError::EmptyField("title"));
        }
        if self.code.chars().count() > MAX_CODE_LEN {
            return Err(CatalogError::TooLong {
                field: "code",
                max: MAX_CODE_LEN,
            });
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(CatalogError::TooLong {
                field: "title",
                max: MAX_TITLE_LEN,
            });
        }
        if self.duration_hours <= Decimal::ZERO {
            return Err(CatalogError::InvalidDuration(self.duration_hours));
        }
        match (self.pricing_type, self.price) {
            (_, Some(price)) if price < Decimal::ZERO => Err(CatalogError::NegativePrice(price)),
            (PricingType::Hourly | PricingType::Fixed, None) => {
                Err(CatalogError::PriceRequired(self.pricing_type))
            }
            _ => Ok(()),
        }
    }

    /// Deep copy for a new module.
    ///
    /// Metadata and taxonomy terms are cloned; code and title get a copy
    /// suffix and the copy starts inactive. `self` is left untouched.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            code: format!("{}{COPY_CODE_SUFFIX}", self.code),
            title: format!("{}{COPY_TITLE_SUFFIX}", self.title),
            is_active: false,
            ..self.clone()
        }
    }

    /// Normalizes taxonomy terms: trimmed, lowercase, sorted, without blanks
    /// or duplicates.
    pub fn normalize_terms(&mut self) {
        self.skills = normalize(std::mem::take(&mut self.skills));
        self.categories = normalize(std::mem::take(&mut self.categories));
    }
}

fn normalize(terms: Vec<String>) -> Vec<String> {
    let mut terms: Vec<String> = terms
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    terms.sort();
    terms.dedup();
    terms
}
