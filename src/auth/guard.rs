//! Brand-isolation guard.
//!
//! Every brand-scoped request passes through this check before any data
//! access. Global operations (the cross-brand ranking) skip it but still
//! require a validated token.

use crate::errors::AppError;

/// Canonical form of a brand identifier: lower-cased, trimmed.
pub fn canonicalize(brand: &str) -> String {
    brand.trim().to_lowercase()
}

/// Reject the request unless the token's brand claim matches the brand the
/// request is asking for. Pure equality on canonicalized identifiers.
pub fn ensure_same_brand(token_brand: &str, requested_brand: &str) -> Result<(), AppError> {
    if canonicalize(token_brand) == canonicalize(requested_brand) {
        Ok(())
    } else {
        Err(AppError::BrandMismatch)
    }
}
