//! Result type alias for transformation operations

use crate::error::RecastError;

/// Standard Result type for transformation operations
pub type Result<T> = std::result::Result<T, RecastError>;
