//! Error code constants
//!
//! Front-ends map these string codes to localized messages.

/// A required argument was null
pub const ERR_NULL_ARGUMENT: &str = "ERR_NULL_ARGUMENT";

/// A definition slot in the configuration was empty
pub const ERR_MISSING_DEFINITION: &str = "ERR_MISSING_DEFINITION";

/// Reading or writing the persisted definition list failed
pub const ERR_STORAGE: &str = "ERR_STORAGE";

/// A filesystem operation failed
pub const ERR_IO: &str = "ERR_IO";

/// The background sync worker failed to complete
pub const ERR_WORKER: &str = "ERR_WORKER";
