pub use tracing::{debug, error, info, warn};
pub use webpush_types::{ClResult, Error, ErrorObject, ErrorResponse};
