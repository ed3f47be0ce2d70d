pub use tracing::{debug, error, info, warn};
pub use webpush_types::{ClResult, Error, ErrorObject, ErrorResponse};

pub use crate::app::App;
