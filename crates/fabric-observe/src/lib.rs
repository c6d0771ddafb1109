mod logger;
pub use logger::*;

mod report;
pub use report::{log_response, log_snapshot};
