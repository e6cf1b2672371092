pub mod requests;
pub mod responses;

pub use requests::AddWatchlistRequest;
pub use responses::{api_error, from_core_error, ApiError, ErrorResponse, HealthResponse, WatchlistResponse};
