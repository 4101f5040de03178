use http::StatusCode;

/// Maps a domain error onto the HTTP error surface
///
/// Each feature crate implements this on its own error enum; the route
/// handlers turn the mapping into a JSON error body. The enums
/// themselves never depend on axum.
pub trait HttpError: std::error::Error {
    /// Status code the error maps to
    fn status_code(&self) -> StatusCode;

    /// Stable wire identifier, e.g. `invalid_request_error`
    fn error_type(&self) -> &str;

    /// Human-readable message suitable for the response body
    fn client_message(&self) -> String;
}
