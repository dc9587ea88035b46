use http::StatusCode;

/// Domain errors that map onto HTTP responses
///
/// Each subsystem crate implements this on its error enum; the route
/// layer renders the JSON error body from it, so domain errors never
/// depend on axum directly.
pub trait HttpError: std::error::Error {
    /// Status code the error surfaces as
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error type (e.g. `validation_failure`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;
}
