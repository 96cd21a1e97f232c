//! Handler result conversion.

use crate::error::BoxError;

/// Converts a handler's return value into success or failure.
///
/// # Default Implementations
///
/// - `()` → success
/// - `Result<(), E>` → success, or failure carrying `E` (anything that
///   converts into [`BoxError`], including `BoxError` itself)
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be returned from an event handler",
    label = "handlers must return `()` or `Result<(), E>`",
    note = "the error type of a fallible handler must convert into `BoxError`"
)]
pub trait IntoHandlerResult {
    /// Convert the output into a dispatch outcome.
    fn into_handler_result(self) -> Result<(), BoxError>;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E> IntoHandlerResult for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_handler_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}
