//! Credential storage contract.

/// Holds the access token shared by every call of an application.
///
/// Implementations are read on every dispatch and written by
/// `authenticate`/`logout`, so both methods must be cheap and must not block
/// on I/O for long.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `AuthenticationStorage`",
    label = "missing `AuthenticationStorage` implementation",
    note = "Storages must implement `access_token` and `set_access_token`."
)]
pub trait AuthenticationStorage: Send + Sync + 'static {
    /// The stored token.
    fn access_token(&self) -> Option<String>;

    /// Replace the stored token. `None` clears it.
    fn set_access_token(&self, token: Option<String>);
}
