use thiserror::Error;

/// Failures surfaced to whoever starts a focus session.
///
/// The `Display` output doubles as the reason string shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FocusError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl FocusError {
    pub(crate) fn storage(err: &color_eyre::eyre::Report) -> Self {
        Self::Storage(format!("{err:#}"))
    }
}
