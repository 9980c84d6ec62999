use std::fmt;

/// Session-scoped logger used by the gate.
///
/// Every line carries the session `epoch` and the `principal` identifier (or
/// `-` when signed out), so interleaved resolutions can be told apart.
/// Session tokens must never be passed in; `SessionToken` already redacts
/// itself if one slips through.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SessionLog<'a> {
    epoch: u64,
    principal: &'a str,
}

impl<'a> SessionLog<'a> {
    pub(crate) fn new(epoch: u64, principal: Option<&'a str>) -> Self {
        Self {
            epoch,
            principal: principal.unwrap_or("-"),
        }
    }

    pub(crate) fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(epoch = self.epoch, principal = %self.principal, "{}", args);
    }

    pub(crate) fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(epoch = self.epoch, principal = %self.principal, "{}", args);
    }

    pub(crate) fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(epoch = self.epoch, principal = %self.principal, "{}", args);
    }

    pub(crate) fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(epoch = self.epoch, principal = %self.principal, "{}", args);
    }
}
