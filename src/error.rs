use std::fmt;

/// Error kinds surfaced internally before being collapsed to a boolean at the
/// `MultiReader` public boundary (spec §7).
#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    #[error("failed to open source '{path}'")]
    OpenFailed { path: String },

    #[error("sources are not mutually compatible: {reason}")]
    Incompatible { reason: String },

    #[error("source '{path}' refused to reposition: {reason}")]
    RepositionPartial { path: String, reason: String },

    #[error("index unavailable for source '{path}'")]
    IndexMissing { path: String },

    #[error("could not build merge cache: {reason}")]
    CacheBuildFailed { reason: String },
}

/// Sink for the diagnostic text the spec requires alongside every
/// boolean-false return (§6, §7). The default implementation forwards to the
/// `log` crate; callers embedding this engine in a larger application can
/// supply their own to route diagnostics into their own logging pipeline.
pub trait DiagnosticSink {
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default sink, used when the caller does not provide one.
#[derive(Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn warn(&self, message: &str) {
        log::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        log::error!("{}", message);
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogSink")
    }
}
