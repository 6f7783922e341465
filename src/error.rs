//! `Error` and `Result` types for this crate.
use std::fmt::{self, Display, Formatter};

pub(crate) type CowStr = ::std::borrow::Cow<'static, str>;

/// Different kinds of errors reported by most faillible operations.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum ErrorKind {
    /// A native library could not be opened by the platform loader.
    LibraryNotFound,
    /// A required native entry point is missing from an opened library.
    MissingEntryPoint,
    /// No OpenGL context was current on the calling thread, but one was
    /// required (attach and share modes).
    NoCurrentContext,
    /// The whole configuration fallback chain was exhausted without the
    /// driver accepting any candidate.
    NoMatchingConfiguration,
    /// The native context-creation call itself reported failure.
    ContextCreationFailed,
    /// The native "make current" call reported failure.
    MakeCurrentFailed,
    /// The requested GPU device index is not below the enumerated count.
    DeviceIndexOutOfRange,
    /// The requested creation mode is not supported by this backend.
    UnknownMode,
    /// Requested backend is not available for the target platform.
    Unsupported,
    /// The operation was invoked on a context that was already released.
    ContextReleased,
    /// A native call failed outside of context creation.
    NativeCallFailed,
    /// One or more teardown steps failed during `release`.
    ReleaseFailed,
}

/// An `ErrorKind` packed with the offending native call, the native error
/// code when the backend exposes one, and an optional `reason` string.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Error {
    /// The error kind.
    pub kind: ErrorKind,
    /// The native call or symbol this error originated from, if any.
    pub call: Option<CowStr>,
    /// The native numeric error code, when the backend exposes one
    /// (e.g `eglGetError()`, `GetLastError()`).
    pub code: Option<i64>,
    /// A hopefully useful reason string, or `None` if unknown or not
    /// meaningful.
    pub reason: Option<CowStr>,
}

/// Alias to `Result<T, Error>`.
pub type Result<T> = ::std::result::Result<T, Error>;

impl ErrorKind {
    pub(crate) fn describe_quick(&self) -> &'static str {
        match *self {
            ErrorKind::LibraryNotFound => "Native library not found",
            ErrorKind::MissingEntryPoint => "Required native entry point is missing",
            ErrorKind::NoCurrentContext => "No OpenGL context is current on this thread",
            ErrorKind::NoMatchingConfiguration => "No matching framebuffer configuration",
            ErrorKind::ContextCreationFailed => "Native context creation failed",
            ErrorKind::MakeCurrentFailed => "Could not make the context current",
            ErrorKind::DeviceIndexOutOfRange => "Device index is out of range",
            ErrorKind::UnknownMode => "Unknown creation mode for this backend",
            ErrorKind::Unsupported => "Unsupported backend for target platform",
            ErrorKind::ContextReleased => "Operation on a released context",
            ErrorKind::NativeCallFailed => "Native call has failed",
            ErrorKind::ReleaseFailed => "Some teardown steps failed",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.describe_quick())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.kind.describe_quick())?;
        if let Some(ref call) = self.call {
            write!(f, " in `{}`", call)?;
        }
        if let Some(code) = self.code {
            write!(f, " (native code {:#x})", code)?;
        }
        match self.reason {
            None => Ok(()),
            Some(ref s) => write!(f, ": {}", s),
        }
    }
}

impl ::std::error::Error for Error {
    fn description(&self) -> &str {
        self.kind.describe_quick()
    }
}

#[allow(unused_imports)]
pub(crate) use self::utils::*;

mod utils {
    #![allow(dead_code)]
    use super::*;

    impl Error {
        fn new(kind: ErrorKind) -> Self {
            Self { kind, call: None, code: None, reason: None }
        }
        /// Attaches a native error code to this error.
        pub fn with_code(mut self, code: i64) -> Self {
            self.code = Some(code);
            self
        }
        pub(crate) fn library_not_found<S: Into<CowStr>>(name: S, detail: Option<String>) -> Self {
            let mut e = Self::new(ErrorKind::LibraryNotFound);
            e.call = Some(name.into());
            e.reason = detail.map(Into::into);
            e
        }
        pub(crate) fn missing_entry_point(symbol: &'static str) -> Self {
            let mut e = Self::new(ErrorKind::MissingEntryPoint);
            e.call = Some(symbol.into());
            e
        }
        pub(crate) fn no_current_context(call: &'static str) -> Self {
            let mut e = Self::new(ErrorKind::NoCurrentContext);
            e.call = Some(call.into());
            e
        }
        pub(crate) fn no_matching_configuration(call: &'static str) -> Self {
            let mut e = Self::new(ErrorKind::NoMatchingConfiguration);
            e.call = Some(call.into());
            e.reason = Some("exhausted the configuration fallback chain".into());
            e
        }
        pub(crate) fn context_creation_failed(call: &'static str) -> Self {
            let mut e = Self::new(ErrorKind::ContextCreationFailed);
            e.call = Some(call.into());
            e
        }
        pub(crate) fn make_current_failed(call: &'static str) -> Self {
            let mut e = Self::new(ErrorKind::MakeCurrentFailed);
            e.call = Some(call.into());
            e
        }
        pub(crate) fn device_index_out_of_range(index: usize, count: usize) -> Self {
            let mut e = Self::new(ErrorKind::DeviceIndexOutOfRange);
            e.reason = Some(format!("device index {} not below device count {}", index, count).into());
            e
        }
        pub(crate) fn unknown_mode(mode: ::context::Mode, backend: &'static str) -> Self {
            let mut e = Self::new(ErrorKind::UnknownMode);
            e.reason = Some(format!("mode `{}` is not supported by the {} backend", mode.name(), backend).into());
            e
        }
        pub(crate) fn unsupported_backend(backend: ::context::BackendKind) -> Self {
            let mut e = Self::new(ErrorKind::Unsupported);
            e.reason = Some(format!("the {} backend is not available on this platform", backend.name()).into());
            e
        }
        pub(crate) fn context_released(op: &'static str) -> Self {
            let mut e = Self::new(ErrorKind::ContextReleased);
            e.call = Some(op.into());
            e
        }
        pub(crate) fn native_call_failed(call: &'static str) -> Self {
            let mut e = Self::new(ErrorKind::NativeCallFailed);
            e.call = Some(call.into());
            e
        }
        pub(crate) fn release_failed(calls: Vec<&'static str>) -> Self {
            let mut e = Self::new(ErrorKind::ReleaseFailed);
            e.reason = Some(calls.join(", ").into());
            e
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_call_and_code() {
        let e = Error::context_creation_failed("eglCreateContext").with_code(0x3003);
        let msg = format!("{}", e);
        assert!(msg.contains("eglCreateContext"));
        assert!(msg.contains("0x3003"));
    }

    #[test]
    fn display_without_details_is_just_the_kind() {
        let e = Error::no_matching_configuration("glXChooseVisual");
        assert_eq!(e.kind, ErrorKind::NoMatchingConfiguration);
        let msg = format!("{}", e);
        assert!(msg.contains("glXChooseVisual"));
        assert!(msg.contains("fallback chain"));
    }
}
