//! The `Context` structure, which is also the main entry point for this
//! crate.

use std::os::raw::c_void;

use error::{Error, Result};

/// How a context should be brought into existence.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Mode {
    /// Attach to the context already current on the calling thread. No new
    /// native resource is created and nothing is owned.
    Detect,
    /// Create an entirely new, invisible offscreen context, owning every
    /// native resource along the way.
    Standalone,
    /// Create a new context sharing its object namespace (textures,
    /// buffers, programs) with the one currently current, on the same
    /// drawable. The new context is owned; the drawable is not.
    Share,
}

impl Mode {
    pub(crate) fn name(&self) -> &'static str {
        match *self {
            Mode::Detect => "detect",
            Mode::Standalone => "standalone",
            Mode::Share => "share",
        }
    }
}

/// The native graphics stack a `Context` drives. Fixed at creation.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum BackendKind {
    /// X11/GLX, through `libGL.so` and `libX11.so`.
    Glx,
    /// EGL, windowing-system independent and usable headlessly.
    Egl,
    /// Windows WGL, through `opengl32.dll`.
    Wgl,
    /// macOS CGL, through the OpenGL framework.
    Cgl,
}

impl BackendKind {
    pub(crate) fn name(&self) -> &'static str {
        match *self {
            BackendKind::Glx => "GLX",
            BackendKind::Egl => "EGL",
            BackendKind::Wgl => "WGL",
            BackendKind::Cgl => "CGL",
        }
    }

    /// The backend `Context::create()` picks on this platform.
    #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
    pub fn default_for_platform() -> BackendKind {
        BackendKind::Glx
    }
    /// The backend `Context::create()` picks on this platform.
    #[cfg(target_os="windows")]
    pub fn default_for_platform() -> BackendKind {
        BackendKind::Wgl
    }
    /// The backend `Context::create()` picks on this platform.
    #[cfg(target_os="macos")]
    pub fn default_for_platform() -> BackendKind {
        BackendKind::Cgl
    }
}

/// What a `Context` must tear down on `release()`.
///
/// Exactly what was created is destroyed, exactly once; a context that
/// attached to pre-existing native state owns nothing.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Ownership {
    /// Nothing is owned (detect mode).
    Nothing,
    /// The native context is owned, its drawable/display pre-existed
    /// (share mode).
    ContextOnly,
    /// The native context and the offscreen surface/window/display it was
    /// created for are all owned (standalone mode).
    ContextAndSurface,
}

impl Ownership {
    /// Does `release()` destroy the native context?
    pub fn owns_context(&self) -> bool {
        *self != Ownership::Nothing
    }
    /// Does `release()` destroy the offscreen surface/window/display too?
    pub fn owns_surface(&self) -> bool {
        *self == Ownership::ContextAndSurface
    }
}

/// Settings requested for context creation.
///
/// The `None`/`0` defaults resolve per backend.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ContextSettings {
    /// Creation mode; `None` picks the backend default (`Detect`
    /// everywhere it is meaningful, `Standalone` on EGL).
    pub mode: Option<Mode>,
    /// Overrides the default OpenGL library name (`libGL.so`,
    /// `opengl32.dll`, the OpenGL framework path).
    pub libgl: Option<String>,
    /// Overrides the default `libX11.so` name (GLX backend only).
    pub libx11: Option<String>,
    /// Overrides the default `libEGL.so` name (EGL backend only).
    pub libegl: Option<String>,
    /// Requested API version as a compact integer: `330` requests a 3.3
    /// core, forward-looking profile. `0` skips version negotiation and
    /// uses the backend's legacy creation entry point.
    pub glversion: i32,
    /// Index of the GPU device to create the context on (EGL backend
    /// only). Purely positional against the enumeration order.
    pub device_index: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            mode: None,
            libgl: None,
            libx11: None,
            libegl: None,
            glversion: 330,
            device_index: 0,
        }
    }
}

/// A hardware-accelerated OpenGL context, behind whichever native backend
/// this platform provides.
///
/// The context is thread-affine: every operation must happen on the thread
/// that is meant to own it. Dropping a `Context` does **not** release it;
/// call `release()` explicitly.
#[derive(Debug)]
pub enum Context {
    /// An X11/GLX context.
    #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
    Glx(::glx::GlxContext),
    /// An EGL context.
    #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
    Egl(::egl::EglContext),
    /// A Windows WGL context.
    #[cfg(target_os="windows")]
    Wgl(::wgl::WglContext),
    /// A macOS CGL context.
    #[cfg(target_os="macos")]
    Cgl(::cgl::CglContext),
}

impl Context {
    /// Creates a context with the platform's default backend.
    pub fn create(settings: &ContextSettings) -> Result<Context> {
        Self::create_with(BackendKind::default_for_platform(), settings)
    }

    /// Creates a context with an explicitly chosen backend.
    ///
    /// Fails with `Unsupported` when the backend does not exist on this
    /// platform.
    pub fn create_with(backend: BackendKind, settings: &ContextSettings) -> Result<Context> {
        match backend {
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            BackendKind::Glx => ::glx::GlxContext::create(settings).map(Context::Glx),
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            BackendKind::Egl => ::egl::EglContext::create(settings).map(Context::Egl),
            #[cfg(target_os="windows")]
            BackendKind::Wgl => ::wgl::WglContext::create(settings).map(Context::Wgl),
            #[cfg(target_os="macos")]
            BackendKind::Cgl => ::cgl::CglContext::create(settings).map(Context::Cgl),
            #[allow(unreachable_patterns)]
            other => Err(Error::unsupported_backend(other)),
        }
    }

    /// Which native stack this context drives.
    pub fn kind(&self) -> BackendKind {
        match *self {
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            Context::Glx(_) => BackendKind::Glx,
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            Context::Egl(_) => BackendKind::Egl,
            #[cfg(target_os="windows")]
            Context::Wgl(_) => BackendKind::Wgl,
            #[cfg(target_os="macos")]
            Context::Cgl(_) => BackendKind::Cgl,
        }
    }

    /// Resolves an arbitrary GL entry point by name, trying the plain
    /// library symbol table first and the backend's proc-address extension
    /// mechanism second.
    ///
    /// Returns a null pointer when the symbol is unresolved, or when the
    /// context was released.
    pub fn load(&self, symbol: &str) -> *const c_void {
        match *self {
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            Context::Glx(ref c) => c.load(symbol),
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            Context::Egl(ref c) => c.load(symbol),
            #[cfg(target_os="windows")]
            Context::Wgl(ref c) => c.load(symbol),
            #[cfg(target_os="macos")]
            Context::Cgl(ref c) => c.load(symbol),
        }
    }

    /// Saves whatever context is current on this thread, then makes this
    /// one current.
    pub fn enter(&mut self) -> Result<()> {
        match *self {
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            Context::Glx(ref mut c) => c.enter(),
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            Context::Egl(ref mut c) => c.enter(),
            #[cfg(target_os="windows")]
            Context::Wgl(ref mut c) => c.enter(),
            #[cfg(target_os="macos")]
            Context::Cgl(ref mut c) => c.enter(),
        }
    }

    /// Restores the context that was current before the matching
    /// `enter()`.
    pub fn exit(&mut self) -> Result<()> {
        match *self {
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            Context::Glx(ref mut c) => c.exit(),
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            Context::Egl(ref mut c) => c.exit(),
            #[cfg(target_os="windows")]
            Context::Wgl(ref mut c) => c.exit(),
            #[cfg(target_os="macos")]
            Context::Cgl(ref mut c) => c.exit(),
        }
    }

    /// Tears down every owned native resource, in reverse creation order.
    ///
    /// Idempotent: releasing twice is a no-op. Every owned teardown step is
    /// attempted even if an earlier one fails; failures are aggregated into
    /// one `ReleaseFailed` error.
    pub fn release(&mut self) -> Result<()> {
        match *self {
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            Context::Glx(ref mut c) => c.release(),
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            Context::Egl(ref mut c) => c.release(),
            #[cfg(target_os="windows")]
            Context::Wgl(ref mut c) => c.release(),
            #[cfg(target_os="macos")]
            Context::Cgl(ref mut c) => c.release(),
        }
    }

    /// Does this context own (and therefore destroy on release) its
    /// underlying native context?
    pub fn owns_its_context(&self) -> bool {
        match *self {
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            Context::Glx(ref c) => c.owns_its_context(),
            #[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
            Context::Egl(ref c) => c.owns_its_context(),
            #[cfg(target_os="windows")]
            Context::Wgl(ref c) => c.owns_its_context(),
            #[cfg(target_os="macos")]
            Context::Cgl(ref c) => c.owns_its_context(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_creation_request() {
        let settings = ContextSettings::default();
        assert_eq!(settings.mode, None);
        assert_eq!(settings.glversion, 330);
        assert_eq!(settings.device_index, 0);
        assert_eq!(settings.libgl, None);
    }

    #[test]
    fn ownership_tags() {
        assert!(!Ownership::Nothing.owns_context());
        assert!(!Ownership::Nothing.owns_surface());
        assert!(Ownership::ContextOnly.owns_context());
        assert!(!Ownership::ContextOnly.owns_surface());
        assert!(Ownership::ContextAndSurface.owns_context());
        assert!(Ownership::ContextAndSurface.owns_surface());
    }

    #[test]
    fn mode_names() {
        assert_eq!(Mode::Detect.name(), "detect");
        assert_eq!(Mode::Standalone.name(), "standalone");
        assert_eq!(Mode::Share.name(), "share");
    }
}
