//! glcx - bare OpenGL context management.
//!
//! This crate provides one uniform lifecycle (create, enter, exit, load,
//! release) over the divergent native context-management stacks: GLX on
//! X11-based targets, EGL for headless use, WGL on Windows and CGL on macOS.
//! All native entry points are resolved at runtime through the platform
//! dynamic loader; nothing is linked at build time.

#![warn(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate log;

#[cfg(unix)]
extern crate libc;
#[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
extern crate x11_dl;
#[cfg(target_os="windows")]
extern crate winapi;

pub mod error;
pub use error::{Error, ErrorKind, Result};

#[macro_use]
pub mod loader;
mod current;
mod negotiate;
mod version;

pub mod context;
pub use context::{BackendKind, Context, ContextSettings, Mode, Ownership};

#[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
pub mod glx;

#[cfg(any(target_os="linux", target_os="freebsd", target_os="dragonfly", target_os="openbsd", target_os="netbsd"))]
pub mod egl;

#[cfg(target_os="windows")]
pub mod wgl;

#[cfg(target_os="macos")]
pub mod cgl;
