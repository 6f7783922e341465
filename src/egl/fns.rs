//! EGL types, tokens and entry-point tables.
//!
//! EGL has no usable Rust type crate in this stack, so the handful of
//! types and tokens this backend negotiates with are declared here, the
//! same way the X11 side declares bits its type crate lacks.

#![allow(missing_docs)]

use std::mem;
use std::os::raw::{c_int, c_uint, c_void};

pub type EGLint = c_int;
pub type EGLenum = c_uint;
pub type EGLBoolean = c_uint;
pub type EGLDisplay = *mut c_void;
pub type EGLConfig = *mut c_void;
pub type EGLSurface = *mut c_void;
pub type EGLContext = *mut c_void;
pub type EGLDeviceEXT = *mut c_void;
pub type EGLNativeDisplayType = *mut c_void;

pub const EGL_DEFAULT_DISPLAY: EGLNativeDisplayType = 0 as EGLNativeDisplayType;
pub const EGL_NO_CONTEXT: EGLContext = 0 as EGLContext;
pub const EGL_NO_SURFACE: EGLSurface = 0 as EGLSurface;
pub const EGL_PBUFFER_BIT: EGLint = 0x0001;
pub const EGL_RENDERABLE_TYPE: EGLint = 0x3040;
pub const EGL_NONE: EGLint = 0x3038;
pub const EGL_OPENGL_BIT: EGLint = 0x0008;
pub const EGL_BLUE_SIZE: EGLint = 0x3022;
pub const EGL_GREEN_SIZE: EGLint = 0x3023;
pub const EGL_RED_SIZE: EGLint = 0x3024;
pub const EGL_DEPTH_SIZE: EGLint = 0x3025;
pub const EGL_SURFACE_TYPE: EGLint = 0x3033;
pub const EGL_OPENGL_API: EGLenum = 0x30A2;
pub const EGL_CONTEXT_MAJOR_VERSION: EGLint = 0x3098;
pub const EGL_CONTEXT_MINOR_VERSION: EGLint = 0x30FB;
pub const EGL_CONTEXT_OPENGL_PROFILE_MASK: EGLint = 0x30FD;
pub const EGL_CONTEXT_OPENGL_CORE_PROFILE_BIT: EGLint = 0x0001;
pub const EGL_PLATFORM_DEVICE_EXT: EGLenum = 0x313F;
pub const EGL_DRAW: EGLint = 0x3059;
pub const EGL_READ: EGLint = 0x305A;
pub const EGL_EXTENSIONS: EGLint = 0x3055;

pub mod fn_types {
    #![allow(non_camel_case_types)]

    use std::os::raw::{c_char, c_void};
    use super::*;

    pub type eglGetError = unsafe extern "C" fn() -> EGLint;
    pub type eglGetDisplay = unsafe extern "C" fn(EGLNativeDisplayType) -> EGLDisplay;
    pub type eglInitialize = unsafe extern "C" fn(EGLDisplay, *mut EGLint, *mut EGLint) -> EGLBoolean;
    pub type eglChooseConfig = unsafe extern "C" fn(EGLDisplay, *const EGLint, *mut EGLConfig, EGLint, *mut EGLint) -> EGLBoolean;
    pub type eglBindAPI = unsafe extern "C" fn(EGLenum) -> EGLBoolean;
    pub type eglCreateContext = unsafe extern "C" fn(EGLDisplay, EGLConfig, EGLContext, *const EGLint) -> EGLContext;
    pub type eglDestroyContext = unsafe extern "C" fn(EGLDisplay, EGLContext) -> EGLBoolean;
    pub type eglMakeCurrent = unsafe extern "C" fn(EGLDisplay, EGLSurface, EGLSurface, EGLContext) -> EGLBoolean;
    pub type eglGetProcAddress = unsafe extern "C" fn(*const c_char) -> Option<unsafe extern "C" fn()>;
    pub type eglGetCurrentDisplay = unsafe extern "C" fn() -> EGLDisplay;
    pub type eglGetCurrentContext = unsafe extern "C" fn() -> EGLContext;
    pub type eglGetCurrentSurface = unsafe extern "C" fn(EGLint) -> EGLSurface;
    pub type eglQueryDevicesEXT = unsafe extern "C" fn(EGLint, *mut EGLDeviceEXT, *mut EGLint) -> EGLBoolean;
    pub type eglQueryDeviceStringEXT = unsafe extern "C" fn(EGLDeviceEXT, EGLint) -> *const c_char;
    pub type eglGetPlatformDisplayEXT = unsafe extern "C" fn(EGLenum, *mut c_void, *const EGLint) -> EGLDisplay;
}

fn_table! {
    /// The EGL entry points this backend cannot run without, resolved from
    /// `libEGL.so`.
    pub struct EglFns {
        eglGetError: fn_types::eglGetError,
        eglGetDisplay: fn_types::eglGetDisplay,
        eglInitialize: fn_types::eglInitialize,
        eglChooseConfig: fn_types::eglChooseConfig,
        eglBindAPI: fn_types::eglBindAPI,
        eglCreateContext: fn_types::eglCreateContext,
        eglDestroyContext: fn_types::eglDestroyContext,
        eglMakeCurrent: fn_types::eglMakeCurrent,
        eglGetProcAddress: fn_types::eglGetProcAddress,
        eglGetCurrentDisplay: fn_types::eglGetCurrentDisplay,
        eglGetCurrentContext: fn_types::eglGetCurrentContext,
        eglGetCurrentSurface: fn_types::eglGetCurrentSurface,
    }
}

/// Optional device-enumeration entry points.
///
/// Drivers only expose these through `eglGetProcAddress`, never through the
/// plain library symbol table, so they cannot live in `EglFns`.
#[allow(non_snake_case)]
#[derive(Copy, Clone, Debug)]
pub struct EglExt {
    pub eglQueryDevicesEXT: Option<fn_types::eglQueryDevicesEXT>,
    pub eglQueryDeviceStringEXT: Option<fn_types::eglQueryDeviceStringEXT>,
    pub eglGetPlatformDisplayEXT: Option<fn_types::eglGetPlatformDisplayEXT>,
}

impl EglExt {
    /// Resolves every extension entry point, keeping `None` for the absent
    /// ones. Absence only matters once a caller asks for a specific device.
    pub fn resolve(egl: &EglFns) -> EglExt {
        unsafe fn ext_fn<T>(egl: &EglFns, name: &'static [u8]) -> Option<T> {
            let f = (egl.eglGetProcAddress)(name.as_ptr() as *const _);
            match f {
                None => {
                    warn!("Couldn't load `{}`", ::std::str::from_utf8(&name[..name.len() - 1]).unwrap_or("?"));
                    None
                },
                Some(f) => Some(mem::transmute_copy(&f)),
            }
        }
        unsafe {
            EglExt {
                eglQueryDevicesEXT: ext_fn(egl, b"eglQueryDevicesEXT\0"),
                eglQueryDeviceStringEXT: ext_fn(egl, b"eglQueryDeviceStringEXT\0"),
                eglGetPlatformDisplayEXT: ext_fn(egl, b"eglGetPlatformDisplayEXT\0"),
            }
        }
    }
}
