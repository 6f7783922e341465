//! GLX/Xlib entry-point tables, resolved at runtime from `libGL.so` and
//! `libX11.so`.

#![allow(missing_docs)]

use std::os::raw::{c_int, c_void};

use x11_dl::xlib as x;

/// Opaque `__GLXcontextRec` pointer.
pub type GLXContext = *mut c_void;
/// Opaque `__GLXFBConfigRec` pointer.
pub type GLXFBConfig = *mut c_void;
/// A GLX window or pixmap.
pub type GLXDrawable = x::XID;

// The GLX tokens this backend negotiates with. `x11-dl` is only used for
// Xlib types here, so the handful of GLX constants live with the backend.
pub const GLX_RGBA: c_int = 4;
pub const GLX_DOUBLEBUFFER: c_int = 5;
pub const GLX_RED_SIZE: c_int = 8;
pub const GLX_GREEN_SIZE: c_int = 9;
pub const GLX_BLUE_SIZE: c_int = 10;
pub const GLX_DEPTH_SIZE: c_int = 12;
pub const GLX_CONTEXT_MAJOR_VERSION: c_int = 0x2091;
pub const GLX_CONTEXT_MINOR_VERSION: c_int = 0x2092;
pub const GLX_CONTEXT_PROFILE_MASK: c_int = 0x9126;
pub const GLX_CONTEXT_CORE_PROFILE_BIT: c_int = 0x0001;

pub mod fn_types {
    #![allow(non_camel_case_types)]

    use std::os::raw::{c_char, c_int, c_uchar, c_uint, c_ulong, c_void};
    use x11_dl::xlib as x;
    use super::{GLXContext, GLXDrawable, GLXFBConfig};

    pub type glXChooseFBConfig = unsafe extern "C" fn(*mut x::Display, c_int, *const c_int, *mut c_int) -> *mut GLXFBConfig;
    pub type glXChooseVisual = unsafe extern "C" fn(*mut x::Display, c_int, *mut c_int) -> *mut x::XVisualInfo;
    pub type glXGetCurrentDisplay = unsafe extern "C" fn() -> *mut x::Display;
    pub type glXGetCurrentContext = unsafe extern "C" fn() -> GLXContext;
    pub type glXGetCurrentDrawable = unsafe extern "C" fn() -> GLXDrawable;
    pub type glXMakeCurrent = unsafe extern "C" fn(*mut x::Display, GLXDrawable, GLXContext) -> c_int;
    pub type glXDestroyContext = unsafe extern "C" fn(*mut x::Display, GLXContext);
    pub type glXCreateContext = unsafe extern "C" fn(*mut x::Display, *mut x::XVisualInfo, GLXContext, c_int) -> GLXContext;
    pub type glXGetProcAddress = unsafe extern "C" fn(*const c_uchar) -> Option<unsafe extern "C" fn()>;
    pub type glXCreateContextAttribsARB = unsafe extern "C" fn(*mut x::Display, GLXFBConfig, GLXContext, c_int, *const c_int) -> GLXContext;

    pub type XOpenDisplay = unsafe extern "C" fn(*const c_char) -> *mut x::Display;
    pub type XDefaultScreen = unsafe extern "C" fn(*mut x::Display) -> c_int;
    pub type XRootWindow = unsafe extern "C" fn(*mut x::Display, c_int) -> x::Window;
    pub type XCreateColormap = unsafe extern "C" fn(*mut x::Display, x::Window, *mut x::Visual, c_int) -> x::Colormap;
    pub type XCreateWindow = unsafe extern "C" fn(
        *mut x::Display, x::Window, c_int, c_int, c_uint, c_uint, c_uint,
        c_int, c_uint, *mut x::Visual, c_ulong, *mut x::XSetWindowAttributes,
    ) -> x::Window;
    pub type XDestroyWindow = unsafe extern "C" fn(*mut x::Display, x::Window) -> c_int;
    pub type XCloseDisplay = unsafe extern "C" fn(*mut x::Display) -> c_int;
    pub type XFree = unsafe extern "C" fn(*mut c_void) -> c_int;
    pub type XErrorHandler = Option<unsafe extern "C" fn(*mut x::Display, *mut x::XErrorEvent) -> c_int>;
    pub type XSetErrorHandler = unsafe extern "C" fn(XErrorHandler) -> XErrorHandler;
}

fn_table! {
    /// The GLX entry points this backend cannot run without.
    pub struct GlxFns {
        glXChooseFBConfig: fn_types::glXChooseFBConfig,
        glXChooseVisual: fn_types::glXChooseVisual,
        glXGetCurrentDisplay: fn_types::glXGetCurrentDisplay,
        glXGetCurrentContext: fn_types::glXGetCurrentContext,
        glXGetCurrentDrawable: fn_types::glXGetCurrentDrawable,
        glXMakeCurrent: fn_types::glXMakeCurrent,
        glXDestroyContext: fn_types::glXDestroyContext,
        glXCreateContext: fn_types::glXCreateContext,
        glXGetProcAddress: fn_types::glXGetProcAddress,
    }
}

fn_table! {
    /// The Xlib entry points needed by the modes that create native
    /// resources (share and standalone). Detect mode never touches Xlib.
    pub struct XlibFns {
        XOpenDisplay: fn_types::XOpenDisplay,
        XDefaultScreen: fn_types::XDefaultScreen,
        XRootWindow: fn_types::XRootWindow,
        XCreateColormap: fn_types::XCreateColormap,
        XCreateWindow: fn_types::XCreateWindow,
        XDestroyWindow: fn_types::XDestroyWindow,
        XCloseDisplay: fn_types::XCloseDisplay,
        XFree: fn_types::XFree,
        XSetErrorHandler: fn_types::XSetErrorHandler,
    }
}
