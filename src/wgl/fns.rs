//! WGL entry-point tables and tokens, resolved at runtime from
//! `opengl32.dll` (or whichever ICD the caller names).

#![allow(missing_docs)]

use std::os::raw::c_int;

// The context-attribute tokens of WGL_ARB_create_context; winapi carries
// no WGL extension headers.
pub const WGL_CONTEXT_PROFILE_MASK: c_int = 0x9126;
pub const WGL_CONTEXT_CORE_PROFILE_BIT: c_int = 0x0001;
pub const WGL_CONTEXT_MAJOR_VERSION: c_int = 0x2091;
pub const WGL_CONTEXT_MINOR_VERSION: c_int = 0x2092;

pub mod fn_types {
    #![allow(non_camel_case_types)]

    use std::os::raw::{c_char, c_int, c_void};
    use winapi::shared::minwindef::BOOL;
    use winapi::shared::windef::{HDC, HGLRC};

    pub type wglGetCurrentContext = unsafe extern "system" fn() -> HGLRC;
    pub type wglGetCurrentDC = unsafe extern "system" fn() -> HDC;
    pub type wglCreateContext = unsafe extern "system" fn(HDC) -> HGLRC;
    pub type wglDeleteContext = unsafe extern "system" fn(HGLRC) -> BOOL;
    pub type wglGetProcAddress = unsafe extern "system" fn(*const c_char) -> *mut c_void;
    pub type wglMakeCurrent = unsafe extern "system" fn(HDC, HGLRC) -> BOOL;
    pub type wglCreateContextAttribsARB = unsafe extern "system" fn(HDC, HGLRC, *const c_int) -> HGLRC;
}

fn_table! {
    /// The WGL entry points this backend cannot run without.
    pub struct WglFns {
        wglGetCurrentContext: fn_types::wglGetCurrentContext,
        wglGetCurrentDC: fn_types::wglGetCurrentDC,
        wglCreateContext: fn_types::wglCreateContext,
        wglDeleteContext: fn_types::wglDeleteContext,
        wglGetProcAddress: fn_types::wglGetProcAddress,
        wglMakeCurrent: fn_types::wglMakeCurrent,
    }
}
