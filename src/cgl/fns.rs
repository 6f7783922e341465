//! CGL types, tokens and entry-point table, resolved at runtime from the
//! OpenGL framework.

#![allow(missing_docs, non_upper_case_globals)]

use std::os::raw::{c_int, c_void};

/// Opaque `_CGLContextObject` pointer.
pub type CGLContextObj = *mut c_void;
/// Opaque pixel format object pointer.
pub type CGLPixelFormatObj = *mut c_void;
/// CGL attribute token; attribute lists are zero-terminated.
pub type CGLPixelFormatAttribute = c_int;
/// CGL call result; zero is success.
pub type CGLError = c_int;
pub type GLint = c_int;

pub const kCGLNoError: CGLError = 0;
pub const kCGLPFAOpenGLProfile: CGLPixelFormatAttribute = 99;
pub const kCGLOGLPVersion_GL3_Core: c_int = 0x3200;
pub const kCGLOGLPVersion_GL4_Core: c_int = 0x4100;

pub mod fn_types {
    #![allow(non_camel_case_types)]

    use super::*;

    pub type CGLGetCurrentContext = unsafe extern "C" fn() -> CGLContextObj;
    pub type CGLSetCurrentContext = unsafe extern "C" fn(CGLContextObj) -> CGLError;
    pub type CGLChoosePixelFormat = unsafe extern "C" fn(*const CGLPixelFormatAttribute, *mut CGLPixelFormatObj, *mut GLint) -> CGLError;
    pub type CGLDestroyPixelFormat = unsafe extern "C" fn(CGLPixelFormatObj) -> CGLError;
    pub type CGLCreateContext = unsafe extern "C" fn(CGLPixelFormatObj, CGLContextObj, *mut CGLContextObj) -> CGLError;
    pub type CGLDestroyContext = unsafe extern "C" fn(CGLContextObj) -> CGLError;
}

fn_table! {
    /// The CGL entry points this backend cannot run without.
    pub struct CglFns {
        CGLGetCurrentContext: fn_types::CGLGetCurrentContext,
        CGLSetCurrentContext: fn_types::CGLSetCurrentContext,
        CGLChoosePixelFormat: fn_types::CGLChoosePixelFormat,
        CGLDestroyPixelFormat: fn_types::CGLDestroyPixelFormat,
        CGLCreateContext: fn_types::CGLCreateContext,
        CGLDestroyContext: fn_types::CGLDestroyContext,
    }
}
