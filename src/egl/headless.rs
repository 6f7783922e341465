//! The process-global implicit context.
//!
//! Some callers only ever want one context per process and no handle to
//! thread through their code. This module is that singleton service: one
//! implicit, surfaceless EGL context created on a selected GPU device,
//! queried through free functions. It is deliberately separate from the
//! handle-based [`EglContext`](../struct.EglContext.html); neither knows
//! about the other's state.
//!
//! There is no teardown: the global context lives for the rest of the
//! process, like the driver state backing it.

use std::os::raw::c_void;
use std::ptr;
use std::sync::Mutex;

use error::{Error, Result};
use loader::Library;

use super::fns::*;
use super::{choose_config, devices_from, load_with, query_devices_raw, Device, DEFAULT_LIBEGL, DEFAULT_LIBGL};

struct HeadlessState {
    libgl: Library,
    #[allow(dead_code)] // Held open for the process lifetime.
    libegl: Library,
    egl: EglFns,
    #[allow(dead_code)]
    dpy: EGLDisplay,
    #[allow(dead_code)]
    ctx: EGLContext,
}

// The raw handles make this !Send. The global context is still thread-affine
// exactly like an explicit one: callers must drive it from the single thread
// they dedicated to it. The mutex only guards initialization.
unsafe impl Send for HeadlessState {}

static STATE: Mutex<Option<HeadlessState>> = Mutex::new(None);

/// Enumerates the GPU devices exposed by the EGL driver.
///
/// Re-querying re-enumerates; indices are only stable within one process.
pub fn devices() -> Result<Vec<Device>> {
    let libegl = Library::open(DEFAULT_LIBEGL)?;
    let egl = EglFns::load(&libegl)?;
    let ext = EglExt::resolve(&egl);
    unsafe { devices_from(&egl, &ext) }
}

/// Establishes the process-wide implicit context on the device at
/// `device_index`.
///
/// Idempotent: once a global context exists, further calls are no-ops and
/// the originally selected device stays in effect.
pub fn init(device_index: usize) -> Result<()> {
    let mut state = STATE.lock().unwrap();
    if state.is_some() {
        trace!("Global headless context already initialized");
        return Ok(());
    }

    let libgl = Library::open(DEFAULT_LIBGL)?;
    let libegl = Library::open(DEFAULT_LIBEGL)?;
    let egl = EglFns::load(&libegl)?;
    let ext = EglExt::resolve(&egl);

    unsafe {
        let dpy = match ext.eglGetPlatformDisplayEXT {
            Some(get_platform_display) => {
                let raw_devices = query_devices_raw(&ext)?;
                if device_index >= raw_devices.len() {
                    return Err(Error::device_index_out_of_range(device_index, raw_devices.len()));
                }
                let dpy = get_platform_display(EGL_PLATFORM_DEVICE_EXT, raw_devices[device_index], ptr::null());
                if dpy.is_null() {
                    let code = (egl.eglGetError)();
                    return Err(Error::context_creation_failed("eglGetPlatformDisplayEXT").with_code(code as i64));
                }
                dpy
            },
            // No device extension: only the default display exists, and
            // only index 0 can mean it.
            None => {
                if device_index != 0 {
                    return Err(Error::missing_entry_point("eglQueryDevicesEXT"));
                }
                let dpy = (egl.eglGetDisplay)(EGL_DEFAULT_DISPLAY);
                if dpy.is_null() {
                    let code = (egl.eglGetError)();
                    return Err(Error::context_creation_failed("eglGetDisplay").with_code(code as i64));
                }
                dpy
            },
        };

        if (egl.eglInitialize)(dpy, ptr::null_mut(), ptr::null_mut()) == 0 {
            let code = (egl.eglGetError)();
            return Err(Error::context_creation_failed("eglInitialize").with_code(code as i64));
        }

        let cfg = choose_config(&egl, dpy)?;

        if (egl.eglBindAPI)(EGL_OPENGL_API) == 0 {
            let code = (egl.eglGetError)();
            return Err(Error::context_creation_failed("eglBindAPI").with_code(code as i64));
        }

        // The implicit context does not negotiate a version, only the
        // profile; the driver hands out the newest core context it has.
        let attribs = [
            EGL_CONTEXT_OPENGL_PROFILE_MASK, EGL_CONTEXT_OPENGL_CORE_PROFILE_BIT,
            EGL_NONE,
        ];
        let ctx = (egl.eglCreateContext)(dpy, cfg, EGL_NO_CONTEXT, attribs.as_ptr());
        if ctx.is_null() {
            let code = (egl.eglGetError)();
            return Err(Error::context_creation_failed("eglCreateContext").with_code(code as i64));
        }

        if (egl.eglMakeCurrent)(dpy, EGL_NO_SURFACE, EGL_NO_SURFACE, ctx) == 0 {
            let code = (egl.eglGetError)();
            (egl.eglDestroyContext)(dpy, ctx);
            return Err(Error::make_current_failed("eglMakeCurrent").with_code(code as i64));
        }

        info!("Established the global headless context on device {}", device_index);
        *state = Some(HeadlessState { libgl, libegl, egl, dpy, ctx });
    }
    Ok(())
}

/// Resolves a GL entry point through the global context: plain symbol
/// table first, `eglGetProcAddress` second.
///
/// Returns a null pointer when the symbol is unresolved or when `init` has
/// not succeeded yet.
pub fn load(symbol: &str) -> *const c_void {
    match *STATE.lock().unwrap() {
        Some(ref state) => load_with(&state.libgl, &state.egl, symbol),
        None => ptr::null(),
    }
}
