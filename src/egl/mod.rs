//! The EGL backend.
//!
//! Windowing-system independent: contexts are created surfaceless (no
//! pbuffer is ever bound) and can therefore run headlessly, including on
//! display-less multi-GPU compute hosts through the device-enumeration
//! extensions. Only `Standalone` mode exists here; there is no notion of
//! attaching to a foreign current context that would be portable across
//! EGL platforms.

use std::ffi::{CStr, CString};
use std::os::raw::c_void;
use std::ptr;

use context::{ContextSettings, Mode, Ownership};
use current::SaveSlot;
use error::{Error, Result};
use loader::Library;
use negotiate::{self, Candidate};
use version;

pub mod fns;
pub mod headless;
use self::fns::*;

/// Default name for the OpenGL library.
pub const DEFAULT_LIBGL: &'static str = "libGL.so";
/// Default name for the EGL library.
pub const DEFAULT_LIBEGL: &'static str = "libEGL.so";

static PBUFFER_RGB_DEPTH_ATTRIBS: [EGLint; 13] = [
    EGL_SURFACE_TYPE, EGL_PBUFFER_BIT,
    EGL_BLUE_SIZE, 8,
    EGL_GREEN_SIZE, 8,
    EGL_RED_SIZE, 8,
    EGL_DEPTH_SIZE, 8,
    EGL_RENDERABLE_TYPE, EGL_OPENGL_BIT,
    EGL_NONE,
];
static PBUFFER_BARE_ATTRIBS: [EGLint; 5] = [
    EGL_SURFACE_TYPE, EGL_PBUFFER_BIT,
    EGL_RENDERABLE_TYPE, EGL_OPENGL_BIT,
    EGL_NONE,
];
static UNCONSTRAINED_ATTRIBS: [EGLint; 1] = [
    EGL_NONE,
];

static CONFIG_CANDIDATES: [Candidate<&'static [EGLint]>; 3] = [
    Candidate { label: "pbuffer-capable 8-bit RGB, 8-bit depth", attribs: &PBUFFER_RGB_DEPTH_ATTRIBS },
    Candidate { label: "pbuffer-capable desktop GL", attribs: &PBUFFER_BARE_ATTRIBS },
    Candidate { label: "unconstrained", attribs: &UNCONSTRAINED_ATTRIBS },
];

/// Attribute list for `eglCreateContext`, requesting a core profile at the
/// given version. Key/value pairs, `EGL_NONE`-terminated.
pub(crate) fn context_attribs(glversion: i32) -> Vec<EGLint> {
    let mut attribs = Vec::with_capacity(7);
    if glversion != 0 {
        let (major, minor) = version::split(glversion);
        attribs.push(EGL_CONTEXT_MAJOR_VERSION);
        attribs.push(major);
        attribs.push(EGL_CONTEXT_MINOR_VERSION);
        attribs.push(minor);
    }
    attribs.push(EGL_CONTEXT_OPENGL_PROFILE_MASK);
    attribs.push(EGL_CONTEXT_OPENGL_CORE_PROFILE_BIT);
    attribs.push(EGL_NONE);
    attribs
}

/// A GPU device enumerated by the driver, independent of any display.
///
/// Identity is purely positional: `index` is only meaningful against the
/// enumeration order observed in the same process.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Device {
    /// Position in the enumeration order.
    pub index: usize,
    /// The device's supported extension strings.
    pub extensions: Vec<String>,
}

/// Selects a device by index, failing with `DeviceIndexOutOfRange` when
/// `index` is not below the enumerated count.
pub fn select_device(devices: &[Device], index: usize) -> Result<&Device> {
    match devices.get(index) {
        Some(device) => Ok(device),
        None => Err(Error::device_index_out_of_range(index, devices.len())),
    }
}

/// Enumerates the GPU devices exposed by the EGL driver.
///
/// The sequence is finite and not restartable: calling this again
/// re-enumerates. Requires the `eglQueryDevicesEXT` extension.
pub fn enumerate_devices(settings: &ContextSettings) -> Result<Vec<Device>> {
    let libegl_name = settings.libegl.as_ref().map(|s| &s[..]).unwrap_or(DEFAULT_LIBEGL);
    let libegl = Library::open(libegl_name)?;
    let egl = EglFns::load(&libegl)?;
    let ext = EglExt::resolve(&egl);
    unsafe { devices_from(&egl, &ext) }
}

pub(crate) unsafe fn query_devices_raw(ext: &EglExt) -> Result<Vec<EGLDeviceEXT>> {
    let query = match ext.eglQueryDevicesEXT {
        Some(f) => f,
        None => return Err(Error::missing_entry_point("eglQueryDevicesEXT")),
    };
    let mut count: EGLint = 0;
    if query(0, ptr::null_mut(), &mut count) == 0 {
        return Err(Error::native_call_failed("eglQueryDevicesEXT"));
    }
    if count <= 0 {
        return Ok(Vec::new());
    }
    let mut devices: Vec<EGLDeviceEXT> = vec![ptr::null_mut(); count as usize];
    if query(count, devices.as_mut_ptr(), &mut count) == 0 {
        return Err(Error::native_call_failed("eglQueryDevicesEXT"));
    }
    devices.truncate(count as usize);
    trace!("Enumerated {} EGL device(s)", devices.len());
    Ok(devices)
}

pub(crate) unsafe fn devices_from(_egl: &EglFns, ext: &EglExt) -> Result<Vec<Device>> {
    let raw = query_devices_raw(ext)?;
    let mut devices = Vec::with_capacity(raw.len());
    for (index, &device) in raw.iter().enumerate() {
        let extensions = match ext.eglQueryDeviceStringEXT {
            Some(query_string) => {
                let s = query_string(device, EGL_EXTENSIONS);
                if s.is_null() {
                    Vec::new()
                } else {
                    CStr::from_ptr(s)
                        .to_string_lossy()
                        .split_whitespace()
                        .map(str::to_owned)
                        .collect()
                }
            },
            None => Vec::new(),
        };
        devices.push(Device { index, extensions });
    }
    Ok(devices)
}

/// An EGL context.
#[derive(Debug)]
pub struct EglContext {
    libgl: Library,
    #[allow(dead_code)] // Held open for the process lifetime.
    libegl: Library,
    egl: EglFns,
    ext: EglExt,
    dpy: EGLDisplay,
    #[allow(dead_code)]
    cfg: EGLConfig,
    ctx: EGLContext,
    ownership: Ownership,
    saved: SaveSlot<(EGLDisplay, EGLSurface, EGLSurface, EGLContext)>,
    released: bool,
}

impl EglContext {
    /// Creates an EGL context per `settings`. The only supported mode is
    /// `Standalone` (also the default).
    pub fn create(settings: &ContextSettings) -> Result<EglContext> {
        let mode = settings.mode.unwrap_or(Mode::Standalone);
        if mode != Mode::Standalone {
            return Err(Error::unknown_mode(mode, "EGL"));
        }

        let libgl_name = settings.libgl.as_ref().map(|s| &s[..]).unwrap_or(DEFAULT_LIBGL);
        let libgl = Library::open(libgl_name)?;
        let libegl_name = settings.libegl.as_ref().map(|s| &s[..]).unwrap_or(DEFAULT_LIBEGL);
        let libegl = Library::open(libegl_name)?;
        let egl = EglFns::load(&libegl)?;
        let ext = EglExt::resolve(&egl);

        unsafe {
            let dpy = Self::display_for_device(&egl, &ext, settings.device_index)?;

            let (mut major, mut minor) = (0, 0);
            if (egl.eglInitialize)(dpy, &mut major, &mut minor) == 0 {
                let code = (egl.eglGetError)();
                return Err(Error::context_creation_failed("eglInitialize").with_code(code as i64));
            }
            trace!("Initialized EGL {}.{}", major, minor);

            let cfg = choose_config(&egl, dpy)?;

            if (egl.eglBindAPI)(EGL_OPENGL_API) == 0 {
                let code = (egl.eglGetError)();
                return Err(Error::context_creation_failed("eglBindAPI").with_code(code as i64));
            }

            let attribs = context_attribs(settings.glversion);
            let ctx = (egl.eglCreateContext)(dpy, cfg, EGL_NO_CONTEXT, attribs.as_ptr());
            if ctx.is_null() {
                let code = (egl.eglGetError)();
                return Err(Error::context_creation_failed("eglCreateContext").with_code(code as i64));
            }

            let mut cx = EglContext {
                libgl, libegl, egl, ext,
                dpy, cfg, ctx,
                ownership: Ownership::ContextOnly,
                saved: SaveSlot::new(),
                released: false,
            };
            if (cx.egl.eglMakeCurrent)(dpy, EGL_NO_SURFACE, EGL_NO_SURFACE, ctx) == 0 {
                let code = (cx.egl.eglGetError)();
                let _ = cx.release();
                return Err(Error::make_current_failed("eglMakeCurrent").with_code(code as i64));
            }
            Ok(cx)
        }
    }

    unsafe fn display_for_device(egl: &EglFns, ext: &EglExt, device_index: usize) -> Result<EGLDisplay> {
        if device_index == 0 {
            let dpy = (egl.eglGetDisplay)(EGL_DEFAULT_DISPLAY);
            if dpy.is_null() {
                let code = (egl.eglGetError)();
                return Err(Error::context_creation_failed("eglGetDisplay").with_code(code as i64));
            }
            return Ok(dpy);
        }

        // A specific device was requested: enumerate and bounds-check
        // before any creation call.
        let devices = query_devices_raw(ext)?;
        if device_index >= devices.len() {
            return Err(Error::device_index_out_of_range(device_index, devices.len()));
        }
        let get_platform_display = match ext.eglGetPlatformDisplayEXT {
            Some(f) => f,
            None => return Err(Error::missing_entry_point("eglGetPlatformDisplayEXT")),
        };
        let dpy = get_platform_display(EGL_PLATFORM_DEVICE_EXT, devices[device_index], ptr::null());
        if dpy.is_null() {
            let code = (egl.eglGetError)();
            return Err(Error::context_creation_failed("eglGetPlatformDisplayEXT").with_code(code as i64));
        }
        Ok(dpy)
    }

    /// Enumerates GPU devices through this context's already-resolved
    /// entry points.
    pub fn devices(&self) -> Result<Vec<Device>> {
        unsafe { devices_from(&self.egl, &self.ext) }
    }

    /// Resolves a GL entry point: the plain `libGL` symbol table first,
    /// `eglGetProcAddress` second. Null when unresolved or released.
    pub fn load(&self, symbol: &str) -> *const c_void {
        if self.released {
            return ptr::null();
        }
        load_with(&self.libgl, &self.egl, symbol)
    }

    /// Saves the current (display, draw, read, context) state, then makes
    /// this context current, surfaceless.
    pub fn enter(&mut self) -> Result<()> {
        if self.released {
            return Err(Error::context_released("enter"));
        }
        unsafe {
            let previous = (
                (self.egl.eglGetCurrentDisplay)(),
                (self.egl.eglGetCurrentSurface)(EGL_DRAW),
                (self.egl.eglGetCurrentSurface)(EGL_READ),
                (self.egl.eglGetCurrentContext)(),
            );
            self.saved.save(previous);
            if (self.egl.eglMakeCurrent)(self.dpy, EGL_NO_SURFACE, EGL_NO_SURFACE, self.ctx) == 0 {
                let code = (self.egl.eglGetError)();
                let _ = self.saved.take();
                return Err(Error::make_current_failed("eglMakeCurrent").with_code(code as i64));
            }
        }
        Ok(())
    }

    /// Restores the state captured by the most recent `enter()`.
    pub fn exit(&mut self) -> Result<()> {
        if self.released {
            return Err(Error::context_released("exit"));
        }
        let (dpy, draw, read, ctx) = match self.saved.take() {
            Some(state) => state,
            None => return Ok(()),
        };
        unsafe {
            // EGL rejects a make-current on EGL_NO_DISPLAY; when nothing
            // was current before, unbind through our own display.
            let ok = if ctx.is_null() {
                (self.egl.eglMakeCurrent)(self.dpy, EGL_NO_SURFACE, EGL_NO_SURFACE, EGL_NO_CONTEXT)
            } else {
                (self.egl.eglMakeCurrent)(dpy, draw, read, ctx)
            };
            if ok == 0 {
                let code = (self.egl.eglGetError)();
                return Err(Error::make_current_failed("eglMakeCurrent").with_code(code as i64));
            }
        }
        Ok(())
    }

    /// Destroys the owned context. The display connection is driver-cached
    /// process state and is left initialized.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let mut failed: Vec<&'static str> = Vec::new();
        unsafe {
            if self.ownership.owns_context() {
                if (self.egl.eglMakeCurrent)(self.dpy, EGL_NO_SURFACE, EGL_NO_SURFACE, EGL_NO_CONTEXT) == 0 {
                    failed.push("eglMakeCurrent");
                }
                if (self.egl.eglDestroyContext)(self.dpy, self.ctx) == 0 {
                    failed.push("eglDestroyContext");
                }
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::release_failed(failed))
        }
    }

    /// `true` for standalone mode, which is the only mode here.
    pub fn owns_its_context(&self) -> bool {
        self.ownership.owns_context()
    }

    /// This context's ownership tag.
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }
}

pub(crate) unsafe fn choose_config(egl: &EglFns, dpy: EGLDisplay) -> Result<EGLConfig> {
    negotiate::negotiate("eglChooseConfig", &CONFIG_CANDIDATES, |attribs| {
        let mut cfg: EGLConfig = ptr::null_mut();
        let mut num_configs: EGLint = 0;
        let ok = (egl.eglChooseConfig)(dpy, attribs.as_ptr(), &mut cfg, 1, &mut num_configs);
        if ok == 0 || num_configs < 1 || cfg.is_null() {
            None
        } else {
            Some(cfg)
        }
    })
}

pub(crate) fn load_with(libgl: &Library, egl: &EglFns, symbol: &str) -> *const c_void {
    let direct = libgl.sym(symbol);
    if !direct.is_null() {
        return direct as *const c_void;
    }
    let c_symbol = match CString::new(symbol) {
        Ok(c) => c,
        Err(_) => return ptr::null(),
    };
    match unsafe { (egl.eglGetProcAddress)(c_symbol.as_ptr()) } {
        Some(f) => f as *const c_void,
        None => ptr::null(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::ErrorKind;

    #[test]
    fn versioned_context_attribs_end_with_none() {
        let attribs = context_attribs(330);
        assert_eq!(attribs, [
            EGL_CONTEXT_MAJOR_VERSION, 3,
            EGL_CONTEXT_MINOR_VERSION, 3,
            EGL_CONTEXT_OPENGL_PROFILE_MASK, EGL_CONTEXT_OPENGL_CORE_PROFILE_BIT,
            EGL_NONE,
        ]);
    }

    #[test]
    fn legacy_context_attribs_only_request_the_core_profile() {
        let attribs = context_attribs(0);
        assert_eq!(attribs, [
            EGL_CONTEXT_OPENGL_PROFILE_MASK, EGL_CONTEXT_OPENGL_CORE_PROFILE_BIT,
            EGL_NONE,
        ]);
    }

    #[test]
    fn config_fallback_chain_degrades_in_order() {
        assert_eq!(CONFIG_CANDIDATES.len(), 3);
        let first = CONFIG_CANDIDATES[0].attribs;
        let second = CONFIG_CANDIDATES[1].attribs;
        let last = CONFIG_CANDIDATES[2].attribs;
        assert!(first.contains(&EGL_DEPTH_SIZE));
        assert!(!second.contains(&EGL_DEPTH_SIZE));
        assert!(second.contains(&EGL_RENDERABLE_TYPE));
        assert_eq!(last, &[EGL_NONE]);
        for candidate in &CONFIG_CANDIDATES {
            assert_eq!(candidate.attribs.last(), Some(&EGL_NONE));
        }
    }

    #[test]
    fn device_selection_is_positional_and_bounds_checked() {
        let devices = vec![
            Device { index: 0, extensions: vec!["EGL_EXT_device_drm".to_owned()] },
            Device { index: 1, extensions: Vec::new() },
        ];
        assert_eq!(select_device(&devices, 1).unwrap().index, 1);
        let err = select_device(&devices, 2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DeviceIndexOutOfRange);
        let err = select_device(&[], 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DeviceIndexOutOfRange);
    }
}
