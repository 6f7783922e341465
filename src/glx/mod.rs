//! The X11/GLX backend.
//!
//! Drives `libGL.so` and `libX11.so` entirely through runtime-resolved
//! entry points. All three creation modes are supported; standalone mode
//! renders into an invisible 1x1 `InputOutput` window since GLX has no
//! native offscreen surface concept this backend relies on.

use std::ffi::CString;
use std::mem;
use std::os::raw::{c_char, c_int, c_uint, c_void};
use std::ptr;

use x11_dl::xlib as x;

use context::{ContextSettings, Mode, Ownership};
use current::SaveSlot;
use error::{Error, Result};
use loader::Library;
use negotiate::{self, Candidate};
use version;

pub mod fns;
use self::fns::*;

/// Default name for the GLX-capable OpenGL library.
pub const DEFAULT_LIBGL: &'static str = "libGL.so";
/// Default name for the Xlib library.
pub const DEFAULT_LIBX11: &'static str = "libX11.so";

static DOUBLE_BUFFERED_VISUAL_ATTRIBS: [c_int; 11] = [
    GLX_RGBA,
    GLX_DOUBLEBUFFER,
    GLX_RED_SIZE, 8,
    GLX_GREEN_SIZE, 8,
    GLX_BLUE_SIZE, 8,
    GLX_DEPTH_SIZE, 24,
    0,
];
static BARE_VISUAL_ATTRIBS: [c_int; 2] = [
    GLX_RGBA,
    0,
];

static VISUAL_CANDIDATES: [Candidate<&'static [c_int]>; 2] = [
    Candidate { label: "double-buffered 8-bit RGB, 24-bit depth", attribs: &DOUBLE_BUFFERED_VISUAL_ATTRIBS },
    Candidate { label: "unconstrained RGBA", attribs: &BARE_VISUAL_ATTRIBS },
];

/// Attribute list for `glXCreateContextAttribsARB`, requesting a core
/// profile at the given version. Key/value pairs, zero-terminated.
pub(crate) fn context_attribs(glversion: i32) -> [c_int; 8] {
    let (major, minor) = version::split(glversion);
    [
        GLX_CONTEXT_PROFILE_MASK, GLX_CONTEXT_CORE_PROFILE_BIT,
        GLX_CONTEXT_MAJOR_VERSION, major,
        GLX_CONTEXT_MINOR_VERSION, minor,
        0, 0,
    ]
}

// Context creation is allowed to fail; the error is read back from the
// returned handle instead of crashing the caller through Xlib's default
// handler.
unsafe extern "C" fn silent_x_error_handler(_dpy: *mut x::Display, _event: *mut x::XErrorEvent) -> c_int {
    0
}

/// An X11/GLX context.
#[derive(Debug)]
pub struct GlxContext {
    libgl: Library,
    #[allow(dead_code)] // Held open for the process lifetime.
    libx11: Option<Library>,
    glx: GlxFns,
    xlib: Option<XlibFns>,
    dpy: *mut x::Display,
    fbc: *mut GLXFBConfig,
    vi: *mut x::XVisualInfo,
    wnd: GLXDrawable,
    ctx: GLXContext,
    ownership: Ownership,
    saved: SaveSlot<(*mut x::Display, GLXDrawable, GLXContext)>,
    released: bool,
}

impl GlxContext {
    /// Creates a GLX context per `settings`. The default mode is `Detect`.
    pub fn create(settings: &ContextSettings) -> Result<GlxContext> {
        let mode = settings.mode.unwrap_or(Mode::Detect);
        let libgl_name = settings.libgl.as_ref().map(|s| &s[..]).unwrap_or(DEFAULT_LIBGL);
        let libgl = Library::open(libgl_name)?;
        let glx = GlxFns::load(&libgl)?;

        match mode {
            Mode::Detect => Self::attach(libgl, glx),
            Mode::Share | Mode::Standalone => {
                let libx11_name = settings.libx11.as_ref().map(|s| &s[..]).unwrap_or(DEFAULT_LIBX11);
                let libx11 = Library::open(libx11_name)?;
                let xlib = XlibFns::load(&libx11)?;
                if mode == Mode::Share {
                    Self::share(libgl, glx, libx11, xlib, settings)
                } else {
                    Self::standalone(libgl, glx, libx11, xlib, settings)
                }
            },
        }
    }

    fn attach(libgl: Library, glx: GlxFns) -> Result<GlxContext> {
        unsafe {
            let ctx = (glx.glXGetCurrentContext)();
            if ctx.is_null() {
                return Err(Error::no_current_context("glXGetCurrentContext"));
            }
            let wnd = (glx.glXGetCurrentDrawable)();
            if wnd == 0 {
                return Err(Error::no_current_context("glXGetCurrentDrawable"));
            }
            let dpy = (glx.glXGetCurrentDisplay)();
            if dpy.is_null() {
                return Err(Error::no_current_context("glXGetCurrentDisplay"));
            }
            trace!("Attached to the current GLX context {:?}", ctx);
            Ok(GlxContext {
                libgl, libx11: None, glx, xlib: None,
                dpy, fbc: ptr::null_mut(), vi: ptr::null_mut(), wnd, ctx,
                ownership: Ownership::Nothing,
                saved: SaveSlot::new(),
                released: false,
            })
        }
    }

    fn share(libgl: Library, glx: GlxFns, libx11: Library, xlib: XlibFns, settings: &ContextSettings) -> Result<GlxContext> {
        unsafe {
            let share_ctx = (glx.glXGetCurrentContext)();
            if share_ctx.is_null() {
                return Err(Error::no_current_context("glXGetCurrentContext"));
            }
            let wnd = (glx.glXGetCurrentDrawable)();
            if wnd == 0 {
                return Err(Error::no_current_context("glXGetCurrentDrawable"));
            }
            // The share source's display connection; borrowed, never closed.
            let dpy = (glx.glXGetCurrentDisplay)();
            if dpy.is_null() {
                return Err(Error::no_current_context("glXGetCurrentDisplay"));
            }

            let (fbc, vi) = Self::choose_config(&glx, &xlib, dpy)?;

            let ctx = match Self::create_glx_context(&glx, &xlib, dpy, fbc, vi, share_ctx, settings.glversion) {
                Ok(ctx) => ctx,
                Err(e) => {
                    (xlib.XFree)(fbc as *mut c_void);
                    (xlib.XFree)(vi as *mut c_void);
                    return Err(e);
                },
            };

            let mut cx = GlxContext {
                libgl, libx11: Some(libx11), glx, xlib: Some(xlib),
                dpy, fbc, vi, wnd, ctx,
                ownership: Ownership::ContextOnly,
                saved: SaveSlot::new(),
                released: false,
            };
            if (cx.glx.glXMakeCurrent)(dpy, wnd, ctx) == 0 {
                let _ = cx.release();
                return Err(Error::make_current_failed("glXMakeCurrent"));
            }
            Ok(cx)
        }
    }

    fn standalone(libgl: Library, glx: GlxFns, libx11: Library, xlib: XlibFns, settings: &ContextSettings) -> Result<GlxContext> {
        unsafe {
            let mut dpy = (xlib.XOpenDisplay)(ptr::null());
            if dpy.is_null() {
                dpy = (xlib.XOpenDisplay)(b":0.0\0".as_ptr() as *const c_char);
            }
            if dpy.is_null() {
                return Err(Error::context_creation_failed("XOpenDisplay"));
            }

            let (fbc, vi) = match Self::choose_config(&glx, &xlib, dpy) {
                Ok(chosen) => chosen,
                Err(e) => {
                    (xlib.XCloseDisplay)(dpy);
                    return Err(e);
                },
            };

            let root = (xlib.XRootWindow)(dpy, (*vi).screen);
            let mut swa: x::XSetWindowAttributes = mem::zeroed();
            swa.colormap = (xlib.XCreateColormap)(dpy, root, (*vi).visual, x::AllocNone);
            swa.border_pixel = 0;
            swa.event_mask = x::StructureNotifyMask;

            let wnd = (xlib.XCreateWindow)(
                dpy, root, 0, 0, 1, 1, 0, (*vi).depth, x::InputOutput as c_uint,
                (*vi).visual, x::CWBorderPixel | x::CWColormap | x::CWEventMask, &mut swa,
            );
            if wnd == 0 {
                (xlib.XFree)(fbc as *mut c_void);
                (xlib.XFree)(vi as *mut c_void);
                (xlib.XCloseDisplay)(dpy);
                return Err(Error::context_creation_failed("XCreateWindow"));
            }

            let ctx = match Self::create_glx_context(&glx, &xlib, dpy, fbc, vi, ptr::null_mut(), settings.glversion) {
                Ok(ctx) => ctx,
                Err(e) => {
                    (xlib.XDestroyWindow)(dpy, wnd);
                    (xlib.XFree)(fbc as *mut c_void);
                    (xlib.XFree)(vi as *mut c_void);
                    (xlib.XCloseDisplay)(dpy);
                    return Err(e);
                },
            };

            let mut cx = GlxContext {
                libgl, libx11: Some(libx11), glx, xlib: Some(xlib),
                dpy, fbc, vi, wnd, ctx,
                ownership: Ownership::ContextAndSurface,
                saved: SaveSlot::new(),
                released: false,
            };
            if (cx.glx.glXMakeCurrent)(dpy, wnd, ctx) == 0 {
                let _ = cx.release();
                return Err(Error::make_current_failed("glXMakeCurrent"));
            }
            Ok(cx)
        }
    }

    unsafe fn choose_config(glx: &GlxFns, xlib: &XlibFns, dpy: *mut x::Display) -> Result<(*mut GLXFBConfig, *mut x::XVisualInfo)> {
        let screen = (xlib.XDefaultScreen)(dpy);

        let mut nelements = 0;
        let fbc = (glx.glXChooseFBConfig)(dpy, screen, ptr::null(), &mut nelements);
        if fbc.is_null() || nelements < 1 {
            return Err(Error::no_matching_configuration("glXChooseFBConfig"));
        }

        let chosen = negotiate::negotiate("glXChooseVisual", &VISUAL_CANDIDATES, |attribs| {
            let vi = (glx.glXChooseVisual)(dpy, screen, attribs.as_ptr() as *mut c_int);
            if vi.is_null() { None } else { Some(vi) }
        });
        match chosen {
            Ok(vi) => Ok((fbc, vi)),
            Err(e) => {
                (xlib.XFree)(fbc as *mut c_void);
                Err(e)
            },
        }
    }

    unsafe fn create_glx_context(
        glx: &GlxFns, xlib: &XlibFns, dpy: *mut x::Display,
        fbc: *mut GLXFBConfig, vi: *mut x::XVisualInfo,
        share_ctx: GLXContext, glversion: i32,
    ) -> Result<GLXContext> {
        // Creation is probed, not trusted: a too-new version makes the X
        // server report an error instead of returning NULL, so errors are
        // swallowed for the duration of the call.
        let old_handler = (xlib.XSetErrorHandler)(Some(silent_x_error_handler));

        let (ctx, call) = if glversion != 0 {
            let gpa = glx.glXGetProcAddress;
            let proc_addr = gpa(b"glXCreateContextAttribsARB\0".as_ptr());
            let create_attribs: fn_types::glXCreateContextAttribsARB = match proc_addr {
                Some(f) => mem::transmute(f),
                None => {
                    (xlib.XSetErrorHandler)(old_handler);
                    return Err(Error::missing_entry_point("glXCreateContextAttribsARB"));
                },
            };
            let attribs = context_attribs(glversion);
            (create_attribs(dpy, *fbc, share_ctx, x::True, attribs.as_ptr()), "glXCreateContextAttribsARB")
        } else {
            ((glx.glXCreateContext)(dpy, vi, share_ctx, x::True), "glXCreateContext")
        };

        (xlib.XSetErrorHandler)(old_handler);

        if ctx.is_null() {
            return Err(Error::context_creation_failed(call));
        }
        trace!("Created GLX context {:?} via {}", ctx, call);
        Ok(ctx)
    }

    /// Resolves a GL entry point: the plain `libGL` symbol table first,
    /// `glXGetProcAddress` second. Null when unresolved or released.
    pub fn load(&self, symbol: &str) -> *const c_void {
        if self.released {
            return ptr::null();
        }
        let direct = self.libgl.sym(symbol);
        if !direct.is_null() {
            return direct as *const c_void;
        }
        let c_symbol = match CString::new(symbol) {
            Ok(c) => c,
            Err(_) => return ptr::null(),
        };
        match unsafe { (self.glx.glXGetProcAddress)(c_symbol.as_ptr() as *const _) } {
            Some(f) => f as *const c_void,
            None => ptr::null(),
        }
    }

    /// Saves the current (display, drawable, context) triple, then makes
    /// this context current on its own drawable.
    pub fn enter(&mut self) -> Result<()> {
        if self.released {
            return Err(Error::context_released("enter"));
        }
        unsafe {
            let previous = (
                (self.glx.glXGetCurrentDisplay)(),
                (self.glx.glXGetCurrentDrawable)(),
                (self.glx.glXGetCurrentContext)(),
            );
            self.saved.save(previous);
            if (self.glx.glXMakeCurrent)(self.dpy, self.wnd, self.ctx) == 0 {
                let _ = self.saved.take();
                return Err(Error::make_current_failed("glXMakeCurrent"));
            }
        }
        Ok(())
    }

    /// Restores the triple captured by the most recent `enter()`.
    pub fn exit(&mut self) -> Result<()> {
        if self.released {
            return Err(Error::context_released("exit"));
        }
        let (dpy, wnd, ctx) = match self.saved.take() {
            Some(triple) => triple,
            None => return Ok(()),
        };
        unsafe {
            // A null saved context means nothing was current before; GLX
            // rejects a null display, so unbind through our own instead.
            let ok = if ctx.is_null() {
                (self.glx.glXMakeCurrent)(self.dpy, 0, ptr::null_mut())
            } else {
                (self.glx.glXMakeCurrent)(dpy, wnd, ctx)
            };
            if ok == 0 {
                return Err(Error::make_current_failed("glXMakeCurrent"));
            }
        }
        Ok(())
    }

    /// Tears down the owned resources: context, then window and display
    /// connection, then the negotiated configuration storage.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let mut failed: Vec<&'static str> = Vec::new();
        unsafe {
            if self.ownership.owns_context() {
                if (self.glx.glXMakeCurrent)(self.dpy, 0, ptr::null_mut()) == 0 {
                    failed.push("glXMakeCurrent");
                }
                (self.glx.glXDestroyContext)(self.dpy, self.ctx);
            }
            if let Some(ref xlib) = self.xlib {
                if self.ownership.owns_surface() {
                    (xlib.XDestroyWindow)(self.dpy, self.wnd);
                    (xlib.XCloseDisplay)(self.dpy);
                }
                if !self.fbc.is_null() {
                    (xlib.XFree)(self.fbc as *mut c_void);
                    self.fbc = ptr::null_mut();
                }
                if !self.vi.is_null() {
                    (xlib.XFree)(self.vi as *mut c_void);
                    self.vi = ptr::null_mut();
                }
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::release_failed(failed))
        }
    }

    /// `true` for standalone and share modes, `false` for detect.
    pub fn owns_its_context(&self) -> bool {
        self.ownership.owns_context()
    }

    /// This context's ownership tag.
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_attribs_are_pairs_terminated_by_none() {
        assert_eq!(context_attribs(330), [
            GLX_CONTEXT_PROFILE_MASK, GLX_CONTEXT_CORE_PROFILE_BIT,
            GLX_CONTEXT_MAJOR_VERSION, 3,
            GLX_CONTEXT_MINOR_VERSION, 3,
            0, 0,
        ]);
        assert_eq!(context_attribs(410)[3], 4);
        assert_eq!(context_attribs(410)[5], 1);
    }

    #[test]
    fn visual_fallback_chain_degrades_in_order() {
        assert_eq!(VISUAL_CANDIDATES.len(), 2);
        let primary = VISUAL_CANDIDATES[0].attribs;
        let bare = VISUAL_CANDIDATES[1].attribs;
        // Primary asks for double buffering and a depth buffer...
        assert!(primary.contains(&GLX_DOUBLEBUFFER));
        assert!(primary.contains(&GLX_DEPTH_SIZE));
        // ...the fallback constrains nothing but RGBA rendering.
        assert_eq!(bare, &[GLX_RGBA, 0]);
        // Both lists carry the zero sentinel last.
        assert_eq!(primary.last(), Some(&0));
        assert_eq!(bare.last(), Some(&0));
    }
}
