//! The macOS/CGL backend.
//!
//! CGL contexts are intrinsically offscreen-capable, so standalone mode
//! needs no hidden window, no drawable and no display connection: the
//! pixel format fallback chain picks a profile, the context is created,
//! done. Detect mode attaches to whatever context is current. There is no
//! share mode, and `glversion` only steers where the profile fallback
//! chain starts.

use std::os::raw::c_void;
use std::ptr;

use context::{ContextSettings, Mode, Ownership};
use current::SaveSlot;
use error::{Error, Result};
use loader::Library;
use negotiate::{self, Candidate};
use version;

pub mod fns;
use self::fns::*;

/// Default path of the OpenGL framework dylib.
pub const DEFAULT_LIBGL: &'static str = "/System/Library/Frameworks/OpenGL.framework/OpenGL";

static GL4_CORE_ATTRIBS: [CGLPixelFormatAttribute; 3] = [
    kCGLPFAOpenGLProfile, kCGLOGLPVersion_GL4_Core,
    0,
];
static GL3_CORE_ATTRIBS: [CGLPixelFormatAttribute; 3] = [
    kCGLPFAOpenGLProfile, kCGLOGLPVersion_GL3_Core,
    0,
];
static LEGACY_ATTRIBS: [CGLPixelFormatAttribute; 1] = [
    0,
];

static PIXEL_FORMAT_CANDIDATES: [Candidate<&'static [CGLPixelFormatAttribute]>; 3] = [
    Candidate { label: "GL4 core profile", attribs: &GL4_CORE_ATTRIBS },
    Candidate { label: "GL3 core profile", attribs: &GL3_CORE_ATTRIBS },
    Candidate { label: "unconstrained", attribs: &LEGACY_ATTRIBS },
];

/// The profile fallback chain for a requested version: a 4.x request
/// starts at the GL4 core token, anything lower skips straight to GL3
/// core so the driver cannot hand out a newer context than asked for.
pub(crate) fn pixel_format_candidates(glversion: i32) -> &'static [Candidate<&'static [CGLPixelFormatAttribute]>] {
    let (major, _minor) = version::split(glversion);
    if major >= 4 {
        &PIXEL_FORMAT_CANDIDATES[..]
    } else {
        &PIXEL_FORMAT_CANDIDATES[1..]
    }
}

/// A macOS CGL context.
pub struct CglContext {
    libgl: Library,
    cgl: CglFns,
    ctx: CGLContextObj,
    ownership: Ownership,
    saved: SaveSlot<CGLContextObj>,
    released: bool,
}

impl CglContext {
    /// Creates a CGL context per `settings`. The default mode is `Detect`.
    pub fn create(settings: &ContextSettings) -> Result<CglContext> {
        let mode = settings.mode.unwrap_or(Mode::Detect);
        let libgl_name = settings.libgl.as_ref().map(|s| &s[..]).unwrap_or(DEFAULT_LIBGL);
        let libgl = Library::open(libgl_name)?;
        let cgl = CglFns::load(&libgl)?;

        match mode {
            Mode::Detect => Self::attach(libgl, cgl),
            Mode::Standalone => Self::standalone(libgl, cgl, settings),
            Mode::Share => Err(Error::unknown_mode(mode, "CGL")),
        }
    }

    fn attach(libgl: Library, cgl: CglFns) -> Result<CglContext> {
        unsafe {
            let ctx = (cgl.CGLGetCurrentContext)();
            if ctx.is_null() {
                return Err(Error::no_current_context("CGLGetCurrentContext"));
            }
            trace!("Attached to the current CGL context {:?}", ctx);
            Ok(CglContext {
                libgl, cgl, ctx,
                ownership: Ownership::Nothing,
                saved: SaveSlot::new(),
                released: false,
            })
        }
    }

    fn standalone(libgl: Library, cgl: CglFns, settings: &ContextSettings) -> Result<CglContext> {
        unsafe {
            let candidates = pixel_format_candidates(settings.glversion);
            let pixel_format = negotiate::negotiate("CGLChoosePixelFormat", candidates, |attribs| {
                let mut pixel_format: CGLPixelFormatObj = ptr::null_mut();
                let mut num_pixel_formats: GLint = 0;
                (cgl.CGLChoosePixelFormat)(attribs.as_ptr(), &mut pixel_format, &mut num_pixel_formats);
                if pixel_format.is_null() { None } else { Some(pixel_format) }
            })?;

            let mut ctx: CGLContextObj = ptr::null_mut();
            let code = (cgl.CGLCreateContext)(pixel_format, ptr::null_mut(), &mut ctx);
            (cgl.CGLDestroyPixelFormat)(pixel_format);
            if ctx.is_null() {
                return Err(Error::context_creation_failed("CGLCreateContext").with_code(code as i64));
            }

            let mut cx = CglContext {
                libgl, cgl, ctx,
                ownership: Ownership::ContextOnly,
                saved: SaveSlot::new(),
                released: false,
            };
            let code = (cx.cgl.CGLSetCurrentContext)(ctx);
            if code != kCGLNoError {
                let _ = cx.release();
                return Err(Error::make_current_failed("CGLSetCurrentContext").with_code(code as i64));
            }
            Ok(cx)
        }
    }

    /// Resolves a GL entry point from the framework's symbol table. CGL
    /// has no proc-address indirection, so `dlsym` alone decides. Null
    /// when unresolved or released.
    pub fn load(&self, symbol: &str) -> *const c_void {
        if self.released {
            return ptr::null();
        }
        self.libgl.sym(symbol) as *const c_void
    }

    /// Saves the current context, then makes this one current.
    pub fn enter(&mut self) -> Result<()> {
        if self.released {
            return Err(Error::context_released("enter"));
        }
        unsafe {
            let previous = (self.cgl.CGLGetCurrentContext)();
            self.saved.save(previous);
            let code = (self.cgl.CGLSetCurrentContext)(self.ctx);
            if code != kCGLNoError {
                let _ = self.saved.take();
                return Err(Error::make_current_failed("CGLSetCurrentContext").with_code(code as i64));
            }
        }
        Ok(())
    }

    /// Restores the context captured by the most recent `enter()`. A null
    /// saved context restores the "nothing current" state.
    pub fn exit(&mut self) -> Result<()> {
        if self.released {
            return Err(Error::context_released("exit"));
        }
        let previous = match self.saved.take() {
            Some(ctx) => ctx,
            None => return Ok(()),
        };
        unsafe {
            let code = (self.cgl.CGLSetCurrentContext)(previous);
            if code != kCGLNoError {
                return Err(Error::make_current_failed("CGLSetCurrentContext").with_code(code as i64));
            }
        }
        Ok(())
    }

    /// Destroys the owned context. A detect-mode context owns nothing and
    /// tears down nothing.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let mut failed: Vec<&'static str> = Vec::new();
        unsafe {
            if self.ownership.owns_context() {
                if (self.cgl.CGLSetCurrentContext)(ptr::null_mut()) != kCGLNoError {
                    failed.push("CGLSetCurrentContext");
                }
                if (self.cgl.CGLDestroyContext)(self.ctx) != kCGLNoError {
                    failed.push("CGLDestroyContext");
                }
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::release_failed(failed))
        }
    }

    /// `true` for standalone mode, `false` for detect.
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
    fn profile_chain_starts_at_the_requested_major() {
        let for_410 = pixel_format_candidates(410);
        assert_eq!(for_410.len(), 3);
        assert_eq!(for_410[0].attribs[1], kCGLOGLPVersion_GL4_Core);

        let for_330 = pixel_format_candidates(330);
        assert_eq!(for_330.len(), 2);
        assert_eq!(for_330[0].attribs[1], kCGLOGLPVersion_GL3_Core);
    }

    #[test]
    fn profile_chain_always_ends_unconstrained() {
        for &glversion in &[0, 210, 330, 410, 460] {
            let candidates = pixel_format_candidates(glversion);
            assert_eq!(candidates.last().unwrap().attribs, &[0]);
            for candidate in candidates {
                assert_eq!(candidate.attribs.last(), Some(&0));
            }
        }
    }
}
