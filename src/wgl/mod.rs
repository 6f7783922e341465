//! The Windows/WGL backend.
//!
//! All three creation modes are supported. Standalone mode renders into a
//! zero-sized hidden window, because WGL has no offscreen surface concept:
//! a device context needs a window, and a pixel format needs a device
//! context. Reaching `wglCreateContextAttribsARB` additionally requires a
//! bootstrap legacy context to be current first, which is created, used
//! for the one resolution call, and thrown away.

use std::ffi::CString;
use std::mem;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use std::sync::Once;

use winapi::shared::minwindef::HINSTANCE;
use winapi::shared::windef::{HDC, HGLRC, HWND};
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::libloaderapi::GetModuleHandleA;
use winapi::um::wingdi::{
    ChoosePixelFormat, SetPixelFormat, PIXELFORMATDESCRIPTOR,
    PFD_DOUBLEBUFFER, PFD_DRAW_TO_WINDOW, PFD_GENERIC_ACCELERATED, PFD_SUPPORT_OPENGL,
};
use winapi::um::winuser::{
    CreateWindowExA, DefWindowProcA, DestroyWindow, GetDC, RegisterClassExA, ReleaseDC,
    WNDCLASSEXA, CS_OWNDC,
};

use context::{ContextSettings, Mode, Ownership};
use current::SaveSlot;
use error::{Error, Result};
use loader::Library;
use version;

pub mod fns;
use self::fns::*;

/// Default name for the OpenGL library.
pub const DEFAULT_LIBGL: &'static str = "opengl32.dll";

const WINDOW_CLASS_NAME: &'static [u8] = b"glcx-hidden-window\0";
static REGISTER_WINDOW_CLASS: Once = Once::new();

fn register_window_class() -> HINSTANCE {
    let hinstance = unsafe { GetModuleHandleA(ptr::null()) };
    REGISTER_WINDOW_CLASS.call_once(|| unsafe {
        let wnd_class = WNDCLASSEXA {
            cbSize: mem::size_of::<WNDCLASSEXA>() as _,
            style: CS_OWNDC,
            lpfnWndProc: Some(DefWindowProcA),
            hInstance: hinstance,
            lpszClassName: WINDOW_CLASS_NAME.as_ptr() as *const c_char,
            .. mem::zeroed()
        };
        if RegisterClassExA(&wnd_class) == 0 {
            warn!("RegisterClassExA failed (native code {:#x})", GetLastError());
        }
    });
    hinstance
}

/// Attribute list for `wglCreateContextAttribsARB`, requesting a core
/// profile, at the given version when one was asked for. Key/value pairs,
/// zero-terminated.
pub(crate) fn context_attribs(glversion: i32) -> Vec<c_int> {
    let mut attribs = vec![
        WGL_CONTEXT_PROFILE_MASK, WGL_CONTEXT_CORE_PROFILE_BIT,
    ];
    if glversion != 0 {
        let (major, minor) = version::split(glversion);
        attribs.push(WGL_CONTEXT_MAJOR_VERSION);
        attribs.push(major);
        attribs.push(WGL_CONTEXT_MINOR_VERSION);
        attribs.push(minor);
    }
    attribs.push(0);
    attribs.push(0);
    attribs
}

/// A Windows WGL context.
pub struct WglContext {
    libgl: Library,
    wgl: WglFns,
    hwnd: HWND,
    hdc: HDC,
    hrc: HGLRC,
    ownership: Ownership,
    saved: SaveSlot<(HDC, HGLRC)>,
    released: bool,
}

impl WglContext {
    /// Creates a WGL context per `settings`. The default mode is `Detect`.
    pub fn create(settings: &ContextSettings) -> Result<WglContext> {
        let mode = settings.mode.unwrap_or(Mode::Detect);
        let libgl_name = settings.libgl.as_ref().map(|s| &s[..]).unwrap_or(DEFAULT_LIBGL);
        let libgl = Library::open(libgl_name)?;
        let wgl = WglFns::load(&libgl)?;

        match mode {
            Mode::Detect => Self::attach(libgl, wgl),
            Mode::Share => Self::share(libgl, wgl, settings),
            Mode::Standalone => Self::standalone(libgl, wgl, settings),
        }
    }

    fn attach(libgl: Library, wgl: WglFns) -> Result<WglContext> {
        unsafe {
            let hrc = (wgl.wglGetCurrentContext)();
            if hrc.is_null() {
                return Err(Error::no_current_context("wglGetCurrentContext"));
            }
            let hdc = (wgl.wglGetCurrentDC)();
            if hdc.is_null() {
                return Err(Error::no_current_context("wglGetCurrentDC"));
            }
            trace!("Attached to the current WGL context {:?}", hrc);
            Ok(WglContext {
                libgl, wgl,
                hwnd: ptr::null_mut(), hdc, hrc,
                ownership: Ownership::Nothing,
                saved: SaveSlot::new(),
                released: false,
            })
        }
    }

    fn share(libgl: Library, wgl: WglFns, settings: &ContextSettings) -> Result<WglContext> {
        unsafe {
            let hrc_share = (wgl.wglGetCurrentContext)();
            if hrc_share.is_null() {
                return Err(Error::no_current_context("wglGetCurrentContext"));
            }
            // The share source's DC; borrowed, never released.
            let hdc = (wgl.wglGetCurrentDC)();
            if hdc.is_null() {
                return Err(Error::no_current_context("wglGetCurrentDC"));
            }

            let create_attribs = Self::resolve_create_context_attribs(&wgl)?;

            // The attributed create call wants no context current.
            (wgl.wglMakeCurrent)(ptr::null_mut(), ptr::null_mut());

            let attribs = context_attribs(settings.glversion);
            let hrc = create_attribs(hdc, hrc_share, attribs.as_ptr());
            if hrc.is_null() {
                return Err(Error::context_creation_failed("wglCreateContextAttribsARB").with_code(GetLastError() as i64));
            }

            let mut cx = WglContext {
                libgl, wgl,
                hwnd: ptr::null_mut(), hdc, hrc,
                ownership: Ownership::ContextOnly,
                saved: SaveSlot::new(),
                released: false,
            };
            if (cx.wgl.wglMakeCurrent)(hdc, hrc) == 0 {
                let code = GetLastError();
                let _ = cx.release();
                return Err(Error::make_current_failed("wglMakeCurrent").with_code(code as i64));
            }
            Ok(cx)
        }
    }

    fn standalone(libgl: Library, wgl: WglFns, settings: &ContextSettings) -> Result<WglContext> {
        unsafe {
            let hinstance = register_window_class();

            let hwnd = CreateWindowExA(
                0,
                WINDOW_CLASS_NAME.as_ptr() as *const c_char,
                ptr::null(), // No title
                0,
                0, 0, 0, 0,
                ptr::null_mut(), // No parent
                ptr::null_mut(), // No menu
                hinstance,
                ptr::null_mut(), // No custom data pointer
            );
            if hwnd.is_null() {
                return Err(Error::context_creation_failed("CreateWindowExA").with_code(GetLastError() as i64));
            }

            let hdc = GetDC(hwnd);
            if hdc.is_null() {
                DestroyWindow(hwnd);
                return Err(Error::context_creation_failed("GetDC").with_code(GetLastError() as i64));
            }

            let pfd = PIXELFORMATDESCRIPTOR {
                nSize: mem::size_of::<PIXELFORMATDESCRIPTOR>() as _,
                nVersion: 1,
                dwFlags: PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL | PFD_GENERIC_ACCELERATED | PFD_DOUBLEBUFFER,
                cColorBits: 24,
                .. mem::zeroed()
            };
            let pixel_format = ChoosePixelFormat(hdc, &pfd);
            if pixel_format == 0 {
                let code = GetLastError();
                ReleaseDC(hwnd, hdc);
                DestroyWindow(hwnd);
                return Err(Error::no_matching_configuration("ChoosePixelFormat").with_code(code as i64));
            }
            if SetPixelFormat(hdc, pixel_format, &pfd) == 0 {
                let code = GetLastError();
                ReleaseDC(hwnd, hdc);
                DestroyWindow(hwnd);
                return Err(Error::context_creation_failed("SetPixelFormat").with_code(code as i64));
            }

            // Bootstrap context dance: wglGetProcAddress only answers with
            // a context current, and only the attributed creation path can
            // request a version and profile.
            let hrc_bootstrap = (wgl.wglCreateContext)(hdc);
            if hrc_bootstrap.is_null() {
                let code = GetLastError();
                ReleaseDC(hwnd, hdc);
                DestroyWindow(hwnd);
                return Err(Error::context_creation_failed("wglCreateContext").with_code(code as i64));
            }
            if (wgl.wglMakeCurrent)(hdc, hrc_bootstrap) == 0 {
                let code = GetLastError();
                (wgl.wglDeleteContext)(hrc_bootstrap);
                ReleaseDC(hwnd, hdc);
                DestroyWindow(hwnd);
                return Err(Error::make_current_failed("wglMakeCurrent").with_code(code as i64));
            }

            let create_attribs = match Self::resolve_create_context_attribs(&wgl) {
                Ok(f) => f,
                Err(e) => {
                    (wgl.wglMakeCurrent)(ptr::null_mut(), ptr::null_mut());
                    (wgl.wglDeleteContext)(hrc_bootstrap);
                    ReleaseDC(hwnd, hdc);
                    DestroyWindow(hwnd);
                    return Err(e);
                },
            };

            (wgl.wglMakeCurrent)(ptr::null_mut(), ptr::null_mut());
            if (wgl.wglDeleteContext)(hrc_bootstrap) == 0 {
                let code = GetLastError();
                ReleaseDC(hwnd, hdc);
                DestroyWindow(hwnd);
                return Err(Error::native_call_failed("wglDeleteContext").with_code(code as i64));
            }

            let attribs = context_attribs(settings.glversion);
            let hrc = create_attribs(hdc, ptr::null_mut(), attribs.as_ptr());
            if hrc.is_null() {
                let code = GetLastError();
                ReleaseDC(hwnd, hdc);
                DestroyWindow(hwnd);
                return Err(Error::context_creation_failed("wglCreateContextAttribsARB").with_code(code as i64));
            }

            let mut cx = WglContext {
                libgl, wgl,
                hwnd, hdc, hrc,
                ownership: Ownership::ContextAndSurface,
                saved: SaveSlot::new(),
                released: false,
            };
            if (cx.wgl.wglMakeCurrent)(hdc, hrc) == 0 {
                let code = GetLastError();
                let _ = cx.release();
                return Err(Error::make_current_failed("wglMakeCurrent").with_code(code as i64));
            }
            Ok(cx)
        }
    }

    unsafe fn resolve_create_context_attribs(wgl: &WglFns) -> Result<fn_types::wglCreateContextAttribsARB> {
        let proc_addr = (wgl.wglGetProcAddress)(b"wglCreateContextAttribsARB\0".as_ptr() as *const c_char);
        if proc_addr.is_null() {
            return Err(Error::missing_entry_point("wglCreateContextAttribsARB"));
        }
        Ok(mem::transmute(proc_addr))
    }

    /// Resolves a GL entry point: the plain library symbol table first,
    /// `wglGetProcAddress` second. Null when unresolved or released.
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
        unsafe { (self.wgl.wglGetProcAddress)(c_symbol.as_ptr()) as *const c_void }
    }

    /// Saves the current (DC, context) pair, then makes this context
    /// current on its own DC.
    pub fn enter(&mut self) -> Result<()> {
        if self.released {
            return Err(Error::context_released("enter"));
        }
        unsafe {
            let previous = ((self.wgl.wglGetCurrentDC)(), (self.wgl.wglGetCurrentContext)());
            self.saved.save(previous);
            if (self.wgl.wglMakeCurrent)(self.hdc, self.hrc) == 0 {
                let code = GetLastError();
                let _ = self.saved.take();
                return Err(Error::make_current_failed("wglMakeCurrent").with_code(code as i64));
            }
        }
        Ok(())
    }

    /// Restores the pair captured by the most recent `enter()`.
    pub fn exit(&mut self) -> Result<()> {
        if self.released {
            return Err(Error::context_released("exit"));
        }
        let (hdc, hrc) = match self.saved.take() {
            Some(pair) => pair,
            None => return Ok(()),
        };
        unsafe {
            // A null saved context means nothing was current before;
            // restore that by unbinding.
            let ok = if hrc.is_null() {
                (self.wgl.wglMakeCurrent)(ptr::null_mut(), ptr::null_mut())
            } else {
                (self.wgl.wglMakeCurrent)(hdc, hrc)
            };
            if ok == 0 {
                return Err(Error::make_current_failed("wglMakeCurrent").with_code(GetLastError() as i64));
            }
        }
        Ok(())
    }

    /// Tears down the owned resources: context first, then DC and hidden
    /// window. A detect-mode context owns nothing and tears down nothing.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let mut failed: Vec<&'static str> = Vec::new();
        unsafe {
            if self.ownership.owns_context() {
                if (self.wgl.wglMakeCurrent)(ptr::null_mut(), ptr::null_mut()) == 0 {
                    failed.push("wglMakeCurrent");
                }
                if (self.wgl.wglDeleteContext)(self.hrc) == 0 {
                    failed.push("wglDeleteContext");
                }
            }
            if self.ownership.owns_surface() {
                ReleaseDC(self.hwnd, self.hdc);
                if DestroyWindow(self.hwnd) == 0 {
                    failed.push("DestroyWindow");
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
    fn context_attribs_are_pairs_terminated_by_zero() {
        assert_eq!(context_attribs(330), [
            WGL_CONTEXT_PROFILE_MASK, WGL_CONTEXT_CORE_PROFILE_BIT,
            WGL_CONTEXT_MAJOR_VERSION, 3,
            WGL_CONTEXT_MINOR_VERSION, 3,
            0, 0,
        ]);
        assert_eq!(context_attribs(460)[3], 4);
        assert_eq!(context_attribs(460)[5], 6);
    }

    #[test]
    fn unversioned_context_attribs_only_request_the_core_profile() {
        assert_eq!(context_attribs(0), [
            WGL_CONTEXT_PROFILE_MASK, WGL_CONTEXT_CORE_PROFILE_BIT,
            0, 0,
        ]);
    }
}
