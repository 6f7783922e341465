//! The native symbol loader: opens dynamic libraries and resolves entry
//! points, papering over the OS loader conventions.
//!
//! Opened libraries are intentionally never closed: drivers cache process
//! lifetime state behind their handles, and the underlying loaders refcount
//! them anyway. Only contexts are ever destroyed.

use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;

use error::{Error, Result};

/// An opened native dynamic library.
///
/// Resolution failure is not an error at this level: `sym()` returns a null
/// pointer and the caller decides whether the symbol was required.
#[derive(Debug)]
pub struct Library {
    name: String,
    #[cfg(unix)]
    handle: *mut c_void,
    #[cfg(windows)]
    handle: ::winapi::shared::minwindef::HMODULE,
}

impl Library {
    /// The name this library was opened under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(unix)]
impl Library {
    /// Opens `name` through `dlopen()`, with the platform default search
    /// path rules.
    pub fn open(name: &str) -> Result<Library> {
        let c_name = match CString::new(name) {
            Ok(c) => c,
            Err(_) => return Err(Error::library_not_found(name.to_owned(), Some("library name contains a NUL byte".to_owned()))),
        };
        unsafe {
            let handle = ::libc::dlopen(c_name.as_ptr(), ::libc::RTLD_LAZY);
            if handle.is_null() {
                let detail = dlerror_string();
                return Err(Error::library_not_found(name.to_owned(), detail));
            }
            trace!("Opened native library `{}`", name);
            Ok(Library { name: name.to_owned(), handle })
        }
    }
    /// Resolves `symbol`, returning a null pointer if it is not exported.
    pub fn sym(&self, symbol: &str) -> *mut c_void {
        let c_symbol = match CString::new(symbol) {
            Ok(c) => c,
            Err(_) => return ptr::null_mut(),
        };
        unsafe { ::libc::dlsym(self.handle, c_symbol.as_ptr()) }
    }
}

#[cfg(unix)]
unsafe fn dlerror_string() -> Option<String> {
    let msg = ::libc::dlerror();
    if msg.is_null() {
        None
    } else {
        Some(::std::ffi::CStr::from_ptr(msg).to_string_lossy().into_owned())
    }
}

#[cfg(windows)]
impl Library {
    /// Opens `name` through `LoadLibraryExA()`.
    ///
    /// Default directories are searched first; when `name` contains a
    /// directory separator it is treated as a path hint and the containing
    /// directory is searched as well.
    pub fn open(name: &str) -> Result<Library> {
        use winapi::um::errhandlingapi::GetLastError;
        use winapi::um::libloaderapi::{
            LoadLibraryExA, LOAD_LIBRARY_SEARCH_DEFAULT_DIRS, LOAD_LIBRARY_SEARCH_DLL_LOAD_DIR,
        };

        let c_name = match CString::new(name) {
            Ok(c) => c,
            Err(_) => return Err(Error::library_not_found(name.to_owned(), Some("library name contains a NUL byte".to_owned()))),
        };
        let mut flags = LOAD_LIBRARY_SEARCH_DEFAULT_DIRS;
        if name.contains('/') || name.contains('\\') {
            flags |= LOAD_LIBRARY_SEARCH_DLL_LOAD_DIR;
        }
        unsafe {
            let handle = LoadLibraryExA(c_name.as_ptr(), ptr::null_mut(), flags);
            if handle.is_null() {
                let code = GetLastError();
                return Err(Error::library_not_found(name.to_owned(), None).with_code(code as i64));
            }
            trace!("Opened native library `{}`", name);
            Ok(Library { name: name.to_owned(), handle })
        }
    }
    /// Resolves `symbol`, returning a null pointer if it is not exported.
    pub fn sym(&self, symbol: &str) -> *mut c_void {
        use winapi::um::libloaderapi::GetProcAddress;

        let c_symbol = match CString::new(symbol) {
            Ok(c) => c,
            Err(_) => return ptr::null_mut(),
        };
        unsafe { GetProcAddress(self.handle, c_symbol.as_ptr()) as *mut c_void }
    }
}

/// Generates a per-backend table of required native entry points.
///
/// `load()` resolves every field from the given library in declaration
/// order and aborts with `MissingEntryPoint` on the first absent one.
/// Field names double as symbol names.
macro_rules! fn_table {
    (
        $(#[$attr:meta])*
        pub struct $Table:ident {
            $($name:ident: $ty:ty,)+
        }
    ) => {
        $(#[$attr])*
        #[allow(non_snake_case, missing_docs)]
        #[derive(Copy, Clone)]
        pub struct $Table {
            $(pub $name: $ty,)+
        }

        impl $Table {
            #[allow(missing_docs)]
            pub fn load(lib: &$crate::loader::Library) -> $crate::error::Result<$Table> {
                unsafe {
                    Ok($Table {
                        $($name: {
                            let ptr = lib.sym(stringify!($name));
                            if ptr.is_null() {
                                return Err($crate::error::Error::missing_entry_point(stringify!($name)));
                            }
                            ::std::mem::transmute(ptr)
                        },)+
                    })
                }
            }
        }

        // Not derived: some of these are `extern "system"`, and we only care
        // about the addresses anyway.
        impl ::std::fmt::Debug for $Table {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                f.debug_struct(stringify!($Table))
                    $(.field(stringify!($name), &(self.$name as usize as *const ::std::os::raw::c_void)))+
                    .finish()
            }
        }
    };
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    // libm is as close to an always-present native library as it gets on a
    // GNU/Linux test host.
    const LIBM: &'static str = "libm.so.6";

    #[test]
    fn open_and_resolve() {
        let lib = Library::open(LIBM).unwrap();
        assert_eq!(lib.name(), LIBM);
        assert!(!lib.sym("cos").is_null());
    }

    #[test]
    fn missing_symbol_is_null_not_an_error() {
        let lib = Library::open(LIBM).unwrap();
        assert!(lib.sym("no_such_symbol_xyz").is_null());
        assert!(lib.sym("bad\0name").is_null());
    }

    #[test]
    fn missing_library_is_an_error() {
        let err = Library::open("libglcx_does_not_exist_xyz.so").unwrap_err();
        assert_eq!(err.kind, ::error::ErrorKind::LibraryNotFound);
    }

    fn_table! {
        pub struct LibmFns {
            cos: unsafe extern "C" fn(f64) -> f64,
            sin: unsafe extern "C" fn(f64) -> f64,
        }
    }

    fn_table! {
        pub struct BogusFns {
            cos: unsafe extern "C" fn(f64) -> f64,
            glcx_bogus_entry_point: unsafe extern "C" fn(),
        }
    }

    #[test]
    fn table_resolves_and_calls() {
        let lib = Library::open(LIBM).unwrap();
        let fns = LibmFns::load(&lib).unwrap();
        let one = unsafe { (fns.cos)(0.0) };
        assert_eq!(one, 1.0);
        let zero = unsafe { (fns.sin)(0.0) };
        assert_eq!(zero, 0.0);
    }

    #[test]
    fn table_reports_the_missing_entry_point_by_name() {
        let lib = Library::open(LIBM).unwrap();
        let err = BogusFns::load(&lib).unwrap_err();
        assert_eq!(err.kind, ::error::ErrorKind::MissingEntryPoint);
        assert_eq!(err.call.as_ref().map(|c| &c[..]), Some("glcx_bogus_entry_point"));
    }
}
