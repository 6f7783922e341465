//! Driver-dependent scenarios.
//!
//! These need a live OpenGL driver (and, for the GLX default backend, a
//! reachable X server), which CI boxes usually lack, so they are ignored
//! by default. Run them on a workstation with:
//!
//! ```text
//! cargo test -- --ignored
//! ```

extern crate env_logger;
extern crate glcx;

use glcx::{Context, ContextSettings, Mode};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn standalone_settings() -> ContextSettings {
    ContextSettings {
        mode: Some(Mode::Standalone),
        glversion: 330,
        .. Default::default()
    }
}

#[test]
#[ignore]
fn standalone_create_enter_load_release() {
    init_logging();
    let mut ctx = Context::create(&standalone_settings()).unwrap();
    assert!(ctx.owns_its_context());

    ctx.enter().unwrap();
    // An entry point every GL implementation exports.
    assert!(!ctx.load("glGetError").is_null());
    assert!(!ctx.load("glEnable").is_null());
    // And one that none does.
    assert!(ctx.load("no_such_symbol_xyz").is_null());
    ctx.exit().unwrap();

    ctx.release().unwrap();
    // Releasing twice is a no-op.
    ctx.release().unwrap();
    assert!(ctx.load("glGetError").is_null());
}

#[test]
#[ignore]
fn detect_without_a_current_context_fails() {
    init_logging();
    let err = Context::create(&ContextSettings {
        mode: Some(Mode::Detect),
        .. Default::default()
    }).unwrap_err();
    assert_eq!(err.kind, glcx::ErrorKind::NoCurrentContext);
}

#[test]
#[ignore]
fn mass_create_release() {
    init_logging();
    for _ in 0..100 {
        let mut ctx = Context::create(&standalone_settings()).unwrap();
        ctx.enter().unwrap();
        assert!(!ctx.load("glGetError").is_null());
        ctx.exit().unwrap();
        ctx.release().unwrap();
    }
}
