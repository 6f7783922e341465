//! Internal module for unpacking the compact `glversion` integer.
//!
//! Versions travel as a single integer, e.g `330` for 3.3 and `410` for
//! 4.1. `0` means "no version request" and selects the legacy unversioned
//! creation entry point.

use std::os::raw::c_int;

pub fn split(glversion: i32) -> (c_int, c_int) {
    (glversion / 100 % 10, glversion / 10 % 10)
}

#[cfg(test)]
mod tests {
    use super::split;

    #[test]
    fn common_versions() {
        assert_eq!(split(330), (3, 3));
        assert_eq!(split(410), (4, 1));
        assert_eq!(split(460), (4, 6));
        assert_eq!(split(210), (2, 1));
    }

    #[test]
    fn zero_means_no_request() {
        assert_eq!(split(0), (0, 0));
    }
}
