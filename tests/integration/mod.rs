//! Integration test suite
//!
//! Each test gets its own temporary repository with a local bare origin, so
//! the full build and release flows run end to end without network access.

mod helpers;
mod test_build;
mod test_bump;
mod test_init;
