//! Property-based test suite entry point.
//!
//! Run with:
//!
//! ```bash
//! cargo test -p clinic-core --test property
//! ```
//!
//! To increase the number of generated cases:
//!
//! ```bash
//! PROPTEST_CASES=512 cargo test -p clinic-core --test property
//! ```

mod codec;
mod engine;
