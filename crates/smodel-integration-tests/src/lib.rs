//! Cross-crate integration tests for `smodel-core` and `smodel-schema`.
//! See the `tests/` directory.
