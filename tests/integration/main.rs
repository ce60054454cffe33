//! Integration test driver for `tests/integration/`.
//!
//! Each `mod` below maps to a file that exercises one node against mock
//! adapters.  All tests run on the host with no real hardware required.

mod guard_tests;
mod mock_hw;
mod radio_tests;
