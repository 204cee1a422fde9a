// Library exports for integration tests and reusable components

pub mod catalog;
pub mod models;
pub mod playback;

// Test support (only available with test-utils feature)
#[cfg(feature = "test-utils")]
pub mod test_support;
