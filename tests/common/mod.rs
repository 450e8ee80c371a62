// Shared setup for integration tests.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a tracing subscriber once per test binary.
///
/// Output is controlled by `RUST_LOG`; tests are silent by default.
#[allow(dead_code)]
pub fn init_logging() {
    // ---
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
