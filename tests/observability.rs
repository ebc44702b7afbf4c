//! Runs in its own test binary: installing the process-global tracing
//! subscriber here would otherwise collide with `#[traced_test]` unit tests.

use kube_testenv::observability::{init_tracing, init_tracing_with};
use kube_testenv::types::ObservabilityConfig;

#[test]
fn init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    init_tracing_with(&ObservabilityConfig::default());
}
