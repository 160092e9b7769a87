//! Shared fixtures for integration tests

use cretoai_policy::{Policy, PolicyRule, Subject};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Route engine logs to the test harness; filter with `RUST_LOG`
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with_test_writer()
            .try_init();
    });
}

/// Editors may edit posts; archived posts are frozen for everyone
#[allow(dead_code)]
pub fn blog_policy() -> Policy {
    Policy::new(vec![
        PolicyRule::allow("role:editor", "post:*", "edit").with_priority(90),
        PolicyRule::deny("*", "post:archived:*", "edit").with_priority(80),
    ])
}

#[allow(dead_code)]
pub fn editor(id: &str) -> Subject {
    Subject::new(id).with_roles(["editor"])
}
