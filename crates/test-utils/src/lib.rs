pub mod builders;
pub mod fake_invoker;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

pub use builders::{ProjectFixture, TaskBuilder};
pub use fake_invoker::{FakeInvoker, IdPrompts, RecordingSummarizer, Step};

/// Upper bound for one scheduler run in a test; fake agents finish in
/// milliseconds, so hitting this means the loop hung.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Route scheduler logs into the per-test capture buffer.
///
/// Defaults to `agentloop=debug` so a failing test shows every poll cycle
/// and state change; `RUST_LOG` overrides it.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,agentloop=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await a scheduler run, failing the test if it exceeds [`RUN_TIMEOUT`].
pub async fn with_timeout<F, T>(run: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(RUN_TIMEOUT, run).await {
        Ok(out) => out,
        Err(_) => panic!("scheduler run did not finish within {RUN_TIMEOUT:?}"),
    }
}
