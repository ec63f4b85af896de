//! Fixed-delay background refresh.
//!
//! One named thread per dictionary. The next cycle is scheduled only after
//! the previous one returns, so cycles never overlap. A panicking cycle is
//! logged and the schedule carries on.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::dictionary::Dictionary;

const THREAD_NAME: &str = "ikdict-reload";

pub(crate) fn spawn(
    dict: Weak<Dictionary>,
    initial_delay: Duration,
    period: Duration,
) -> std::io::Result<JoinHandle<()>> {
    tracing::info!(
        initial_delay_secs = initial_delay.as_secs_f64(),
        period_secs = period.as_secs_f64(),
        "scheduling dictionary reload"
    );
    thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || run(dict, initial_delay, period))
}

fn run(dict: Weak<Dictionary>, initial_delay: Duration, period: Duration) {
    thread::sleep(initial_delay);
    let mut cycle: u64 = 0;
    loop {
        let Some(strong) = dict.upgrade() else {
            tracing::debug!("dictionary dropped, reload thread exiting");
            return;
        };
        cycle += 1;
        match panic::catch_unwind(AssertUnwindSafe(|| strong.reload())) {
            Ok(report) => {
                for err in &report.errors {
                    tracing::warn!(
                        cycle,
                        source = err.source_id().unwrap_or("-"),
                        error = %err,
                        "dictionary reload problem"
                    );
                }
            }
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(cycle, panic = %msg, "dictionary reload cycle failed");
            }
        }
        drop(strong);
        thread::sleep(period);
    }
}
