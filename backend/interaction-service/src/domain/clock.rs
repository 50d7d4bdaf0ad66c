use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_TIMESTAMP: AtomicI64 = AtomicI64::new(0);

/// Wall-clock milliseconds since the Unix epoch, strictly increasing across
/// calls within this process.
pub fn now_millis() -> i64 {
    let wall = Utc::now().timestamp_millis();
    let mut last = LAST_TIMESTAMP.load(Ordering::Relaxed);
    loop {
        let next = wall.max(last + 1);
        match LAST_TIMESTAMP.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(observed) => last = observed,
        }
    }
}

/// A timestamp strictly after `earlier`
pub fn now_after(earlier: i64) -> i64 {
    now_millis().max(earlier + 1)
}
