use rand::Rng;
use std::thread;
use std::time::Duration;

/// Sleep for `ms` milliseconds with +/-30% random jitter.
pub fn sleep_jitter(ms: u64) {
    if ms == 0 {
        return;
    }
    let base = ms as f64;
    let jitter = base * 0.3;
    let actual = base + rand::thread_rng().gen_range(-jitter..jitter);
    thread::sleep(Duration::from_secs_f64(actual.max(1.0) / 1000.0));
}

/// Sleep for exact milliseconds (no jitter).
pub fn sleep_ms(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}
