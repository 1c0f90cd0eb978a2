use chrono::Local;

/// `{ now() -> (unix_seconds, tz_offset_minutes) }`, used only when
/// constructing new `CommitPerson` records during commit creation.
pub trait Clock {
    fn now(&self) -> (i64, i32);
}

/// The local wall clock, read at commit-construction time.
pub struct FsClock;

impl Clock for FsClock {
    fn now(&self) -> (i64, i32) {
        let now = Local::now();
        let seconds = now.timestamp();
        let offset_minutes = now.offset().local_minus_utc() / 60;
        (seconds, offset_minutes)
    }
}
