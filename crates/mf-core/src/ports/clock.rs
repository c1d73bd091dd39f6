/// Wall clock in Unix milliseconds. All persisted timestamps use this scale.
pub trait ClockPort: Send + Sync {
    fn now_ms(&self) -> i64;
}
