mod fake_clock;
mod system_clock;

pub use fake_clock::FakeClock;
pub use system_clock::SystemClock;
