pub use countdown::{ConsoleCountdown, Countdown};
pub use scheduler::BatchScheduler;

pub mod countdown;
pub mod scheduler;
