mod ask;
mod debug;
mod health;
mod notify;
mod scheduler;
mod stats;

pub use ask::{ask_v1, ask_v2};
pub use debug::debug_vars;
pub use health::{health, index, ready, status};
pub use notify::notify_task;
pub use scheduler::{scheduler_retrain, scheduler_stats};
pub use stats::{model_stats, task_stats};
