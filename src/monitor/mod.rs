pub mod block_scheduler;
pub mod startup;

pub use block_scheduler::{spawn_fetch_loop, BlockScheduler, FetchEvent, Pacing, TickOutcome};
pub use startup::{load_initial_state, InitialState};
