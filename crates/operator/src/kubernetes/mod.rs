mod client;
mod resources;

pub use client::{KubeStore, PingerStore};
#[cfg(test)]
pub use client::MockPingerStore;
pub use resources::{build_cronjob, cronjob_changed, WorkerSettings};
