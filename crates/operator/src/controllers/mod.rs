pub mod pinger;

pub use pinger::{pod_to_pinger, WebPingerController};
