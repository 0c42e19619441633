pub mod pinger;

pub use pinger::{
    Condition, ConditionType, PingReason, WebPinger, WebPingerSpec, WebPingerStatus, FINALIZER,
};
