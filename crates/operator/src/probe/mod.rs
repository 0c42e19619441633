//! Worker probe results: producing them, carrying them on pod metadata and
//! folding them back into WebPinger status.

pub mod aggregate;
pub mod codec;
pub mod ping;

pub use aggregate::{aggregate_status, conditions_from_pods};
pub use codec::{decode_pod, encode_condition};
pub use ping::{build_http_client, ping, ping_url, PodIdentity};
