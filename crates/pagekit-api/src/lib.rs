// pagekit-api: request-template merging and the HTTP transport boundary
// for pagekit page behaviors.

pub mod download;
pub mod error;
pub mod http;
pub mod request;
pub mod transport;

pub use download::{DiscardSaver, FileSaver};
pub use error::Error;
pub use http::{HttpTransport, TransportConfig};
pub use request::{EffectiveRequest, RequestOverlay, ResponseKind, merge};
pub use transport::{EntityReply, ListingReply, Reply, ReplyBody, Transport};
