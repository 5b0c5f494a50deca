//! # blogsync-fetch
//!
//! WordPress entity fetcher for build-time sync.
//!
//! [`Fetcher`] pulls posts over a [`Transport`] with timeouts and retry, and
//! degrades to an injected [`FallbackDataset`] so a build always has content.

pub mod error;
pub mod fallback;
pub mod fetcher;
pub mod normalize;
pub mod retry;
pub mod transport;
mod wire;

pub use error::{FailureCause, FetchError, TransportError};
pub use fallback::FallbackDataset;
pub use fetcher::{select_category, FetchedPosts, Fetcher, SlugLookup, MAX_PAGE_SIZE};
pub use retry::RetryPolicy;
pub use transport::{Request, Response, Transport, UreqTransport};
