//! Time-limited secure links: a URL is stored encrypted behind an opaque
//! `sv_` token that can later be redeemed, counted and expired.

pub mod auth;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod model;
pub mod routes;
pub mod store;
pub mod token;
pub mod utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use crypto::Codec;
pub use engine::LinkEngine;
pub use error::{LinkError, StoreError};
pub use routes::{create_router, AppState};
pub use store::{FileLinkStore, LinkStore, MemoryLinkStore};
