//! Hub Common - services over the data store, blob storage and session.
//!
//! Each service is a set of async functions generic over the `DataStore`,
//! `AuthProvider` and `BlobStore` seams. `MemoryStore`, `StaticAuth` and
//! `DirBlobStore` implement them locally.

pub mod achievements;
pub mod blob;
pub mod config;
pub mod dashboard;
pub mod kpi;
pub mod memory;
pub mod requests;
pub mod resources;
pub mod rewards;
pub mod store;
pub mod surveys;
pub mod view;

pub use blob::DirBlobStore;
pub use config::{HubConfig, WeekSource};
pub use kpi::{WeekOrigin, WeekResolution};
pub use memory::{MemoryStore, StaticAuth};
pub use store::{AuthProvider, BlobStore, DataStore, Filter, Query, SessionUser};
pub use view::{Notice, ViewState};
