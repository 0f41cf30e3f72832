#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Local configuration store for the MGZON CLI.
//!
//! The CLI keeps a single flat JSON record at `<home>/.mgzon/config.json`
//! holding the last-known credentials, the resolved user profile, and a
//! handful of preferences. There is no versioning and no locking: the last
//! writer wins.
//!
//! Layout: `model.rs` (the typed record and key-based access used by
//! `mz config`), `store.rs` (path resolution, load/save/replace), `error.rs`.

pub mod error;
pub mod model;
pub mod store;

pub use error::{ConfigError, ConfigResult};
pub use model::{CliConfig, DEFAULT_API_URL, SETTABLE_KEYS, redact_secret};
pub use store::ConfigStore;
