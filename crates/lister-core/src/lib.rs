//! Lister Core Library
//!
//! Headless runtime for list picker sessions: fetch remote records, map them to
//! options, search and filter, track a draft selection and resolve on close.

pub mod config;
pub mod definition;
pub mod details;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod filters;
pub mod http;
pub mod inflight;
pub mod logging;
pub mod mapper;
pub mod option;
pub mod path;
pub mod permission;
pub mod preset;
pub mod runtime;
pub mod search;
pub mod session;
pub mod store;

pub use definition::{ListerDefinition, Mapping, Resolver, Source};
pub use details::{Details, OpenResult, Reason};
pub use error::{ListerError, Result};
pub use option::{ListerOption, OptionId};
pub use runtime::{FetchQuery, FetchResult, ListerRuntime, ListerTarget, OpenHandle, OpenOptions};
pub use session::{DraftValue, Mode, SessionId};
