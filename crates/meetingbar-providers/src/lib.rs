//! Calendar sources and the raw-event pipeline.
//!
//! - [`CalendarSource`] - the trait every backend implements
//! - [`RawEvent`] - source-agnostic raw event data
//! - [`normalize_event`] - converts raw events into [`meetingbar_core::Meeting`]s
//! - [`build_source`] - picks the backend from [`SourceSettings`]
//!
//! ```text
//! ┌──────────────────┐    ┌──────────────────┐
//! │ iCalendar feeds  │    │ desktop store    │
//! └────────┬─────────┘    └────────┬─────────┘
//!          ▼                       ▼
//! ┌──────────────────┐    ┌──────────────────┐
//! │ RemoteFeedSource │    │ LocalStoreSource │
//! └────────┬─────────┘    └────────┬─────────┘
//!          └──── CalendarSource ───┘
//!                     │
//!                     ▼
//!               ┌──────────┐
//!               │ RawEvent │
//!               └────┬─────┘
//!                    ▼ normalize_event()
//!               ┌──────────┐
//!               │ Meeting  │
//!               └──────────┘
//! ```

pub mod backend;
pub mod error;
pub mod ics;
pub mod local;
pub mod normalize;
pub mod raw_event;
#[cfg(feature = "remote")]
pub mod remote;
pub mod source;

pub use backend::{
    BackendKind, LOCAL_ACCOUNT_ID, RemoteCalendar, SourceSettings, build_source,
    build_source_or_failing,
};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use local::LocalStoreSource;
pub use normalize::{NormalizedBatch, Rejection, normalize_event, normalize_events, try_normalize};
pub use raw_event::{RawConferenceData, RawEntryPoint, RawEvent, RawEventTime};
#[cfg(feature = "remote")]
pub use remote::RemoteFeedSource;
pub use source::{BoxFuture, CalendarScope, CalendarSource, FailingSource};
