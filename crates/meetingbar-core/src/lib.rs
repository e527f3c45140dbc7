//! Core types: meetings, conference links, display state, formatting

pub mod display;
pub mod event;
pub mod format;
pub mod links;
pub mod logging;
pub mod time;

pub use display::{Agenda, DisplayState};
pub use event::{CalendarDescriptor, Meeting, MeetingLink, ProviderKind};
pub use format::{DisplayTemplates, ellipsis};
pub use links::{LinkExtractor, extract_links, primary_link, primary_link_in};
pub use logging::{LogConfig, LogError, LogFormat, init_logging};
pub use time::{TimeWindow, format_clock, format_duration};
