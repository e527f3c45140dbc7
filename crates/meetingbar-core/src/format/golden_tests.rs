//! Golden tests for tray text.
//!
//! Each test runs the full pipeline from extracted links through state
//! resolution to rendered text, with a fixed clock.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::display::DisplayState;
use crate::event::{Meeting, ProviderKind};
use crate::format::DisplayTemplates;
use crate::links::primary_link_in;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 5, 14, 0, 0).unwrap()
}

fn meeting_at(id: &str, title: &str, start_offset: i64, end_offset: i64, text: &str) -> Meeting {
    let mut m = Meeting::new(
        id,
        title,
        now() + Duration::minutes(start_offset),
        now() + Duration::minutes(end_offset),
        "primary",
    );
    if let Some(link) = primary_link_in(&[text]) {
        m = m.with_link(link);
    }
    m
}

fn render(meetings: &[Meeting]) -> String {
    let state = DisplayState::resolve(meetings, now());
    DisplayTemplates::default().render(&state, now())
}

#[test]
fn upcoming_standup_with_meet_link() {
    let m = meeting_at(
        "a",
        "Team Standup",
        15,
        45,
        "https://meet.google.com/abc-defg-hij",
    );
    assert_eq!(m.link.as_ref().unwrap().kind, ProviderKind::GoogleMeet);
    insta::assert_snapshot!(render(&[m]), @"Team Standup in 15m");
}

#[test]
fn ongoing_meeting_time_left() {
    let m = meeting_at("b", "Sprint Planning", -10, 20, "");
    insta::assert_snapshot!(render(&[m]), @"Sprint Planning 20m left");
}

#[test]
fn nothing_scheduled() {
    insta::assert_snapshot!(render(&[]), @"No meetings");
}

#[test]
fn ongoing_beats_next() {
    let meetings = vec![
        meeting_at("a", "1:1 with manager", -5, 25, ""),
        meeting_at("b", "All hands", 10, 70, ""),
    ];
    insta::assert_snapshot!(render(&meetings), @"1:1 with manager 25m left");
}

#[test]
fn long_title_far_away() {
    let m = meeting_at(
        "c",
        "Cross-team architecture review session",
        150,
        210,
        "",
    );
    insta::assert_snapshot!(render(&[m]), @"Cross-team architectur... in 2h 30m");
}

#[test]
fn starting_within_a_minute() {
    let mut m = meeting_at("d", "Interview", 1, 60, "");
    m.start -= Duration::seconds(30);
    insta::assert_snapshot!(render(&[m]), @"Interview in <1m");
}
