//! Attendance time windows.
//!
//! A working day has two sessions, morning and afternoon. Each session has a
//! check-in window and a check-out window. Check-in is accepted from
//! `start - lead` until `end` and is late strictly after `start`. Check-out is
//! accepted from `start` until `end + grace` and is early strictly before `end`.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

pub const DEFAULT_CHECK_IN_LEAD_MINUTES: i64 = 60;
pub const DEFAULT_CHECK_OUT_GRACE_MINUTES: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Session {
    Morning,
    Afternoon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MarkKind {
    CheckIn,
    CheckOut,
}

/// A `HH:MM` or `HH:MM:SS` bounded range of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimeWindow {
    #[serde(with = "clock")]
    #[schema(value_type = String, example = "08:00")]
    pub start: NaiveTime,
    #[serde(with = "clock")]
    #[schema(value_type = String, example = "12:00")]
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Strictly after the start.
    pub fn is_late(&self, at: NaiveTime) -> bool {
        at > self.start
    }

    /// Strictly before the end.
    pub fn is_early(&self, at: NaiveTime) -> bool {
        at < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionWindows {
    pub morning: TimeWindow,
    pub afternoon: TimeWindow,
}

impl SessionWindows {
    pub fn get(&self, session: Session) -> &TimeWindow {
        match session {
            Session::Morning => &self.morning,
            Session::Afternoon => &self.afternoon,
        }
    }
}

/// Value of the `attendance_time` setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceWindows {
    pub check_in: SessionWindows,
    pub check_out: SessionWindows,
    #[serde(default = "default_lead")]
    pub check_in_lead_minutes: i64,
    #[serde(default = "default_grace")]
    pub check_out_grace_minutes: i64,
}

fn default_lead() -> i64 {
    DEFAULT_CHECK_IN_LEAD_MINUTES
}

fn default_grace() -> i64 {
    DEFAULT_CHECK_OUT_GRACE_MINUTES
}

/// Outcome of resolving a mark against the configured windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub session: Session,
    pub late: bool,
    pub early: bool,
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

impl Default for AttendanceWindows {
    fn default() -> Self {
        let sessions = SessionWindows {
            morning: TimeWindow::new(hm(8, 0), hm(12, 0)),
            afternoon: TimeWindow::new(hm(13, 0), hm(17, 0)),
        };
        Self {
            check_in: sessions,
            check_out: sessions,
            check_in_lead_minutes: DEFAULT_CHECK_IN_LEAD_MINUTES,
            check_out_grace_minutes: DEFAULT_CHECK_OUT_GRACE_MINUTES,
        }
    }
}

impl AttendanceWindows {
    /// Returns a list of `(field, message)` problems, empty when valid.
    pub fn problems(&self) -> Vec<(String, String)> {
        let mut problems = Vec::new();
        let all = [
            ("check_in.morning", &self.check_in.morning),
            ("check_in.afternoon", &self.check_in.afternoon),
            ("check_out.morning", &self.check_out.morning),
            ("check_out.afternoon", &self.check_out.afternoon),
        ];
        for (field, window) in all {
            if window.start > window.end {
                problems.push((field.to_string(), "start must not be after end".to_string()));
            }
        }
        if !(0..=720).contains(&self.check_in_lead_minutes) {
            problems.push((
                "check_in_lead_minutes".to_string(),
                "must be between 0 and 720".to_string(),
            ));
        }
        if !(0..=720).contains(&self.check_out_grace_minutes) {
            problems.push((
                "check_out_grace_minutes".to_string(),
                "must be between 0 and 720".to_string(),
            ));
        }
        problems
    }

    fn accepts(&self, kind: MarkKind, window: &TimeWindow, at: NaiveTime) -> bool {
        match kind {
            MarkKind::CheckIn => {
                let opens = shift_back(window.start, self.check_in_lead_minutes);
                opens <= at && at <= window.end
            }
            MarkKind::CheckOut => {
                let closes = shift_forward(window.end, self.check_out_grace_minutes);
                window.start <= at && at <= closes
            }
        }
    }

    /// Every session whose window accepts a mark at `at`, morning first.
    pub fn candidates(&self, kind: MarkKind, at: NaiveTime) -> Vec<Session> {
        let windows = self.windows(kind);
        [Session::Morning, Session::Afternoon]
            .into_iter()
            .filter(|session| self.accepts(kind, windows.get(*session), at))
            .collect()
    }

    /// Which session a mark at `at` belongs to. Morning wins on overlap.
    pub fn session_for(&self, kind: MarkKind, at: NaiveTime) -> Option<Session> {
        self.candidates(kind, at).into_iter().next()
    }

    pub fn mark(&self, kind: MarkKind, session: Session, at: NaiveTime) -> Mark {
        let window = self.windows(kind).get(session);
        Mark {
            session,
            late: kind == MarkKind::CheckIn && window.is_late(at),
            early: kind == MarkKind::CheckOut && window.is_early(at),
        }
    }

    pub fn windows(&self, kind: MarkKind) -> &SessionWindows {
        match kind {
            MarkKind::CheckIn => &self.check_in,
            MarkKind::CheckOut => &self.check_out,
        }
    }
}

#[cfg(test)]
impl AttendanceWindows {
    fn evaluate(&self, kind: MarkKind, at: NaiveTime) -> Option<Mark> {
        let session = self.session_for(kind, at)?;
        Some(self.mark(kind, session, at))
    }
}

// Clamp at midnight instead of wrapping into the previous day.
fn shift_back(t: NaiveTime, minutes: i64) -> NaiveTime {
    let (shifted, wrapped) = t.overflowing_sub_signed(Duration::minutes(minutes));
    if wrapped != 0 { NaiveTime::MIN } else { shifted }
}

fn shift_forward(t: NaiveTime, minutes: i64) -> NaiveTime {
    let (shifted, wrapped) = t.overflowing_add_signed(Duration::minutes(minutes));
    if wrapped != 0 {
        NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(t)
    } else {
        shifted
    }
}

mod clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
            .map_err(|_| D::Error::custom(format!("invalid time of day: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[rstest]
    #[case(Session::Morning)]
    #[case(Session::Afternoon)]
    fn check_in_exactly_at_start_is_not_late(#[case] session: Session) {
        let windows = AttendanceWindows::default();
        let start = windows.check_in.get(session).start;

        let on_time = windows.evaluate(MarkKind::CheckIn, start).unwrap();
        assert_eq!(on_time.session, session);
        assert!(!on_time.late);

        let one_second_after = start + Duration::seconds(1);
        let late = windows.evaluate(MarkKind::CheckIn, one_second_after).unwrap();
        assert_eq!(late.session, session);
        assert!(late.late);
    }

    #[test]
    fn lateness_boundary_holds_for_custom_windows() {
        let json = r#"{
            "check_in":  {"morning": {"start": "07:30", "end": "11:00"}, "afternoon": {"start": "12:45:30", "end": "16:00"}},
            "check_out": {"morning": {"start": "10:00", "end": "11:30"}, "afternoon": {"start": "15:00", "end": "18:00"}}
        }"#;
        let windows: AttendanceWindows = serde_json::from_str(json).unwrap();
        for session in [Session::Morning, Session::Afternoon] {
            let start = windows.check_in.get(session).start;
            assert!(!windows.check_in.get(session).is_late(start));
            assert!(windows.check_in.get(session).is_late(start + Duration::seconds(1)));
        }
        assert_eq!(windows.check_in_lead_minutes, DEFAULT_CHECK_IN_LEAD_MINUTES);
    }

    #[test]
    fn check_in_before_start_within_lead_is_on_time() {
        let windows = AttendanceWindows::default();
        let mark = windows.evaluate(MarkKind::CheckIn, t(7, 15, 0)).unwrap();
        assert_eq!(mark.session, Session::Morning);
        assert!(!mark.late);
        assert!(windows.evaluate(MarkKind::CheckIn, t(6, 59, 59)).is_none());
    }

    #[rstest]
    #[case(t(12, 0, 0), Some(Session::Morning))]
    #[case(t(12, 0, 1), Some(Session::Afternoon))]
    #[case(t(16, 59, 0), Some(Session::Afternoon))]
    #[case(t(17, 0, 1), None)]
    fn check_in_session_resolution(#[case] at: NaiveTime, #[case] expected: Option<Session>) {
        let windows = AttendanceWindows::default();
        assert_eq!(windows.session_for(MarkKind::CheckIn, at), expected);
    }

    #[test]
    fn check_out_before_end_is_early() {
        let windows = AttendanceWindows::default();
        let early = windows.evaluate(MarkKind::CheckOut, t(11, 59, 59)).unwrap();
        assert_eq!(early.session, Session::Morning);
        assert!(early.early);
        assert!(!early.late);

        let on_time = windows.evaluate(MarkKind::CheckOut, t(17, 0, 0)).unwrap();
        assert_eq!(on_time.session, Session::Afternoon);
        assert!(!on_time.early);
    }

    #[test]
    fn check_out_grace_extends_past_end() {
        let windows = AttendanceWindows::default();
        assert_eq!(
            windows.session_for(MarkKind::CheckOut, t(18, 30, 0)),
            Some(Session::Afternoon)
        );
        assert_eq!(windows.session_for(MarkKind::CheckOut, t(19, 0, 1)), None);
        assert_eq!(windows.session_for(MarkKind::CheckOut, t(7, 0, 0)), None);
    }

    #[test]
    fn overlapping_check_out_lists_both_sessions() {
        let windows = AttendanceWindows::default();
        assert_eq!(
            windows.candidates(MarkKind::CheckOut, t(13, 30, 0)),
            vec![Session::Morning, Session::Afternoon]
        );
        let mark = windows.mark(MarkKind::CheckOut, Session::Afternoon, t(13, 30, 0));
        assert!(mark.early);
    }

    #[test]
    fn lead_clamps_at_midnight() {
        let mut windows = AttendanceWindows::default();
        windows.check_in.morning = TimeWindow::new(t(0, 30, 0), t(2, 0, 0));
        assert_eq!(
            windows.session_for(MarkKind::CheckIn, t(0, 0, 0)),
            Some(Session::Morning)
        );
    }

    #[test]
    fn inverted_window_is_reported() {
        let mut windows = AttendanceWindows::default();
        windows.check_out.afternoon = TimeWindow::new(t(18, 0, 0), t(17, 0, 0));
        windows.check_in_lead_minutes = -5;
        let fields: Vec<String> = windows.problems().into_iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["check_out.afternoon", "check_in_lead_minutes"]);
    }

    #[test]
    fn windows_serialize_as_clock_strings() {
        let value = serde_json::to_value(AttendanceWindows::default()).unwrap();
        assert_eq!(value["check_in"]["morning"]["start"], "08:00");
        assert_eq!(value["check_out"]["afternoon"]["end"], "17:00");
    }
}
