use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::rules::window::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    OnLeave,
}

impl AttendanceStatus {
    /// Status of a marked row. Lateness in either session wins over presence.
    pub fn derive(row: &Attendance) -> Self {
        if row.is_late_morning || row.is_late_afternoon {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub morning_check_in: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub morning_check_out: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub afternoon_check_in: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub afternoon_check_out: Option<NaiveDateTime>,
    pub is_late_morning: bool,
    pub is_late_afternoon: bool,
    pub is_early_morning: bool,
    pub is_early_afternoon: bool,
    #[schema(example = "PRESENT")]
    pub status: String,
}

impl Attendance {
    pub fn check_in(&self, session: Session) -> Option<NaiveDateTime> {
        match session {
            Session::Morning => self.morning_check_in,
            Session::Afternoon => self.afternoon_check_in,
        }
    }

    pub fn check_out(&self, session: Session) -> Option<NaiveDateTime> {
        match session {
            Session::Morning => self.morning_check_out,
            Session::Afternoon => self.afternoon_check_out,
        }
    }

    /// Checked in for the session and not yet checked out.
    pub fn is_open(&self, session: Session) -> bool {
        self.check_in(session).is_some() && self.check_out(session).is_none()
    }
}

/// Column names per session, used to build the marking statements.
pub struct SessionColumns {
    pub check_in: &'static str,
    pub check_out: &'static str,
    pub late: &'static str,
    pub early: &'static str,
}

pub fn session_columns(session: Session) -> SessionColumns {
    match session {
        Session::Morning => SessionColumns {
            check_in: "morning_check_in",
            check_out: "morning_check_out",
            late: "is_late_morning",
            early: "is_early_morning",
        },
        Session::Afternoon => SessionColumns {
            check_in: "afternoon_check_in",
            check_out: "afternoon_check_out",
            late: "is_late_afternoon",
            early: "is_early_afternoon",
        },
    }
}

#[cfg(test)]
pub(crate) fn empty_row(date: NaiveDate) -> Attendance {
    Attendance {
        id: 1,
        user_id: 7,
        date,
        morning_check_in: None,
        morning_check_out: None,
        afternoon_check_in: None,
        afternoon_check_out: None,
        is_late_morning: false,
        is_late_afternoon: false,
        is_early_morning: false,
        is_early_afternoon: false,
        status: AttendanceStatus::Present.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_late_when_any_session_was_late() {
        let mut row = empty_row(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert_eq!(AttendanceStatus::derive(&row), AttendanceStatus::Present);

        row.is_late_afternoon = true;
        assert_eq!(AttendanceStatus::derive(&row), AttendanceStatus::Late);
    }
}
