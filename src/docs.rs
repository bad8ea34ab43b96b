use crate::api::attendance::{AbsenteeRequest, AttendanceListResponse, MarkResponse, TodayResponse};
use crate::api::department::{DepartmentPayload, DepartmentSummary};
use crate::api::event::{EventOccurrences, EventPayload, WorkingDayResponse};
use crate::api::face::{CompareResponse, ComparePayload, DescriptorPayload};
use crate::api::leave_request::{BalanceEntry, CreateLeave, LeaveListResponse};
use crate::api::leave_type::LeaveTypePayload;
use crate::api::setting::SaveSetting;
use crate::api::user::{CreateUser, UpdateUser, UserListResponse};
use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::model::department::Department;
use crate::model::event::{CalendarEvent, EventType, RecurrencePattern};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::leave_type::LeaveType;
use crate::model::role::Role;
use crate::model::setting::{SettingResponse, SettingType};
use crate::model::user::UserResponse;
use crate::models::{LoginReqDto, TokenPair};
use crate::rules::window::{AttendanceWindows, MarkKind, Session, SessionWindows, TimeWindow};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Admin API",
        version = "1.0.0",
        description = r#"
## HR Administration

Employee records, departments, attendance with face recognition, leave
workflows and a company calendar.

### Roles
- **HR Admin**: full access
- **Supervisor**: own department's people, attendance and leave (first approval stage)
- **Employee**: self-service

### Attendance
Two sessions a day (morning and afternoon). Windows are configured with the
`attendance_time` setting; weekends and holidays come from calendar events.

### Security
Every `/api` endpoint requires a JWT bearer access token from `/auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::user::create_user,
        crate::api::user::list_users,
        crate::api::user::get_me,
        crate::api::user::get_user,
        crate::api::user::update_user,
        crate::api::user::delete_user,
        crate::api::cv::upload_cv,
        crate::api::cv::download_cv,

        crate::api::department::list_departments,
        crate::api::department::get_department,
        crate::api::department::create_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::my_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::export_attendance,
        crate::api::attendance::mark_absentees,

        crate::api::face::register_descriptor,
        crate::api::face::compare_face,

        crate::api::leave_type::list_leave_types,
        crate::api::leave_type::create_leave_type,
        crate::api::leave_type::update_leave_type,
        crate::api::leave_type::delete_leave_type,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::list_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::leave_balance,

        crate::api::event::list_events,
        crate::api::event::working_day,
        crate::api::event::get_event,
        crate::api::event::create_event,
        crate::api::event::update_event,
        crate::api::event::delete_event,

        crate::api::setting::list_settings,
        crate::api::setting::get_setting,
        crate::api::setting::save_setting
    ),
    components(
        schemas(
            LoginReqDto,
            TokenPair,
            Role,
            CreateUser,
            UpdateUser,
            UserResponse,
            UserListResponse,
            Department,
            DepartmentPayload,
            DepartmentSummary,
            Attendance,
            AttendanceStatus,
            AttendanceListResponse,
            MarkResponse,
            TodayResponse,
            AbsenteeRequest,
            MarkKind,
            Session,
            TimeWindow,
            SessionWindows,
            AttendanceWindows,
            DescriptorPayload,
            ComparePayload,
            CompareResponse,
            LeaveType,
            LeaveTypePayload,
            LeaveRequest,
            LeaveStatus,
            CreateLeave,
            LeaveListResponse,
            BalanceEntry,
            CalendarEvent,
            EventType,
            RecurrencePattern,
            EventPayload,
            EventOccurrences,
            WorkingDayResponse,
            SettingType,
            SettingResponse,
            SaveSetting
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token rotation"),
        (name = "Users", description = "Employee records and CVs"),
        (name = "Departments", description = "Department management"),
        (name = "Attendance", description = "Check-in/out, reports and absentees"),
        (name = "Face", description = "Face descriptor registration and matching"),
        (name = "Leave", description = "Leave types, requests and approvals"),
        (name = "Calendar", description = "Holidays, weekends, meetings and events"),
        (name = "Settings", description = "Process-wide configuration"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_area() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/auth/login",
            "/api/users/{user_id}/cv",
            "/api/attendance/export",
            "/api/face/compare",
            "/api/leave/balance",
            "/api/events/working-day",
            "/api/settings/{key}",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "missing {expected}");
        }
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
