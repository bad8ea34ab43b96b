pub mod attendance;
pub mod department;
pub mod event;
pub mod leave_request;
pub mod leave_type;
pub mod role;
pub mod setting;
pub mod user;
