pub mod attendance;
pub mod cv;
pub mod department;
pub mod event;
pub mod face;
pub mod leave_request;
pub mod leave_type;
pub mod setting;
pub mod user;
