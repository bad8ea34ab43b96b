use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveType {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Annual")]
    pub name: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
    /// Working days allowed per calendar year; unlimited when absent
    #[schema(example = 12, nullable = true)]
    pub max_days_per_year: Option<u32>,
}
