use crate::models::UsageStatus;
use crate::AppState;
use rocket::serde::json::Json;
use rocket::{get, State};

#[get("/usage")]
pub async fn get_usage(state: &State<AppState>) -> Json<UsageStatus> {
    Json(state.usage.status())
}
