use crate::models::SelectionResponse;
use crate::AppState;
use log::info;
use rocket::serde::json::Json;
use rocket::{delete, get, post, State};

fn selection_response(state: &AppState) -> Json<SelectionResponse> {
    Json(SelectionResponse {
        selected: state.selection.ids(),
    })
}

#[get("/selection")]
pub async fn get_selection(state: &State<AppState>) -> Json<SelectionResponse> {
    selection_response(state)
}

#[post("/selection/<video_id>")]
pub async fn select_video(video_id: &str, state: &State<AppState>) -> Json<SelectionResponse> {
    if state.selection.select(video_id) {
        info!("Selected video {video_id}");
        state.persist_selection();
    }
    selection_response(state)
}

#[delete("/selection/<video_id>")]
pub async fn deselect_video(video_id: &str, state: &State<AppState>) -> Json<SelectionResponse> {
    if state.selection.deselect(video_id) {
        info!("Deselected video {video_id}");
        state.persist_selection();
    }
    selection_response(state)
}

#[delete("/selection")]
pub async fn clear_selection(state: &State<AppState>) -> Json<SelectionResponse> {
    state.selection.clear();
    state.persist_selection();
    selection_response(state)
}
