use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::progress::DayRecord;
use crate::services::files::content_type_for;
use crate::AppState;

/// Accept a multipart photo upload for a date, store it, and record the
/// generated file name on the day's record (creating the record first if
/// the date has never been opened).
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    mut multipart: Multipart,
) -> AppResult<Json<DayRecord>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let ext = field
            .file_name()
            .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()))
            .unwrap_or_else(|| "jpg".into());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        if !bytes.is_empty() {
            upload = Some((ext, bytes.to_vec()));
            break;
        }
    }

    let Some((ext, bytes)) = upload else {
        return Err(AppError::Validation("No photo in upload".into()));
    };

    let file_name = photo_file_name(date, &ext);
    state.files.save(&file_name, &bytes).await?;

    // Make sure the day exists before attaching the photo reference.
    state.store.create_default(date).await?;
    let record = state.store.set_progress_pic(date, &file_name).await?;

    Ok(Json(record))
}

pub async fn get_photo(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> AppResult<Response> {
    let bytes = state
        .files
        .load(&file_name)
        .await?
        .ok_or(AppError::NotFound("Photo not found".into()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type_for(&file_name))],
        bytes,
    )
        .into_response())
}

fn photo_file_name(date: NaiveDate, ext: &str) -> String {
    format!("{date}_{}.{ext}", Uuid::new_v4())
}
