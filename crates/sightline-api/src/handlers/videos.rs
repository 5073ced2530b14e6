//! CCTV video handlers.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;
use tracing::info;
use validator::Validate;

use sightline_models::{NewVideo, VideoId, VideoRecord};

use crate::error::{ApiError, ApiResult};
use crate::handlers::form::{remove_upload, sanitize_filename, save_field, FormFields, SavedFile};
use crate::handlers::persons::MessageResponse;
use crate::metrics;
use crate::state::AppState;

/// Response for a stored upload.
#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub video_id: VideoId,
    pub message: String,
    pub metadata: VideoRecord,
}

/// Response listing videos.
#[derive(Serialize)]
pub struct VideoListResponse {
    pub success: bool,
    pub count: usize,
    pub videos: Vec<VideoRecord>,
}

/// Upload a CCTV video.
///
/// Multipart fields: `video`, `department`, `location`, `time_window`.
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let id = VideoId::new();
    let mut form = FormFields::default();
    let mut upload: Option<(SavedFile, std::path::PathBuf)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "video" {
            let original_name = sanitize_filename(field.file_name().unwrap_or("video.mp4"));
            let extension = original_name
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .unwrap_or_else(|| "mp4".to_string());
            let path = state.config.upload_dir.join(format!("{id}.{extension}"));
            let size = save_field(field, &path).await?;
            upload = Some((SavedFile { original_name, size }, path));
        } else {
            form.insert(name, field.text().await?);
        }
    }

    let Some((saved, path)) = upload else {
        return Err(ApiError::bad_request("Missing form field: video"));
    };

    let fields = NewVideo {
        department: form.take("department").trim().to_string(),
        location: form.take("location").trim().to_string(),
        time_window: form.take("time_window").trim().to_string(),
    };
    if let Err(e) = fields.validate() {
        remove_upload(&path).await?;
        return Err(e.into());
    }

    let video = VideoRecord::new(id.clone(), fields, saved.original_name, path, saved.size);
    info!(
        video_id = %id,
        filename = %video.filename,
        bytes = video.size,
        location = %video.location,
        "Video uploaded"
    );
    metrics::record_video_uploaded(video.size);
    state.registry.insert_video(video.clone()).await;

    Ok(Json(UploadResponse {
        success: true,
        video_id: id,
        message: "Video uploaded successfully".to_string(),
        metadata: video,
    }))
}

/// List every uploaded video.
pub async fn list_videos(State(state): State<AppState>) -> Json<VideoListResponse> {
    let videos = state.registry.videos().await;
    Json(VideoListResponse {
        success: true,
        count: videos.len(),
        videos,
    })
}

/// Delete a video record and its file.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let video = state
        .registry
        .remove_video(&VideoId::from_string(video_id))
        .await
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    remove_upload(&video.path).await?;
    info!(video_id = %video.id, "Video deleted");

    Ok(Json(MessageResponse {
        success: true,
        message: "Video deleted successfully".to_string(),
    }))
}
