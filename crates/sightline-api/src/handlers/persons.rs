//! Missing-person handlers.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, Response};
use axum::Json;
use serde::Serialize;
use tracing::info;
use validator::Validate;

use sightline_models::{MissingPerson, NewMissingPerson, PersonId, NO_PANT_COLOR};

use crate::error::{ApiError, ApiResult};
use crate::handlers::form::{remove_upload, sanitize_filename, save_field, FormFields, SavedFile};
use crate::metrics;
use crate::state::AppState;

/// Response for a submitted report.
#[derive(Serialize)]
pub struct ReportResponse {
    pub success: bool,
    pub person_id: PersonId,
    pub message: String,
    pub metadata: MissingPerson,
}

/// Response listing persons.
#[derive(Serialize)]
pub struct PersonListResponse {
    pub success: bool,
    pub count: usize,
    pub missing_persons: Vec<MissingPerson>,
}

/// Response for one person.
#[derive(Serialize)]
pub struct PersonResponse {
    pub success: bool,
    pub person: MissingPerson,
}

/// Generic acknowledgement.
#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Report a missing person with a reference photo.
///
/// Multipart fields: `photo`, `name` and `shirt_color` are required; `age`,
/// `gender`, `last_seen_location`, `pant_color`, `height`, `additional_notes`
/// and `contact_info` are optional.
pub async fn report_missing_person(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ReportResponse>> {
    let id = PersonId::new();
    let mut form = FormFields::default();
    let mut photo: Option<(SavedFile, String)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "photo" {
            let original_name = sanitize_filename(field.file_name().unwrap_or("photo.jpg"));
            let stored_name = format!("{id}_{original_name}");
            let size = save_field(field, &state.config.photos_dir.join(&stored_name)).await?;
            photo = Some((SavedFile { original_name, size }, stored_name));
        } else {
            form.insert(name, field.text().await?);
        }
    }

    let Some((saved, photo_filename)) = photo else {
        return Err(ApiError::bad_request("Missing form field: photo"));
    };
    let photo_path = state.config.photos_dir.join(&photo_filename);

    let fields = NewMissingPerson {
        name: form.take("name").trim().to_string(),
        age: form.take("age"),
        gender: form.take("gender"),
        last_seen_location: form.take("last_seen_location"),
        shirt_color: form.take("shirt_color").trim().to_string(),
        pant_color: form.take_or("pant_color", NO_PANT_COLOR),
        height: form.take("height"),
        additional_notes: form.take("additional_notes"),
        contact_info: form.take("contact_info"),
    };
    if let Err(e) = fields.validate() {
        remove_upload(&photo_path).await?;
        return Err(e.into());
    }

    let person = MissingPerson::new(id.clone(), fields, photo_filename, photo_path);
    info!(
        person_id = %id,
        photo = %saved.original_name,
        bytes = saved.size,
        shirt = %person.shirt_color,
        pants = %person.pant_color,
        "Missing person reported"
    );
    metrics::record_person_reported(saved.size);
    state.registry.insert_person(person.clone()).await;

    Ok(Json(ReportResponse {
        success: true,
        person_id: id,
        message: "Missing person report submitted successfully".to_string(),
        metadata: person,
    }))
}

/// List every reported person.
pub async fn list_missing_persons(State(state): State<AppState>) -> Json<PersonListResponse> {
    let persons = state.registry.persons().await;
    Json(PersonListResponse {
        success: true,
        count: persons.len(),
        missing_persons: persons,
    })
}

/// Details of one person.
pub async fn get_missing_person(
    State(state): State<AppState>,
    Path(person_id): Path<String>,
) -> ApiResult<Json<PersonResponse>> {
    let person = state
        .registry
        .person(&PersonId::from_string(person_id))
        .await
        .ok_or_else(|| ApiError::not_found("Missing person not found"))?;

    Ok(Json(PersonResponse {
        success: true,
        person,
    }))
}

/// Raw bytes of a person's reference photo.
pub async fn get_missing_person_photo(
    State(state): State<AppState>,
    Path(person_id): Path<String>,
) -> ApiResult<Response<Body>> {
    let person = state
        .registry
        .person(&PersonId::from_string(person_id))
        .await
        .ok_or_else(|| ApiError::not_found("Missing person not found"))?;

    let bytes = match tokio::fs::read(&person.photo_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("Photo file not found"));
        }
        Err(e) => return Err(e.into()),
    };

    let mut response = Response::new(Body::from(bytes));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(photo_mime_type(&person.photo_filename)),
    );
    if let Ok(disposition) =
        HeaderValue::from_str(&format!("inline; filename={}", person.photo_filename))
    {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    Ok(response)
}

/// Delete a person record and its photo.
pub async fn delete_missing_person(
    State(state): State<AppState>,
    Path(person_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let person = state
        .registry
        .remove_person(&PersonId::from_string(person_id))
        .await
        .ok_or_else(|| ApiError::not_found("Missing person not found"))?;

    remove_upload(&person.photo_path).await?;
    info!(person_id = %person.id, "Missing person record deleted");

    Ok(Json(MessageResponse {
        success: true,
        message: "Missing person record deleted successfully".to_string(),
    }))
}

fn photo_mime_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_mime_type_by_extension() {
        assert_eq!(photo_mime_type("person_1_ada.PNG"), "image/png");
        assert_eq!(photo_mime_type("person_1_ada.jpg"), "image/jpeg");
        assert_eq!(photo_mime_type("person_1_ada"), "image/jpeg");
    }
}
