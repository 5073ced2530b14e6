//! Person-in-video search handler.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Response};
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use tokio::sync::watch;

use sightline_media::{
    build_target, load_reference_photo, MediaError, MediaResult, ScanControl, Scanner,
    SearchLogger, VideoOpener,
};
use sightline_models::{MatchKind, MissingPerson, PersonId, SearchRecord, VideoId, VideoRecord};

use crate::error::{ApiError, ApiResult};
use crate::handlers::form::FormFields;
use crate::metrics;
use crate::middleware::SEARCH_RESULT_HEADERS;
use crate::state::AppState;

const JPEG_QUALITY: u8 = 90;

/// A full match, ready to send.
#[derive(Debug)]
struct SearchHit {
    final_score: f64,
    timestamp_seconds: f64,
    frame_index: u64,
    jpeg: Vec<u8>,
}

/// Everything the blocking scan needs, owned.
struct SearchJob {
    scanner: Arc<Scanner>,
    opener: Arc<dyn VideoOpener>,
    photo_path: PathBuf,
    video_path: PathBuf,
    shirt_color: String,
    pant_color: String,
    timeout_secs: u64,
    cancel_rx: watch::Receiver<bool>,
    logger: SearchLogger,
}

/// Cancels the scan if the request goes away before it finishes.
struct CancelOnDrop(watch::Sender<bool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        let _ = self.0.send(true);
    }
}

/// Search one video for one person.
///
/// Multipart fields: `person_id`, `video_id`. Responds with the annotated
/// match frame as JPEG, or 404 when the person is not in the video.
pub async fn search_person(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Response<Body>> {
    let mut form = FormFields::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        form.insert(name, field.text().await?);
    }
    let person_id = PersonId::from_string(form.require("person_id")?);
    let video_id = VideoId::from_string(form.require("video_id")?);

    let person = state
        .registry
        .person(&person_id)
        .await
        .ok_or_else(|| ApiError::not_found("Missing person not found"))?;
    let video = state
        .registry
        .video(&video_id)
        .await
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    let logger = SearchLogger::new(person.id.as_str(), video.id.as_str());
    logger.log_start(&format!(
        "{} (last seen {}) wearing {} shirt, {} pants in {} at {} ({})",
        person.name,
        person.last_seen_location,
        person.shirt_color,
        person.pant_color,
        video.filename,
        video.location,
        video.department
    ));

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let _cancel = CancelOnDrop(cancel_tx);
    let job = SearchJob {
        scanner: Arc::clone(&state.scanner),
        opener: Arc::clone(&state.opener),
        photo_path: person.photo_path.clone(),
        video_path: video.path.clone(),
        shirt_color: person.shirt_color.clone(),
        pant_color: person.pant_color.clone(),
        timeout_secs: state.config.search_timeout.as_secs(),
        cancel_rx,
        logger: logger.clone(),
    };

    metrics::search_started();
    let result = tokio::task::spawn_blocking(move || run_search(&job)).await;
    metrics::search_finished();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            logger.log_error(&format!("search task failed: {e}"));
            metrics::record_search("error");
            return Err(ApiError::internal(format!("Search task failed: {e}")));
        }
    };

    match outcome {
        Ok(Some(hit)) => {
            let record =
                SearchRecord::match_found(&person, &video, hit.final_score, hit.timestamp_seconds);
            logger.log_completion(&format!(
                "MATCH FOUND at frame {} ({:.1}s), score {:.2}",
                hit.frame_index, hit.timestamp_seconds, hit.final_score
            ));
            let response = match_response(&person, &video, &record, hit);
            state.registry.complete_search(record).await;
            metrics::record_search("match_found");
            Ok(response)
        }
        Ok(None) => {
            logger.log_completion("no match");
            state
                .registry
                .complete_search(SearchRecord::no_match(&person, &video))
                .await;
            metrics::record_search("no_match");
            Err(ApiError::NoMatch(format!(
                "No match found for {} in {}",
                person.name, video.filename
            )))
        }
        Err(e) => {
            logger.log_error(&e.to_string());
            metrics::record_search(search_error_label(&e));
            Err(e.into())
        }
    }
}

/// Build the target and scan. Runs on the blocking pool.
fn run_search(job: &SearchJob) -> MediaResult<Option<SearchHit>> {
    let _span = job.logger.create_span().entered();

    let photo = load_reference_photo(&job.photo_path)?;
    let target = build_target(
        job.scanner.capabilities(),
        &photo,
        &job.shirt_color,
        &job.pant_color,
    )?;

    let control = ScanControl::new()
        .with_timeout(job.timeout_secs)
        .with_cancel(job.cancel_rx.clone());
    let report = job.scanner.scan_path(
        job.opener.as_ref(),
        &job.video_path,
        &target,
        &control,
        |sighting| {
            if sighting.kind == MatchKind::FaceOnlyMatch {
                job.logger.log_warning(&format!(
                    "face matches at frame {} (face {:.2}) but clothing differs",
                    sighting.sample.frame_index, sighting.scores.face_score
                ));
            }
        },
    )?;

    job.logger.log_progress(&format!(
        "sampled {} of {} frames, {} faces, {} face-only candidates",
        report.stats.frames_sampled,
        report.stats.frames_decoded,
        report.stats.faces_located,
        report.stats.face_only_matches
    ));

    let Some(sighting) = report.outcome.into_sighting() else {
        return Ok(None);
    };
    Ok(Some(SearchHit {
        final_score: sighting.scores.final_score,
        timestamp_seconds: sighting.sample.timestamp_seconds,
        frame_index: sighting.sample.frame_index,
        jpeg: encode_jpeg(sighting.sample.image)?,
    }))
}

fn encode_jpeg(image: RgbImage) -> MediaResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image).write_to(&mut buf, ImageOutputFormat::Jpeg(JPEG_QUALITY))?;
    Ok(buf.into_inner())
}

fn match_response(
    person: &MissingPerson,
    video: &VideoRecord,
    record: &SearchRecord,
    hit: SearchHit,
) -> Response<Body> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("inline; filename=match_found.jpg"),
    );

    let values = [
        record.id.as_str().to_string(),
        person.id.as_str().to_string(),
        person.name.clone(),
        video.id.as_str().to_string(),
        video.filename.clone(),
        video.location.clone(),
        video.department.clone(),
        record.search_date.to_rfc3339(),
        person.last_seen_location.clone(),
        person.shirt_color.clone(),
        person.pant_color.clone(),
        format!("{:.4}", hit.final_score),
    ];
    for (name, value) in SEARCH_RESULT_HEADERS.iter().zip(values.iter()) {
        headers.insert(HeaderName::from_static(*name), header_text(value));
    }
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        header_text(&SEARCH_RESULT_HEADERS.join(",")),
    );

    let mut response = Response::new(Body::from(hit.jpeg));
    *response.headers_mut() = headers;
    response
}

/// Header value from free text, with anything outside visible ASCII replaced.
fn header_text(value: &str) -> HeaderValue {
    let clean: String = value
        .chars()
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '?' })
        .collect();
    HeaderValue::from_str(clean.trim()).unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn search_error_label(error: &MediaError) -> &'static str {
    match error {
        MediaError::NoFaceInReference => "no_face_in_reference",
        MediaError::EmptyOrUnreadableVideo(_) => "unreadable_video",
        MediaError::UnreadableReference(_) => "unreadable_reference",
        MediaError::Timeout(_) => "timeout",
        MediaError::Cancelled => "cancelled",
        _ => "error",
    }
}
