use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};

use proctor_core::pipeline::detect_faces_use_case::FaceCheckOutcome;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the uploaded image.
const IMAGE_FIELD: &str = "image";

/// POST /detect_faces
///
/// Counts faces in the uploaded image and records a violation when there is
/// more than one. Responds `{"faces": n}` or
/// `{"violation": "Multiple Faces Detected", "faces": n}`.
async fn detect_faces(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<FaceCheckOutcome>> {
    let mut multipart = multipart.map_err(|e| ApiError::Decode(e.body_text()))?;
    let image = read_image_field(&mut multipart).await?;

    let pipeline = state.pipeline.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut pipeline = pipeline
            .lock()
            .map_err(|_| ApiError::Inference("face detection pipeline is unavailable".into()))?;
        pipeline.execute(&image).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Inference(e.to_string()))??;

    log::debug!("detect_faces: {} face(s)", outcome.faces());
    Ok(Json(outcome))
}

async fn read_image_field(multipart: &mut Multipart) -> ApiResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Decode(e.body_text()))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Decode(e.body_text()))?;
            return Ok(data.to_vec());
        }
    }
    Err(ApiError::Decode(format!(
        "no '{IMAGE_FIELD}' field in the upload"
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/detect_faces", post(detect_faces))
}
