// Image upload and download
// Uploads are multipart/form-data with the file in the `image` field

use hyper::body::Bytes;
use hyper::StatusCode;
use multer::Multipart;
use serde_json::json;

use super::{authenticate, created_json, ApiError, ApiResult};
use crate::config::AppState;
use crate::http::{build_bytes_response, build_empty_response, mime, ApiRequest, HttpResponse};
use crate::model::Image;

const FIELD: &str = "image";

/// The uploaded file: bytes plus the best known content type.
struct Upload {
    data: Bytes,
    content_type: String,
}

pub async fn upload(req: &ApiRequest, state: &AppState) -> ApiResult<HttpResponse> {
    authenticate(req, state)?;
    store_upload(req, state)
        .await
        .map_err(|e| e.or_server_message("Upload failed."))
}

async fn store_upload(req: &ApiRequest, state: &AppState) -> ApiResult<HttpResponse> {
    let upload = read_image_field(req)
        .await?
        .ok_or_else(|| ApiError::bad_request("No file uploaded."))?;

    let image = Image::new(upload.data.to_vec(), upload.content_type);
    state.store.insert(&image).await?;
    created_json(&json!({ "imageUrl": image.url() }))
}

/// Find the `image` part. Non-multipart bodies have no file.
async fn read_image_field(req: &ApiRequest) -> ApiResult<Option<Upload>> {
    let Some(boundary) = req
        .content_type()
        .and_then(|ct| multer::parse_boundary(ct).ok())
    else {
        return Ok(None);
    };

    let body = req.body.clone();
    let stream = futures::stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = Multipart::new(stream, boundary);

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some(FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .map(ToString::to_string)
            .or_else(|| {
                field
                    .file_name()
                    .and_then(mime::guess_image_type)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| mime::DEFAULT_IMAGE.to_string());
        let data = field.bytes().await.map_err(malformed)?;
        if data.is_empty() {
            return Ok(None);
        }
        return Ok(Some(Upload { data, content_type }));
    }
    Ok(None)
}

fn malformed(err: multer::Error) -> ApiError {
    ApiError::bad_request(format!("Malformed multipart body: {err}"))
}

/// Public download. A missing image is a bare 404.
pub async fn get(state: &AppState, id: &str) -> ApiResult<HttpResponse> {
    match state.store.find::<Image>(id).await? {
        Some(image) => Ok(build_bytes_response(
            Bytes::from(image.data),
            &image.content_type,
        )),
        None => Ok(build_empty_response(StatusCode::NOT_FOUND)),
    }
}
