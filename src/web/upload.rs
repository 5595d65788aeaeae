//! Image upload endpoint
//!
//! Accepts a single multipart image field, stores it content-addressed
//! under the uploads directory, and returns the public URL. Files are
//! served back by the static handler mounted at /uploads.

use super::error::ErrorBody;
use crate::app_config::APP_CONFIG;
use crate::filesystem;
use crate::middleware::ClientCtx;
use actix_multipart::Multipart;
use actix_web::{error, post, Error, HttpResponse};
use futures_util::TryStreamExt;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_upload);
}

#[post("/api/upload")]
async fn post_upload(client: ClientCtx, mut payload: Multipart) -> Result<HttpResponse, Error> {
    client.require_login()?;

    let max_bytes = APP_CONFIG.uploads.max_file_bytes;

    while let Some(mut field) = payload.try_next().await? {
        let is_image = field
            .content_type()
            .map(|ct| ct.type_() == mime::IMAGE)
            .unwrap_or(false);
        if !is_image {
            continue;
        }

        let extension = field
            .content_disposition()
            .get_filename()
            .map(filesystem::sanitized_extension)
            .unwrap_or_default();

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if bytes.len() + chunk.len() > max_bytes {
                return Ok(HttpResponse::BadRequest().json(ErrorBody {
                    message: format!("File exceeds the {} byte limit", max_bytes),
                }));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            break;
        }

        let filename = filesystem::store_upload(&bytes, &extension).map_err(|e| {
            log::error!("Failed to store upload: {}", e);
            error::ErrorInternalServerError("Failed to store upload")
        })?;

        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Image uploaded successfully",
            "url": format!("{}/uploads/{}", APP_CONFIG.site.base_url, filename),
        })));
    }

    Ok(HttpResponse::BadRequest().json(ErrorBody {
        message: "No file provided or invalid file type".to_string(),
    }))
}
