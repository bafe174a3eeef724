use axum::extract::Multipart;
use axum::http::StatusCode;
use std::collections::HashMap;

use crate::error::ApiError;
use crate::media::MediaFile;

/// A fully buffered multipart form: text fields plus any file parts.
///
/// Lookups take a list of accepted names so clients may send either the
/// camelCase or the snake_case spelling of a field.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, MediaFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    form.files.insert(
                        name.clone(),
                        MediaFile {
                            field: name,
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    let text = field.text().await.map_err(multipart_error)?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// Trimmed text value of the first matching field; blank counts as absent.
    pub fn text(&self, names: &[&str]) -> Option<String> {
        names
            .iter()
            .filter_map(|name| self.fields.get(*name))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn required_text(&self, names: &[&str]) -> Result<String, ApiError> {
        self.text(names)
            .ok_or_else(|| ApiError::field_error(names[0], format!("{} is required", names[0])))
    }

    /// Like `required_text` but keeps surrounding whitespace, for passwords.
    pub fn required_secret(&self, names: &[&str]) -> Result<String, ApiError> {
        names
            .iter()
            .filter_map(|name| self.fields.get(*name))
            .find(|value| !value.trim().is_empty())
            .cloned()
            .ok_or_else(|| ApiError::field_error(names[0], format!("{} is required", names[0])))
    }

    pub fn take_file(&mut self, names: &[&str]) -> Option<MediaFile> {
        names.iter().find_map(|name| self.files.remove(*name))
    }

    pub fn required_file(&mut self, names: &[&str]) -> Result<MediaFile, ApiError> {
        self.take_file(names)
            .ok_or_else(|| ApiError::field_error(names[0], format!("{} file is required", names[0])))
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(e.body_text());
    }
    ApiError::bad_request(format!("Multipart error: {}", e.body_text()))
}
