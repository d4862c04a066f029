//! Generic file upload (`/upload`)

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::attachment::{Adjunto, UploadFile, Uploader};
use crate::error::{Error, Result};
use crate::infrastructure::http::ApiClient;

/// Upload response; field names vary between backend versions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    #[serde(default, alias = "path", alias = "location")]
    url: String,
    #[serde(default, alias = "filename", alias = "originalname", alias = "name")]
    nombre: Option<String>,
    #[serde(default, alias = "mimetype", alias = "mimeType")]
    tipo: Option<String>,
    #[serde(default, alias = "size")]
    tamano: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: ApiClient,
}

impl HttpUploader {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, file: UploadFile) -> Result<Adjunto> {
        if file.is_empty() {
            return Err(Error::InvalidInput(format!(
                "File '{}' is empty",
                file.file_name
            )));
        }
        let file_name = file.file_name.clone();
        let mime = file.mime.clone();
        let size = file.bytes.len() as u64;

        let uploaded: UploadedFile = self.client.post_multipart("/upload", "file", file).await?;
        if uploaded.url.is_empty() {
            return Err(Error::InvalidResponse(
                "/upload: response has no file URL".to_string(),
            ));
        }
        Ok(Adjunto {
            nombre: uploaded.nombre.unwrap_or(file_name),
            url: uploaded.url,
            tipo: uploaded.tipo.or(Some(mime)),
            tamano: uploaded.tamano.or(Some(size)),
        })
    }
}
