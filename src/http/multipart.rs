use std::path::Path;

use uuid::Uuid;

use crate::errors::Error;

const LINE_BREAK: &str = "\r\n";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    Data {
        bytes: Vec<u8>,
        filename: Option<String>,
        mime_type: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartPart {
    pub name: String,
    pub value: PartValue,
}

impl MultipartPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }

    pub fn bytes(
        name: impl Into<String>,
        bytes: Vec<u8>,
        filename: Option<String>,
        mime_type: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Data {
                bytes,
                filename,
                mime_type,
            },
        }
    }

    /// Reads a file into a data part named after the file.
    pub async fn from_path(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        mime_type: Option<String>,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::Upload(format!("Failed to read '{}': {e}", path.display())))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Ok(Self::bytes(name, bytes, filename, mime_type))
    }
}

#[derive(Clone, Debug)]
pub struct MultipartBody {
    pub data: Vec<u8>,
    pub content_type: String,
}

impl MultipartBody {
    pub fn build(parts: &[MultipartPart]) -> Self {
        Self::build_with_boundary(parts, &format!("Boundary-{}", Uuid::new_v4()))
    }

    pub fn build_with_boundary(parts: &[MultipartPart], boundary: &str) -> Self {
        let mut data = Vec::new();
        for part in parts {
            data.extend_from_slice(format!("--{boundary}{LINE_BREAK}").as_bytes());
            match &part.value {
                PartValue::Text(text) => {
                    data.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"{LINE_BREAK}{LINE_BREAK}",
                            part.name
                        )
                        .as_bytes(),
                    );
                    data.extend_from_slice(text.as_bytes());
                }
                PartValue::Data {
                    bytes,
                    filename,
                    mime_type,
                } => {
                    let filename = filename.as_deref().unwrap_or("blob");
                    let mime_type = mime_type.as_deref().unwrap_or("application/octet-stream");
                    data.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"{LINE_BREAK}",
                            part.name
                        )
                        .as_bytes(),
                    );
                    data.extend_from_slice(
                        format!("Content-Type: {mime_type}{LINE_BREAK}{LINE_BREAK}").as_bytes(),
                    );
                    data.extend_from_slice(bytes);
                }
            }
            data.extend_from_slice(LINE_BREAK.as_bytes());
        }
        data.extend_from_slice(format!("--{boundary}--{LINE_BREAK}").as_bytes());

        Self {
            data,
            content_type: format!("multipart/form-data; boundary={boundary}"),
        }
    }
}
