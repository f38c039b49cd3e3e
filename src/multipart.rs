//! `multipart/form-data` body encoding.

use bytes::{BufMut, Bytes, BytesMut};

/// One named section of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    /// The form field name.
    pub name: String,

    /// The file name reported to the server.
    pub file_name: Option<String>,

    /// The MIME type of `data`.
    ///
    /// Only emitted together with `file_name`.
    pub mime_type: Option<String>,

    /// The raw section content.
    pub data: Bytes,
}

impl MultipartPart {
    /// Creates a plain form field.
    pub fn text(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            mime_type: None,
            data: data.into(),
        }
    }

    /// Creates a file field.
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            mime_type: Some(mime_type.into()),
            data: data.into(),
        }
    }
}

/// Generates a fresh boundary string.
pub fn generate_boundary() -> String {
    format!("RelayBoundary-{:032x}", rand::random::<u128>())
}

/// Encodes `parts` into a multipart body delimited by `boundary`.
///
/// Sections appear in input order, followed by the closing `--{boundary}--` line.
///
/// # Examples
///
/// ```
/// use relaycall::multipart::{encode, MultipartPart};
///
/// let body = encode(&[MultipartPart::text("a", "1")], "XYZ");
/// assert_eq!(
///     &body[..],
///     b"--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--XYZ--\r\n"
/// );
/// ```
pub fn encode(parts: &[MultipartPart], boundary: &str) -> Bytes {
    let mut body = BytesMut::new();

    for part in parts {
        body.put_slice(format!("--{boundary}\r\n").as_bytes());
        body.put_slice(format!("Content-Disposition: form-data; name=\"{}\"", part.name).as_bytes());

        match (&part.file_name, &part.mime_type) {
            (Some(file_name), Some(mime_type)) => {
                body.put_slice(format!("; filename=\"{file_name}\"\r\n").as_bytes());
                body.put_slice(format!("Content-Type: {mime_type}\r\n").as_bytes());
            }
            _ => body.put_slice(b"\r\n"),
        }

        body.put_slice(b"\r\n");
        body.put_slice(&part.data);
        body.put_slice(b"\r\n");
    }

    body.put_slice(format!("--{boundary}--\r\n").as_bytes());
    body.freeze()
}
