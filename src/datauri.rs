//! `data:` URIs, the form every image takes inside the editor state.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose;
use tracing::debug;

/// Errors from parsing data URIs or accepting uploads.
#[derive(Debug)]
pub enum DataUriError {
    /// Not of the form `data:<mime>;base64,<payload>`
    Malformed,
    /// The payload is not valid base64
    Base64(base64::DecodeError),
    /// The bytes are not an image we can decode
    NotAnImage(String),
    /// Re-encoding failed
    Encode(String),
}

impl std::fmt::Display for DataUriError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed data URI"),
            Self::Base64(err) => write!(f, "invalid base64 payload: {err}"),
            Self::NotAnImage(err) => write!(f, "not a decodable image: {err}"),
            Self::Encode(err) => write!(f, "failed to re-encode image: {err}"),
        }
    }
}

impl std::error::Error for DataUriError {}

/// A parsed base64 data URI, borrowing from the source string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataUri<'a> {
    /// eg `image/png`
    pub mime_type: &'a str,
    /// base64 text, not decoded
    pub data: &'a str,
}

impl<'a> DataUri<'a> {
    /// Splits `data:<mime>;base64,<payload>`.
    pub fn parse(uri: &'a str) -> Result<Self, DataUriError> {
        let rest = uri.strip_prefix("data:").ok_or(DataUriError::Malformed)?;
        let (header, data) = rest.split_once(',').ok_or(DataUriError::Malformed)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(DataUriError::Malformed)?;
        if mime_type.is_empty() {
            return Err(DataUriError::Malformed);
        }
        Ok(Self { mime_type, data })
    }

    /// Decodes the payload.
    pub fn bytes(&self) -> Result<Vec<u8>, DataUriError> {
        general_purpose::STANDARD
            .decode(self.data.trim())
            .map_err(DataUriError::Base64)
    }
}

/// Builds `data:<mime>;base64,<payload>` from raw bytes.
pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(bytes)
    )
}

/// PNG data URI around an already base64-encoded payload.
pub fn png_from_base64(data: &str) -> String {
    format!("data:image/png;base64,{data}")
}

/// Checks that an upload is an image and turns it into a data URI. PNG and
/// JPEG are kept byte for byte, anything else decodable is re-encoded as PNG.
pub fn normalize_upload(bytes: &[u8]) -> Result<String, DataUriError> {
    if bytes.len() < 4 {
        debug!("Upload is too short");
        return Err(DataUriError::NotAnImage("too short".to_string()));
    }

    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| {
            debug!("Failed to guess image format: {}", err);
            DataUriError::NotAnImage(err.to_string())
        })?;
    let format = reader.format();
    let decoded = reader.decode().map_err(|err| {
        debug!("Failed to decode image: {}", err);
        DataUriError::NotAnImage(err.to_string())
    })?;

    match format {
        Some(image::ImageFormat::Png) => Ok(encode("image/png", bytes)),
        Some(image::ImageFormat::Jpeg) => Ok(encode("image/jpeg", bytes)),
        _ => {
            let mut output = Vec::new();
            decoded
                .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
                .map_err(|err| DataUriError::Encode(err.to_string()))?;
            Ok(encode("image/png", &output))
        }
    }
}

#[cfg(test)]
pub(crate) fn tiny_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .expect("encode png");
    out
}
