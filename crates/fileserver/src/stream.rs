//! File streaming with range request support

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use std::io::{ErrorKind, SeekFrom};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::error::AppError;

/// Read buffer size for streamed bodies
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Content type for extensions missing from the table
const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Why a Range header could not be honored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// Not a `bytes=start-end` header
    Malformed,
    /// Well formed but outside the file
    Unsatisfiable,
}

/// Parse a `Range: bytes=START-END` header value
///
/// Supports `bytes=0-499`, `bytes=500-` and the suffix form `bytes=-500`.
/// Only the first range of a multi-range header is considered. Bounds are
/// never clamped: an end at or past `file_size` is unsatisfiable.
///
/// # Returns
/// * `Ok((start, end))` - inclusive byte positions with `start <= end < file_size`
pub fn parse_range(value: &str, file_size: u64) -> Result<(u64, u64), RangeError> {
    let ranges = value
        .trim()
        .strip_prefix("bytes=")
        .ok_or(RangeError::Malformed)?;

    let first = ranges.split(',').next().unwrap_or_default().trim();
    let (start, end) = first.split_once('-').ok_or(RangeError::Malformed)?;
    let (start, end) = (start.trim(), end.trim());

    let parse = |s: &str| s.parse::<u64>().map_err(|_| RangeError::Malformed);

    match (start.is_empty(), end.is_empty()) {
        (true, true) => Err(RangeError::Malformed),
        // bytes=-500 (last 500 bytes)
        (true, false) => {
            let suffix = parse(end)?;
            if suffix == 0 || file_size == 0 {
                return Err(RangeError::Unsatisfiable);
            }
            Ok((file_size.saturating_sub(suffix), file_size - 1))
        }
        (false, open_ended) => {
            let start = parse(start)?;
            if file_size == 0 {
                return Err(RangeError::Unsatisfiable);
            }
            let end = if open_ended { file_size - 1 } else { parse(end)? };
            if start > end || end >= file_size {
                return Err(RangeError::Unsatisfiable);
            }
            Ok((start, end))
        }
    }
}

/// Content type for a video file, by extension
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "webm" => "video/webm",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Stream a file from disk, honoring an optional Range header
///
/// The file is opened and measured at request time. The open handle moves
/// into the response body and is closed when the body finishes or is
/// dropped, e.g. when the client disconnects.
pub async fn serve_file(path: &Path, range_header: Option<&HeaderValue>) -> Result<Response, AppError> {
    let mut file = File::open(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::NotFound("Video not found".to_string()),
        _ => AppError::Internal(format!("Failed to open file: {}", e)),
    })?;

    let metadata = file
        .metadata()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to get file metadata: {}", e)))?;
    if !metadata.is_file() {
        return Err(AppError::NotFound("Video not found".to_string()));
    }
    let file_size = metadata.len();
    let content_type = content_type_for(path);

    let Some(range_header) = range_header else {
        // Full file response
        let body = Body::from_stream(ReaderStream::with_capacity(file, STREAM_CHUNK_SIZE));
        return Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, file_size)
            .header(header::ACCEPT_RANGES, "bytes")
            .body(body)
            .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)));
    };

    let range_str = range_header
        .to_str()
        .map_err(|_| AppError::BadRequest("Invalid range header".to_string()))?;

    let (start, end) = parse_range(range_str, file_size).map_err(|err| match err {
        RangeError::Malformed => AppError::BadRequest(format!("Invalid range format: {}", range_str)),
        RangeError::Unsatisfiable => AppError::RangeNotSatisfiable(file_size),
    })?;

    let content_length = end - start + 1;

    file.seek(SeekFrom::Start(start))
        .await
        .map_err(|e| AppError::Internal(format!("Failed to seek file: {}", e)))?;

    tracing::debug!("Serving bytes {}-{}/{} of {}", start, end, file_size, path.display());

    let stream = ReaderStream::with_capacity(file.take(content_length), STREAM_CHUNK_SIZE);

    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, content_length)
        .header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", start, end, file_size),
        )
        .header(header::ACCEPT_RANGES, "bytes")
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_closed() {
        assert_eq!(parse_range("bytes=0-99", 1000), Ok((0, 99)));
        assert_eq!(parse_range("bytes=999-999", 1000), Ok((999, 999)));
    }

    #[test]
    fn test_parse_range_open_end() {
        assert_eq!(parse_range("bytes=500-", 1000), Ok((500, 999)));
        assert_eq!(parse_range("bytes=0-", 1), Ok((0, 0)));
    }

    #[test]
    fn test_parse_range_suffix() {
        assert_eq!(parse_range("bytes=-100", 1000), Ok((900, 999)));
        assert_eq!(parse_range("bytes=-5000", 1000), Ok((0, 999)));
        assert_eq!(parse_range("bytes=-0", 1000), Err(RangeError::Unsatisfiable));
    }

    #[test]
    fn test_parse_range_first_of_many() {
        assert_eq!(parse_range("bytes=0-9, 20-29", 1000), Ok((0, 9)));
    }

    #[test]
    fn test_parse_range_out_of_bounds_is_not_clamped() {
        assert_eq!(parse_range("bytes=0-1000", 1000), Err(RangeError::Unsatisfiable));
        assert_eq!(parse_range("bytes=1000-", 1000), Err(RangeError::Unsatisfiable));
        assert_eq!(parse_range("bytes=50-10", 1000), Err(RangeError::Unsatisfiable));
        assert_eq!(parse_range("bytes=0-", 0), Err(RangeError::Unsatisfiable));
    }

    #[test]
    fn test_parse_range_malformed() {
        assert_eq!(parse_range("0-99", 1000), Err(RangeError::Malformed));
        assert_eq!(parse_range("bytes=abc", 1000), Err(RangeError::Malformed));
        assert_eq!(parse_range("bytes=a-b", 1000), Err(RangeError::Malformed));
        assert_eq!(parse_range("bytes=-", 1000), Err(RangeError::Malformed));
        assert_eq!(parse_range("items=0-1", 1000), Err(RangeError::Malformed));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("/v/a.mkv")), "video/x-matroska");
        assert_eq!(content_type_for(Path::new("/v/a.MOV")), "video/quicktime");
        assert_eq!(content_type_for(Path::new("/v/a.m4v")), "video/mp4");
        assert_eq!(content_type_for(Path::new("/v/a.webm")), "video/webm");
        assert_eq!(content_type_for(Path::new("/v/a.xyz")), "video/mp4");
        assert_eq!(content_type_for(Path::new("/v/noext")), "video/mp4");
    }

    #[tokio::test]
    async fn test_serve_file_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = serve_file(&dir.path().join("gone.mp4"), None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_serve_file_directory_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = serve_file(dir.path(), None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
