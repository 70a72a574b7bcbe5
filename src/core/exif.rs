use exif::{Field, In, Reader, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub const MAKE_KEY: &str = "EXIF:Make";
pub const MODEL_KEY: &str = "EXIF:Model";
pub const SOFTWARE_KEY: &str = "EXIF:Software";

/// Message the EXIF reader uses when it does not recognize the container at all.
const UNKNOWN_CONTAINER: &str = "Unknown image format";

/// One metadata record: group-qualified field name to its string value.
pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum ExifError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("EXIF parsing error: {0}")]
    Parse(#[from] exif::Error),
}

/// Source of per-file metadata records.
///
/// An extractor may return several records for one file (multi-frame formats);
/// callers that need a single record take the first.
pub trait MetadataExtractor {
    fn extract(&mut self, path: &Path) -> Result<Vec<Metadata>, ExifError>;
}

impl<T: MetadataExtractor + ?Sized> MetadataExtractor for &mut T {
    fn extract(&mut self, path: &Path) -> Result<Vec<Metadata>, ExifError> {
        (**self).extract(path)
    }
}

/// Reads EXIF attributes from image containers (JPEG, TIFF, HEIF, PNG, WebP).
///
/// Holds no state between calls; each extraction opens and drops its own file handle.
pub struct ExifService;

impl ExifService {
    pub fn new() -> Self {
        Self
    }

    /// Extract the primary IFD of `file_path` as a single record.
    ///
    /// A readable file with no EXIF block, or in a container the reader does not
    /// understand (video, screenshots), still yields one empty record. Only I/O
    /// failures and damaged EXIF data are errors.
    pub fn extract_exif(&self, file_path: &Path) -> Result<Vec<Metadata>, ExifError> {
        let file = File::open(file_path)?;
        let mut buf_reader = BufReader::new(file);
        let exif_reader = match Reader::new().read_from_container(&mut buf_reader) {
            Ok(reader) => reader,
            Err(exif::Error::NotFound(container)) => {
                debug!("No EXIF in {} ({})", file_path.display(), container);
                return Ok(vec![Metadata::new()]);
            }
            Err(exif::Error::InvalidFormat(UNKNOWN_CONTAINER)) => {
                debug!("No EXIF reader for {}", file_path.display());
                return Ok(vec![Metadata::new()]);
            }
            Err(e) => return Err(e.into()),
        };

        let record: Metadata = exif_reader
            .fields()
            .filter(|field| field.ifd_num == In::PRIMARY)
            .filter_map(|field| {
                self.field_to_string(field)
                    .map(|value| (format!("EXIF:{}", field.tag), value))
            })
            .collect();

        Ok(vec![record])
    }

    fn field_to_string(&self, field: &Field) -> Option<String> {
        match &field.value {
            Value::Ascii(vec) => vec.first().map(|ascii_val| {
                String::from_utf8_lossy(ascii_val)
                    .trim_end_matches('\0')
                    .to_string()
            }),
            // Opaque blobs such as MakerNote carry nothing usable as text.
            Value::Undefined(..) => None,
            value => Some(format!("{}", value.display_as(field.tag))),
        }
    }
}

impl Default for ExifService {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor for ExifService {
    fn extract(&mut self, path: &Path) -> Result<Vec<Metadata>, ExifError> {
        self.extract_exif(path)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Little-endian TIFF with a single `Make` entry pointing at "Canon\0".
    pub(crate) fn tiff_with_make() -> Vec<u8> {
        let mut bytes = vec![0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&[0x01, 0x00]);
        bytes.extend_from_slice(&[0x0F, 0x01, 0x02, 0x00]);
        bytes.extend_from_slice(&[0x06, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&[0x1A, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(b"Canon\0");
        bytes
    }

    /// 1x1 grayscale PNG: signature, IHDR and IEND, no eXIf chunk.
    pub(crate) fn bare_png() -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D]);
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&[
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x00, 0x00, 0x00, 0x00,
        ]);
        bytes.extend_from_slice(&[0x3A, 0x7E, 0x9B, 0x55]);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(b"IEND");
        bytes.extend_from_slice(&[0xAE, 0x42, 0x60, 0x82]);
        bytes
    }

    /// JPEG with only SOI and EOI markers.
    pub(crate) fn bare_jpeg() -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xD9]
    }

    /// MP4 consisting of a lone `ftyp` box.
    pub(crate) fn isom_mp4() -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x00, 0x18];
        bytes.extend_from_slice(b"ftypisom");
        bytes.extend_from_slice(&[0x00, 0x00, 0x02, 0x00]);
        bytes.extend_from_slice(b"isomiso2");
        bytes
    }

    #[test]
    fn test_extract_exif_no_file() {
        let exif_service = ExifService::new();
        let non_existent = Path::new("/non/existent/file.jpg");

        let result = exif_service.extract_exif(non_existent);
        assert!(matches!(result, Err(ExifError::Io(_))));
    }

    #[test]
    fn test_readable_files_without_exif_yield_one_empty_record() {
        let temp_dir = TempDir::new().unwrap();
        let files = [
            ("screenshot.png", bare_png()),
            ("stripped.jpg", bare_jpeg()),
            ("clip.mp4", isom_mp4()),
            ("notes.jpg", b"This is not an image file".to_vec()),
        ];

        let mut exif_service = ExifService::new();
        for (name, bytes) in files {
            let file_path = temp_dir.path().join(name);
            fs::write(&file_path, bytes).unwrap();

            let records = exif_service.extract(&file_path).unwrap();
            assert_eq!(records, vec![Metadata::new()], "{name}");
        }
    }

    #[test]
    fn test_damaged_exif_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("truncated.tif");
        // TIFF header pointing at an IFD that is not there.
        fs::write(&file_path, [0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00]).unwrap();

        let result = ExifService::new().extract_exif(&file_path);
        assert!(matches!(result, Err(ExifError::Parse(_))));
    }

    #[test]
    fn test_extract_make_from_tiff() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("camera.tif");
        fs::write(&file_path, tiff_with_make()).unwrap();

        let records = ExifService::new().extract_exif(&file_path).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(MAKE_KEY).map(String::as_str), Some("Canon"));
        assert!(!records[0].contains_key(MODEL_KEY));
    }
}
