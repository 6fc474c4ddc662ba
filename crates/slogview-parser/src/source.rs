//! Loading a log file into memory.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Text encoding of a log file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogEncoding {
    /// Decide from the byte order mark or the byte pattern.
    #[default]
    Auto,
    Utf16le,
    Utf8,
}

impl FromStr for LogEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "").as_str() {
            "auto" => Ok(LogEncoding::Auto),
            "utf16le" | "utf16" => Ok(LogEncoding::Utf16le),
            "utf8" => Ok(LogEncoding::Utf8),
            _ => Err(format!("Unknown log encoding: {}", s)),
        }
    }
}

/// Read a whole log file and decode it to text with `\n` line ends.
pub fn read_log(path: &Path, encoding: LogEncoding) -> Result<String, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(decode_log(&bytes, encoding))
}

/// Decode raw log bytes. Invalid sequences are replaced rather than rejected.
pub fn decode_log(bytes: &[u8], encoding: LogEncoding) -> String {
    let encoding = match encoding {
        LogEncoding::Auto => detect_encoding(bytes),
        forced => forced,
    };

    let text = match encoding {
        LogEncoding::Utf16le => {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    text.trim_start_matches('\u{feff}').replace("\r\n", "\n")
}

fn detect_encoding(bytes: &[u8]) -> LogEncoding {
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return LogEncoding::Utf16le;
    }
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return LogEncoding::Utf8;
    }

    // ASCII-heavy UTF-16LE text has a zero in most high bytes.
    let sample = &bytes[..bytes.len().min(4096)];
    let pairs = sample.len() / 2;
    if pairs == 0 {
        return LogEncoding::Utf8;
    }
    let zero_high = sample.chunks_exact(2).filter(|pair| pair[1] == 0).count();
    if zero_high * 2 > pairs {
        LogEncoding::Utf16le
    } else {
        LogEncoding::Utf8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf16le(text: &str, bom: bool) -> Vec<u8> {
        let mut bytes = Vec::new();
        if bom {
            bytes.extend_from_slice(&[0xFF, 0xFE]);
        }
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_decode_utf16le_with_bom() {
        let bytes = utf16le("line one\r\nline two\r\n", true);
        assert_eq!(decode_log(&bytes, LogEncoding::Auto), "line one\nline two\n");
    }

    #[test]
    fn test_detect_utf16le_without_bom() {
        let bytes = utf16le("$aaaaaaaa 2024-01-01 09:00:00.000 >STC\n", false);
        assert_eq!(detect_encoding(&bytes), LogEncoding::Utf16le);
    }

    #[test]
    fn test_decode_utf8_strips_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("user=\"jdoe\"\r\n".as_bytes());
        assert_eq!(decode_log(&bytes, LogEncoding::Auto), "user=\"jdoe\"\n");
    }

    #[test]
    fn test_forced_encoding_wins() {
        let bytes = "plain".as_bytes();
        assert_eq!(decode_log(bytes, LogEncoding::Utf8), "plain");
    }

    #[test]
    fn test_read_log_missing_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.slog");
        match read_log(&missing, LogEncoding::Auto) {
            Err(SourceError::NotFound(path)) => assert_eq!(path, missing),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("UTF-16LE".parse::<LogEncoding>().unwrap(), LogEncoding::Utf16le);
        assert_eq!("utf8".parse::<LogEncoding>().unwrap(), LogEncoding::Utf8);
        assert!("latin1".parse::<LogEncoding>().is_err());
    }
}
