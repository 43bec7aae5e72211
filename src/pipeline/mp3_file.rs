// An audio asset: the original file name plus its raw bytes. Despite the name
// it holds whatever was dropped on the pad (mp3, wav, ogg...), the decoder
// sorts that out later.

use std::path::Path;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::record::FileRecord;
use crate::errors::BoardError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mp3File {
    name: String,
    data: Arc<[u8]>, // shared, never mutated
}

impl Mp3File {
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self { name: name.into(), data: data.into() }
    }

    pub fn read(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    // lower-cased extension of the original file name, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("mp3") => "audio/mpeg",
            Some("wav") => "audio/wav",
            Some("ogg") => "audio/ogg",
            Some("flac") => "audio/flac",
            Some("m4a") | Some("aac") | Some("mp4") => "audio/mp4",
            _ => "application/octet-stream",
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), BASE64.encode(&self.data))
    }

    pub fn to_record(&self) -> FileRecord {
        FileRecord { name: self.name.clone(), data: self.to_data_uri() }
    }

    // accepts a full data uri or a bare base64 payload
    pub fn from_record(record: &FileRecord) -> Result<Self, BoardError> {
        let payload = match record.data.strip_prefix("data:") {
            Some(rest) => {
                let (meta, payload) = rest.split_once(',').ok_or_else(|| {
                    BoardError::InvalidFormat(format!("malformed data uri for {}", record.name))
                })?;
                if !meta.ends_with(";base64") {
                    return Err(BoardError::InvalidFormat(format!(
                        "data uri for {} is not base64",
                        record.name
                    )));
                }
                payload
            }
            None => record.data.as_str(),
        };
        let bytes = BASE64.decode(payload.trim()).map_err(|e| {
            BoardError::InvalidFormat(format!("bad audio data for {}: {e}", record.name))
        })?;
        Ok(Self::new(record.name.clone(), bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_carries_the_mime_type() {
        let file = Mp3File::new("Airhorn.MP3", vec![1u8, 2, 3]);
        assert_eq!(file.extension().as_deref(), Some("mp3"));
        assert_eq!(file.to_data_uri(), "data:audio/mpeg;base64,AQID");
    }

    #[test]
    fn reads_back_uri_or_bare_base64() {
        let file = Mp3File::new("a.wav", vec![9u8; 10]);
        assert_eq!(Mp3File::from_record(&file.to_record()).unwrap(), file);

        let bare = FileRecord { name: "a.wav".into(), data: BASE64.encode([9u8; 10]) };
        assert_eq!(Mp3File::from_record(&bare).unwrap(), file);
    }

    #[test]
    fn rejects_broken_payloads() {
        let not_b64 = FileRecord { name: "x.mp3".into(), data: "data:audio/mpeg;base64,@@@".into() };
        assert!(matches!(Mp3File::from_record(&not_b64), Err(BoardError::InvalidFormat(_))));

        let no_comma = FileRecord { name: "x.mp3".into(), data: "data:audio/mpeg;base64".into() };
        assert!(matches!(Mp3File::from_record(&no_comma), Err(BoardError::InvalidFormat(_))));

        let plain = FileRecord { name: "x.mp3".into(), data: "data:text/plain,hello".into() };
        assert!(matches!(Mp3File::from_record(&plain), Err(BoardError::InvalidFormat(_))));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clap.wav");
        std::fs::write(&path, b"RIFF").unwrap();
        let file = Mp3File::read(&path).unwrap();
        assert_eq!(file.name(), "clap.wav");
        assert_eq!(file.bytes(), b"RIFF");
    }
}
