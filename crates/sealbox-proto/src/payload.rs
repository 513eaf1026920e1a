//! CBOR-encoded plaintext bundle.
//!
//! The whole secret (message plus attachments) is serialized to one blob
//! before encryption so that a single AEAD pass authenticates everything.
//! We chose CBOR over alternatives because it's self-describing (field names
//! embedded), compact, and doesn't need code generation.
//!
//! # Invariants
//!
//! - Round-trip: `unpack(pack(p)) == p` for every payload.
//! - File order is preserved (insertion order is significant for display).
//! - `unpack` fails closed with [`ProtoError::MalformedPayload`] on corrupt
//!   or foreign input; it never returns partial data.

use serde::{Deserialize, Serialize};

use crate::errors::{ProtoError, Result};

/// A named file attachment.
///
/// Contents are raw bytes; the codec never inspects or transforms them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// File name as supplied by the sender (display only, not a path).
    pub name: String,
    /// Byte-exact file contents.
    pub content: Vec<u8>,
}

impl FileEntry {
    /// Create a file entry from a name and contents.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), content: content.into() }
    }
}

/// The plaintext bundle: one message plus ordered attachments.
///
/// Never persisted in this form; it exists only in the sender's and
/// recipient's environments around the encrypt/decrypt boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Payload {
    /// The secret message text.
    pub message: String,
    /// File attachments in sender-supplied order.
    pub files: Vec<FileEntry>,
}

impl Payload {
    /// Create a payload with no attachments.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self { message: message.into(), files: Vec::new() }
    }

    /// Total plaintext size in bytes: message bytes plus all file contents.
    ///
    /// This is the quantity compared against the configured size limit, and
    /// it is computed without serializing (the limit check must run before
    /// any codec or crypto work).
    pub fn size(&self) -> u64 {
        let files: u64 = self.files.iter().map(|f| f.content.len() as u64).sum();
        self.message.len() as u64 + files
    }

    /// Serialize the bundle to a single CBOR blob.
    ///
    /// # Errors
    ///
    /// - [`ProtoError::PayloadEncode`] if CBOR serialization fails
    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| ProtoError::PayloadEncode(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a blob produced by [`Payload::pack`]. Exact inverse.
    ///
    /// # Errors
    ///
    /// - [`ProtoError::MalformedPayload`] if the bytes are not a valid
    ///   CBOR-encoded payload
    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| ProtoError::MalformedPayload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_message_only() {
        let payload = Payload::message_only("the launch code is 0000");
        let blob = payload.pack().unwrap();
        assert_eq!(Payload::unpack(&blob).unwrap(), payload);
    }

    #[test]
    fn round_trip_with_files() {
        let payload = Payload {
            message: "see attachments".to_string(),
            files: vec![
                FileEntry::new("a.txt", b"alpha".to_vec()),
                FileEntry::new("b.bin", vec![0u8, 255, 127, 3]),
            ],
        };
        let blob = payload.pack().unwrap();
        assert_eq!(Payload::unpack(&blob).unwrap(), payload);
    }

    #[test]
    fn round_trip_empty_payload() {
        let payload = Payload::default();
        let blob = payload.pack().unwrap();
        assert_eq!(Payload::unpack(&blob).unwrap(), payload);
    }

    #[test]
    fn file_order_is_preserved() {
        let names = ["z", "a", "m", "q"];
        let payload = Payload {
            message: String::new(),
            files: names.iter().map(|n| FileEntry::new(*n, b"x".to_vec())).collect(),
        };

        let decoded = Payload::unpack(&payload.pack().unwrap()).unwrap();
        let decoded_names: Vec<&str> = decoded.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(decoded_names, names);
    }

    #[test]
    fn unicode_names_and_message_survive() {
        let payload = Payload {
            message: "pässwörd: ¡secreto! \u{1f512}".to_string(),
            files: vec![FileEntry::new("日本語.txt", b"bytes".to_vec())],
        };
        let decoded = Payload::unpack(&payload.pack().unwrap()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn unpack_rejects_garbage() {
        let result = Payload::unpack(b"definitely not cbor");
        assert!(matches!(result, Err(ProtoError::MalformedPayload(_))));
    }

    #[test]
    fn unpack_rejects_truncated_blob() {
        let payload = Payload {
            message: "hello".to_string(),
            files: vec![FileEntry::new("f", vec![1u8; 64])],
        };
        let blob = payload.pack().unwrap();

        let result = Payload::unpack(&blob[..blob.len() / 2]);
        assert!(matches!(result, Err(ProtoError::MalformedPayload(_))));
    }

    #[test]
    fn unpack_rejects_wrong_shape() {
        // Valid CBOR, but an integer rather than a payload map.
        let mut blob = Vec::new();
        ciborium::into_writer(&42u32, &mut blob).unwrap();

        let result = Payload::unpack(&blob);
        assert!(matches!(result, Err(ProtoError::MalformedPayload(_))));
    }

    #[test]
    fn size_counts_message_and_files() {
        let payload = Payload {
            message: "12345".to_string(),
            files: vec![
                FileEntry::new("a", vec![0u8; 10]),
                FileEntry::new("b", vec![0u8; 20]),
            ],
        };
        assert_eq!(payload.size(), 35);
    }

    #[test]
    fn size_ignores_file_names() {
        // The limit tracks content bytes; names are bounded metadata.
        let payload = Payload {
            message: String::new(),
            files: vec![FileEntry::new("a".repeat(1000), Vec::new())],
        };
        assert_eq!(payload.size(), 0);
    }
}
