//! Framing for invocation envelopes handed to a child process.
//!
//! ```text
//! +--------+-------------+--------------+------------------+
//! | "KINV" | version u16 | length u32   | JSON payload     |
//! +--------+-------------+--------------+------------------+
//! ```
//!
//! Integers are big-endian. The frame is written to a transient file whose
//! path the child finds in [`ENVELOPE_ENV`]; stdio stays free for the user.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::entities::invocation::InvocationEnvelope;

pub const MAGIC: [u8; 4] = *b"KINV";
pub const WIRE_VERSION: u16 = 1;
/// Environment variable carrying the envelope file path.
pub const ENVELOPE_ENV: &str = "KILN_ENVELOPE";
pub const MAX_PAYLOAD: usize = 16 * 1024 * 1024;

const HEADER_LEN: usize = MAGIC.len() + 2 + 4;

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Failed to access envelope {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Envelope frame truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("Envelope frame has {0} unexpected trailing bytes")]
    TrailingBytes(usize),
    #[error("Not an invocation envelope")]
    BadMagic,
    #[error("Unsupported envelope version {found} (expected {})", WIRE_VERSION)]
    UnsupportedVersion { found: u16 },
    #[error("Envelope payload of {0} bytes exceeds the limit")]
    TooLarge(usize),
    #[error("Invalid envelope payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("{} is not set; this program must be launched by kiln", ENVELOPE_ENV)]
    MissingEnv,
}

pub fn encode(envelope: &InvocationEnvelope) -> Result<Vec<u8>, EnvelopeError> {
    let payload = serde_json::to_vec(envelope)?;
    if payload.len() > MAX_PAYLOAD {
        return Err(EnvelopeError::TooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&MAGIC);
    frame.extend_from_slice(&WIRE_VERSION.to_be_bytes());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

pub fn decode(frame: &[u8]) -> Result<InvocationEnvelope, EnvelopeError> {
    if frame.len() < HEADER_LEN {
        return Err(EnvelopeError::Truncated {
            expected: HEADER_LEN,
            actual: frame.len(),
        });
    }

    let (header, payload) = frame.split_at(HEADER_LEN);
    if header[..4] != MAGIC {
        return Err(EnvelopeError::BadMagic);
    }

    let version = u16::from_be_bytes([header[4], header[5]]);
    if version != WIRE_VERSION {
        return Err(EnvelopeError::UnsupportedVersion { found: version });
    }

    let len = u32::from_be_bytes([header[6], header[7], header[8], header[9]]) as usize;
    if len > MAX_PAYLOAD {
        return Err(EnvelopeError::TooLarge(len));
    }
    if payload.len() < len {
        return Err(EnvelopeError::Truncated {
            expected: HEADER_LEN + len,
            actual: frame.len(),
        });
    }
    if payload.len() > len {
        return Err(EnvelopeError::TrailingBytes(payload.len() - len));
    }

    Ok(serde_json::from_slice(payload)?)
}

pub fn write_file(path: &Path, envelope: &InvocationEnvelope) -> Result<(), EnvelopeError> {
    let frame = encode(envelope)?;
    fs::write(path, frame).map_err(|source| EnvelopeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_file(path: &Path) -> Result<InvocationEnvelope, EnvelopeError> {
    let frame = fs::read(path).map_err(|source| EnvelopeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&frame)
}

/// Read the envelope this process was launched with.
pub fn read_from_env() -> Result<InvocationEnvelope, EnvelopeError> {
    let path = std::env::var_os(ENVELOPE_ENV).ok_or(EnvelopeError::MissingEnv)?;
    read_file(Path::new(&path))
}
