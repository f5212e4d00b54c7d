use std::io::{Read, Write};

use axiom_shared::AxiomError;
use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};

/// Compress fact content for storage. Content is always stored as a zlib
/// stream; identity hashing happens on the text, never on these bytes.
#[must_use]
pub fn compress(text: &str) -> Vec<u8> {
  let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
  encoder
    .write_all(text.as_bytes())
    .and_then(|()| encoder.finish())
    .expect("zlib encode into memory")
}

pub fn decompress(bytes: &[u8]) -> Result<String, AxiomError> {
  let mut decoder = ZlibDecoder::new(bytes);
  let mut out = String::new();
  decoder
    .read_to_string(&mut out)
    .map_err(|e| AxiomError::Decode(format!("corrupt compressed content: {e}")))?;
  Ok(out)
}

/// Sniff the zlib header (0x78 CMF byte plus a valid FCHECK). Used by the
/// startup migration to find legacy plaintext rows.
#[must_use]
pub fn is_zlib(bytes: &[u8]) -> bool {
  if bytes.len() < 2 || bytes[0] != 0x78 {
    return false;
  }
  (u16::from(bytes[0]) << 8 | u16::from(bytes[1])) % 31 == 0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_utf8() {
    let text = "The Curie point of iron is 770 °C — 한국어도 됩니다.";
    assert_eq!(decompress(&compress(text)).unwrap(), text);
  }

  #[test]
  fn compressed_bytes_carry_zlib_header() {
    assert!(is_zlib(&compress("some fact content")));
    assert!(!is_zlib(b"some fact content"));
    assert!(!is_zlib(b""));
  }

  #[test]
  fn garbage_is_a_decode_error() {
    let err = decompress(b"\x01\x02\x03").unwrap_err();
    assert!(matches!(err, AxiomError::Decode(_)));
  }
}
