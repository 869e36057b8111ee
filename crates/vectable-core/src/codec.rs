//! Binary embedding codec.
//!
//! Layout: each component as an IEEE-754 double, little-endian, concatenated
//! in index order. No header or length prefix; the component count is the
//! byte length divided by 8.

use vectable_types::error::FormatError;

const COMPONENT_BYTES: usize = std::mem::size_of::<f64>();

pub fn encode(embedding: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * COMPONENT_BYTES);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

pub fn decode(bytes: &[u8]) -> Result<Vec<f64>, FormatError> {
    if bytes.len() % COMPONENT_BYTES != 0 {
        return Err(FormatError::InvalidLength(bytes.len()));
    }

    Ok(bytes
        .chunks_exact(COMPONENT_BYTES)
        .map(|chunk| {
            let mut raw = [0u8; COMPONENT_BYTES];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let bytes = encode(&[1.0, -2.5]);
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..8], &1.0f64.to_le_bytes());
        assert_eq!(&bytes[8..], &(-2.5f64).to_le_bytes());
    }

    #[test]
    fn test_round_trip_preserves_bits() {
        let embedding = vec![
            0.0,
            -0.0,
            1.0 / 3.0,
            f64::MIN_POSITIVE,
            f64::MAX,
            f64::INFINITY,
            -1e-300,
        ];
        let decoded = decode(&encode(&embedding)).unwrap();
        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&decoded), bits(&embedding));
    }

    #[test]
    fn test_round_trip_empty() {
        assert!(encode(&[]).is_empty());
        assert_eq!(decode(&[]).unwrap(), Vec::<f64>::new());
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let mut bytes = encode(&[1.0, 2.0]);
        bytes.pop();
        assert_eq!(decode(&bytes), Err(FormatError::InvalidLength(15)));
        assert_eq!(decode(&[0u8; 3]), Err(FormatError::InvalidLength(3)));
    }
}
