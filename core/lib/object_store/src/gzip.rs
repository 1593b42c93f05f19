use std::io::{Read, Write};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};

pub(crate) fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

pub(crate) fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_round_trips() {
        let payload = br#"{"0":{"dir":"01","hash":["a","b"]}}"#;
        let packed = compress(payload).unwrap();
        assert_ne!(packed, payload.to_vec());
        assert_eq!(decompress(&packed).unwrap(), payload.to_vec());
    }
}
