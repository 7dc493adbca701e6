//! Artifact layouts for synthesized captures.
//!
//! # Supported Layouts
//!
//! | Layout | Extension | Bytes/Sample | Description |
//! |--------|-----------|--------------|-------------|
//! | Cf32   | anything  | 8            | Raw interleaved little-endian float32 `I0,Q0,I1,Q1,...` |
//! | Npy    | `.npy`    | 8 + header   | NumPy v1.0 array, dtype `<c8`, shape `(n,)` |
//!
//! Both layouts store the same little-endian `f32` pairs; `Npy` prefixes them
//! with a self-describing header so the capture loads directly as a complex
//! array in the NumPy ecosystem.
//!
//! # Example
//!
//! ```rust
//! use iqlab_core::io::ArtifactFormat;
//! use iqlab_core::types::IQSample;
//!
//! let format = ArtifactFormat::from_path("capture.npy");
//! assert_eq!(format, ArtifactFormat::Npy);
//!
//! let samples = vec![IQSample::new(0.5, -0.5)];
//! let mut buffer = Vec::new();
//! format.write_samples(&mut buffer, &samples).unwrap();
//! ```

use super::npy;
use crate::types::IQSample;
use std::io::{self, Read, Write};
use std::path::Path;

/// On-disk layout of a capture artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArtifactFormat {
    /// Raw interleaved complex float32, GNU Radio / USRP compatible
    #[default]
    Cf32,

    /// NumPy `.npy` array of complex64
    Npy,
}

impl ArtifactFormat {
    /// Bytes per I/Q sample in the data section.
    #[inline]
    pub const fn bytes_per_sample(&self) -> usize {
        8 // 4 bytes I + 4 bytes Q in both layouts
    }

    /// Select the layout from an output file name. Only a `.npy` extension
    /// (case-insensitive) selects NumPy; everything else is raw cf32.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("npy") => ArtifactFormat::Npy,
            _ => ArtifactFormat::Cf32,
        }
    }

    /// Write all samples, including the header for `Npy`.
    ///
    /// # Returns
    /// The number of bytes written.
    pub fn write_samples<W: Write>(
        &self,
        writer: &mut W,
        samples: &[IQSample],
    ) -> io::Result<usize> {
        let header_len = match self {
            ArtifactFormat::Cf32 => 0,
            ArtifactFormat::Npy => npy::write_header(writer, samples.len())?,
        };
        let body = to_cf32_bytes(samples);
        writer.write_all(&body)?;
        Ok(header_len + body.len())
    }

    /// Read every sample until end of input.
    ///
    /// For `Cf32` a trailing partial sample is an `InvalidData` error; for
    /// `Npy` the sample count comes from the header.
    pub fn read_samples<R: Read>(&self, reader: &mut R) -> io::Result<Vec<IQSample>> {
        match self {
            ArtifactFormat::Cf32 => {
                let mut data = Vec::new();
                reader.read_to_end(&mut data)?;
                if data.len() % self.bytes_per_sample() != 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "{} bytes is not a whole number of cf32 samples",
                            data.len()
                        ),
                    ));
                }
                Ok(parse_cf32_bytes(&data))
            }
            ArtifactFormat::Npy => {
                let count = npy::read_header(reader)?;
                let mut data = vec![0u8; count * self.bytes_per_sample()];
                reader.read_exact(&mut data)?;
                Ok(parse_cf32_bytes(&data))
            }
        }
    }
}

/// Narrow samples to interleaved little-endian `f32` pairs.
pub fn to_cf32_bytes(samples: &[IQSample]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 8);
    for sample in samples {
        data.extend_from_slice(&(sample.re as f32).to_le_bytes());
        data.extend_from_slice(&(sample.im as f32).to_le_bytes());
    }
    data
}

/// De-interleave little-endian `f32` pairs. Trailing bytes that do not form a
/// whole sample are dropped.
pub fn parse_cf32_bytes(data: &[u8]) -> Vec<IQSample> {
    data.chunks_exact(8)
        .map(|chunk| {
            let re = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64;
            let im = f32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]) as f64;
            IQSample::new(re, im)
        })
        .collect()
}

impl std::fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ArtifactFormat::Cf32 => "cf32",
            ArtifactFormat::Npy => "npy",
        };
        write!(f, "{}", name)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ramp() -> Vec<IQSample> {
        (0..16)
            .map(|i| {
                let phase = i as f64 * 0.3;
                IQSample::new(phase.cos() * 0.9, phase.sin() * 0.9)
            })
            .collect()
    }

    #[test]
    fn test_from_path() {
        assert_eq!(ArtifactFormat::from_path("a/b/capture.iq"), ArtifactFormat::Cf32);
        assert_eq!(ArtifactFormat::from_path("capture.npy"), ArtifactFormat::Npy);
        assert_eq!(ArtifactFormat::from_path("capture.NPY"), ArtifactFormat::Npy);
        assert_eq!(ArtifactFormat::from_path("capture"), ArtifactFormat::Cf32);
        assert_eq!(ArtifactFormat::from_path("capture.npy.bak"), ArtifactFormat::Cf32);
    }

    #[test]
    fn test_cf32_is_interleaved() {
        let samples = vec![IQSample::new(0.5, -0.25), IQSample::new(1.0, 0.0)];
        let mut buffer = Vec::new();
        let written = ArtifactFormat::Cf32.write_samples(&mut buffer, &samples).unwrap();
        assert_eq!(written, 16);

        let floats: Vec<f32> = buffer
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(floats, vec![0.5, -0.25, 1.0, 0.0]);
    }

    #[test]
    fn test_roundtrip_both_layouts() {
        let original = ramp();
        for format in [ArtifactFormat::Cf32, ArtifactFormat::Npy] {
            let mut buffer = Vec::new();
            format.write_samples(&mut buffer, &original).unwrap();
            let decoded = format.read_samples(&mut Cursor::new(buffer)).unwrap();

            assert_eq!(decoded.len(), original.len(), "format: {}", format);
            for (orig, dec) in original.iter().zip(decoded.iter()) {
                // f32 precision is ~7 decimal digits
                assert!((orig.re - dec.re).abs() < 1e-6, "format {}: re", format);
                assert!((orig.im - dec.im).abs() < 1e-6, "format {}: im", format);
            }
        }
    }

    #[test]
    fn test_truncated_cf32_rejected() {
        let mut buffer = to_cf32_bytes(&ramp());
        buffer.pop();
        let err = ArtifactFormat::Cf32
            .read_samples(&mut Cursor::new(buffer))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_display_and_default() {
        assert_eq!(ArtifactFormat::Npy.to_string(), "npy");
        assert_eq!(ArtifactFormat::default().to_string(), "cf32");
    }
}
