//! WAV renderer — quantizes a finished render to 16-bit mono PCM.

/// Full-scale 16-bit sample value.
const PCM_PEAK: f64 = 32767.0;

/// Limited samples in [-1, 1] at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Render {
    pub sample_rate: u32,
    pub samples: Vec<f64>,
}

impl Render {
    pub fn new(sample_rate: u32, samples: Vec<f64>) -> Self {
        Render {
            sample_rate,
            samples,
        }
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// `round(s * 32767)`, saturating at ±32767.
    pub fn to_pcm_i16(&self) -> Vec<i16> {
        self.samples.iter().map(|&s| quantize(s)).collect()
    }

    /// Samples narrowed to f32, for AudioWorklet playback.
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| s as f32).collect()
    }

    /// A complete in-memory WAV file (16-bit mono PCM).
    pub fn to_wav_bytes(&self) -> Vec<u8> {
        encode_wav(&self.to_pcm_i16(), self.sample_rate, 1)
    }

    /// Write the render to `path` as a 16-bit mono WAV file.
    #[cfg(feature = "export")]
    pub fn write_wav(&self, path: impl AsRef<std::path::Path>) -> Result<(), crate::error::RiffError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for sample in self.to_pcm_i16() {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

fn quantize(sample: f64) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample * PCM_PEAK).round().clamp(-PCM_PEAK, PCM_PEAK) as i16
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_rounds_and_saturates() {
        let render = Render::new(44100, vec![0.0, 1.0, -1.0, 0.5, 2.0, -7.5, f64::NAN, 1e-6]);
        assert_eq!(
            render.to_pcm_i16(),
            vec![0, 32767, -32767, 16384, 32767, -32767, 0, 0]
        );
    }

    #[test]
    fn wav_header_valid() {
        let render = Render::new(22050, vec![0.25; 10]);
        let wav = render.to_wav_bytes();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        let format = u16::from_le_bytes([wav[20], wav[21]]);
        assert_eq!(format, 1);
        let ch = u16::from_le_bytes([wav[22], wav[23]]);
        assert_eq!(ch, 1);
        let sr = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(sr, 22050);
        let byte_rate = u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]);
        assert_eq!(byte_rate, 44100);
        let bits = u16::from_le_bytes([wav[34], wav[35]]);
        assert_eq!(bits, 16);
    }

    #[test]
    fn wav_size_correct() {
        let render = Render::new(44100, vec![0.1; 4410]);
        let wav = render.to_wav_bytes();
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size, 8820);
        assert_eq!(wav.len(), 44 + 8820);
        let riff_size = u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]);
        assert_eq!(riff_size as usize, wav.len() - 8);
    }

    #[test]
    fn samples_follow_header() {
        let render = Render::new(8000, vec![1.0, -0.5]);
        let wav = render.to_wav_bytes();
        assert_eq!(i16::from_le_bytes([wav[44], wav[45]]), 32767);
        assert_eq!(i16::from_le_bytes([wav[46], wav[47]]), -16384);
        assert!((render.duration() - 2.0 / 8000.0).abs() < 1e-15);
    }
}
