//! Mixer — sums processed tracks, applies master volume and the hard limiter.

/// A summing mixer that accumulates audio from multiple sources.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
    buffer: Vec<f64>,
}

impl Mixer {
    pub fn new(master_gain: f64) -> Self {
        Mixer {
            master_gain,
            buffer: Vec::new(),
        }
    }

    /// Prepare a buffer of `num_samples` filled with zeros.
    pub fn clear(&mut self, num_samples: usize) {
        self.buffer.clear();
        self.buffer.resize(num_samples, 0.0);
    }

    /// Add a sample at the given index.
    pub fn add(&mut self, index: usize, sample: f64) {
        if let Some(slot) = self.buffer.get_mut(index) {
            *slot += sample;
        }
    }

    /// Consume the mixer, applying master gain and the limiter in place.
    pub fn into_output(self) -> Vec<f64> {
        let gain = self.master_gain;
        let mut buffer = self.buffer;
        for s in buffer.iter_mut() {
            *s = limit(*s * gain);
        }
        buffer
    }
}

/// Hard limiter: clamp into [-1, 1]. NaN is silenced.
pub fn limit(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(-1.0, 1.0) }
}

/// Extend every track with silence to the length of the longest.
pub fn pad_to_longest(tracks: &mut [Vec<f64>]) -> usize {
    let longest = tracks.iter().map(Vec::len).max().unwrap_or(0);
    for track in tracks.iter_mut() {
        track.resize(longest, 0.0);
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        let mut m = Mixer::new(0.8);
        m.clear(128);
        let out = m.into_output();
        assert_eq!(out.len(), 128);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn accumulates_samples() {
        let mut m = Mixer::new(1.0);
        m.clear(4);
        m.add(0, 0.5);
        m.add(0, 0.3);
        m.add(1, -0.25);
        m.add(9, 1.0);
        let out = m.into_output();
        assert!((out[0] - 0.8).abs() < 1e-12);
        assert_eq!(out[1], -0.25);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn limiter_clamps() {
        let mut m = Mixer::new(0.75);
        m.clear(2);
        m.add(0, 100.0);
        m.add(1, -3.0);
        assert_eq!(m.into_output(), vec![1.0, -1.0]);
        assert_eq!(limit(f64::NAN), 0.0);
        assert_eq!(limit(0.3), 0.3);
    }

    #[test]
    fn pads_with_silence() {
        let mut tracks = vec![vec![0.5; 3], vec![0.1; 7], Vec::new()];
        assert_eq!(pad_to_longest(&mut tracks), 7);
        assert!(tracks.iter().all(|t| t.len() == 7));
        assert_eq!(&tracks[0][3..], &[0.0; 4]);
    }
}
