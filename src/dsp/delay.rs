//! Feedback delay line — fixed-length circular buffer.

/// A mono delay line whose length is fixed at construction.
///
/// Each call reads the oldest sample, overwrites it with
/// `input + delayed * feedback`, and advances the write index.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f64>,
    index: usize,
    feedback: f64,
}

impl DelayLine {
    /// Create a line holding exactly `length` samples.
    pub fn new(length: usize, feedback: f64) -> Self {
        DelayLine {
            buffer: vec![0.0; length],
            index: 0,
            feedback,
        }
    }

    /// Create a line of `round(delay_time * sample_rate)` samples.
    pub fn with_time(delay_time: f64, sample_rate: f64, feedback: f64) -> Self {
        let length = (delay_time.max(0.0) * sample_rate).round() as usize;
        Self::new(length, feedback)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Push one sample and return the delayed (wet) sample. A zero-length
    /// line never echoes and always returns `0.0`.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let Some(slot) = self.buffer.get_mut(self.index) else {
            return 0.0;
        };
        let delayed = *slot;
        *slot = input + delayed * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        delayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_from_time() {
        let line = DelayLine::with_time(0.35, 44100.0, 0.4);
        assert_eq!(line.len(), 15435);
        let line = DelayLine::with_time(0.363, 44100.0, 0.3);
        assert_eq!(line.len(), 16008);
    }

    #[test]
    fn impulse_round_trip() {
        let n = 64;
        let feedback = 0.4;
        let mut line = DelayLine::new(n, feedback);

        for _ in 0..n {
            assert_eq!(line.process(0.0), 0.0);
        }
        // Impulse goes in; nothing comes out for the next N - 1 steps.
        assert_eq!(line.process(1.0), 0.0);
        for _ in 1..n {
            assert_eq!(line.process(0.0), 0.0);
        }
        // N steps after the impulse it emerges, and `feedback * impulse` is
        // written back in its place.
        let echo = line.process(0.0);
        assert!((echo - 1.0).abs() < 1e-12);
        for _ in 1..n {
            assert_eq!(line.process(0.0), 0.0);
        }
        let second = line.process(0.0);
        assert!((second - feedback).abs() < 1e-12, "recirculated echo {second}");
    }

    #[test]
    fn zero_feedback_single_echo() {
        let mut line = DelayLine::new(10, 0.0);
        line.process(1.0);
        let mut outputs = Vec::new();
        for _ in 0..30 {
            outputs.push(line.process(0.0));
        }
        assert_eq!(outputs.iter().filter(|&&s| s != 0.0).count(), 1);
        assert_eq!(outputs[9], 1.0);
    }

    #[test]
    fn zero_length_is_silent() {
        let mut line = DelayLine::with_time(0.0, 44100.0, 0.5);
        assert!(line.is_empty());
        for _ in 0..10 {
            assert_eq!(line.process(1.0), 0.0);
        }
    }
}
