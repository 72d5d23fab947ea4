/// Loudness strategy applied before quantization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessSettings {
    /// Target loudness is `-loudness_headroom_db` dBFS (RMS).
    pub loudness_headroom_db: f32,
    /// Soft-clip with `tanh` after the gain stage.
    pub loudness_compressor: bool,
    /// Signals with an RMS below this are left untouched.
    pub energy_floor: f32,
}

impl Default for LoudnessSettings {
    fn default() -> Self {
        Self {
            loudness_headroom_db: 14.0,
            loudness_compressor: true,
            energy_floor: 2e-3,
        }
    }
}

/// Applies the loudness gain, the optional compressor, then clamps to
/// `[-1, 1]`. Returns the applied gain in dB.
pub fn normalize_loudness(samples: &mut [f32], settings: &LoudnessSettings) -> f32 {
    let energy = rms(samples);
    let mut gain_db = 0.0;

    if energy >= settings.energy_floor {
        let input_db = 20.0 * energy.log10();
        gain_db = -settings.loudness_headroom_db - input_db;
        let gain = 10f32.powf(gain_db / 20.0);
        for sample in samples.iter_mut() {
            *sample *= gain;
        }
    }

    if settings.loudness_compressor {
        for sample in samples.iter_mut() {
            *sample = sample.tanh();
        }
    }

    for sample in samples.iter_mut() {
        *sample = sample.clamp(-1.0, 1.0);
    }

    gain_db
}

pub(crate) fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum = samples
        .iter()
        .map(|sample| f64::from(*sample) * f64::from(*sample))
        .sum::<f64>();
    (sum / samples.len() as f64).sqrt() as f32
}
