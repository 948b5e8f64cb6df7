use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default;

use crate::dsp::spectrogram::SAMPLE_RATE;
use crate::error::{ResonanceError, Result};

/// §6 decoder contract: `decode(source) -> (samples, sample_rate, channels)`
/// where a conforming implementation guarantees `sample_rate == 22050` and
/// `channels == 1` on return. Ported from the teacher's `AudioProcessor`
/// (probe -> codec registry -> packet loop -> downmix), generalized to
/// resample to the spec's fixed `SAMPLE_RATE` instead of passing through
/// whatever rate the source happened to be encoded at.
pub trait Decoder {
    fn decode(&self, path: &Path) -> Result<Vec<f32>>;
}

#[derive(Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }

    fn decode_to_mono(&self, file: File) -> Result<(Vec<f32>, u32)> {
        let source: Box<dyn MediaSource> = Box::new(file);
        let stream = MediaSourceStream::new(source, Default::default());

        let probe = default::get_probe();
        let probed = probe
            .format(
                &Hint::new(),
                stream,
                &Default::default(),
                &MetadataOptions::default(),
            )
            .map_err(|_| ResonanceError::UnsupportedFormat)?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .first()
            .ok_or(ResonanceError::NoAudioStream)?;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params.sample_rate.ok_or(ResonanceError::NoAudioStream)?;

        let codecs = default::get_codecs();
        let mut decoder = codecs
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|_| ResonanceError::UnsupportedFormat)?;

        let mut samples = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(_)) => break, // EOF
                Err(e) => return Err(ResonanceError::from(e)),
            };

            let decoded = decoder.decode(&packet)?;
            let channels = decoded.spec().channels.count();
            if channels == 0 {
                continue;
            }

            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
            sample_buf.copy_interleaved_ref(decoded);

            for frame in sample_buf.samples().chunks_exact(channels) {
                let mono = frame.iter().sum::<f32>() / channels as f32;
                samples.push(mono);
            }
        }

        if samples.is_empty() {
            return Err(ResonanceError::NoAudioStream);
        }

        Ok((samples, sample_rate))
    }

    /// Linear-interpolation resampler, ported from the teacher's
    /// `resample_linear`. Adequate fidelity here: the pair hasher's
    /// quantization bins (10 Hz / 10 ms) are far coarser than linear
    /// resampling error, so a heavier resampler (e.g. `rubato`) buys
    /// nothing for this pipeline.
    fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
        if from_rate == to_rate {
            return samples.to_vec();
        }
        let ratio = from_rate as f64 / to_rate as f64;
        let new_len = (samples.len() as f64 / ratio) as usize;
        let mut resampled = Vec::with_capacity(new_len);

        for i in 0..new_len {
            let in_idx_float = i as f64 * ratio;
            let in_idx = in_idx_float.floor() as usize;
            let frac = in_idx_float.fract() as f32;

            if in_idx + 1 < samples.len() {
                let p1 = samples[in_idx];
                let p2 = samples[in_idx + 1];
                resampled.push(p1 + frac * (p2 - p1));
            } else if in_idx < samples.len() {
                resampled.push(samples[in_idx]);
            } else {
                break;
            }
        }
        resampled
    }
}

impl Decoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> Result<Vec<f32>> {
        let file = File::open(path)?;
        let (samples, sample_rate) = self.decode_to_mono(file)?;
        Ok(Self::resample_linear(&samples, sample_rate, SAMPLE_RATE))
    }
}
