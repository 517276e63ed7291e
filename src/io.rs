//! Adapter boundary (§4.9, ambient): decodes WAV/MP3/FLAC/OGG/AAC into an
//! [`AudioSource`] the core's preprocessor (C2) consumes. This module is the
//! only place in the crate that knows about container formats; everything
//! downstream works in decoded `f32` samples.
//!
//! Grounded directly on the teacher's `audio/loader.rs`: WAV goes through
//! `hound` (most reliable for PCM), everything else goes through
//! `symphonia`'s probe + decode pipeline.

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{BeatParserError, Result};

/// Decoded audio, prior to canonicalization by C2: may be multi-channel and
/// at an arbitrary sample rate.
#[derive(Debug, Clone)]
pub struct AudioSource {
    /// Interleaved samples (one value per channel per frame).
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    pub format: AudioFormat,
}

/// Container/codec metadata, carried through to `ParseResult` when the
/// caller asks for it.
#[derive(Debug, Clone)]
pub struct AudioFormat {
    pub extension: String,
    pub bit_depth: Option<u16>,
    pub compression: Option<String>,
}

const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a", "aac"];

pub fn is_format_supported(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension.to_lowercase().as_str())
}

/// Load an audio file, dispatching on extension.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<AudioSource> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "wav" => load_wav(path),
        "mp3" | "flac" | "ogg" | "m4a" | "aac" => load_with_symphonia(
            Box::new(File::open(path)?),
            Some(extension.as_str()),
        ),
        _ => Err(BeatParserError::UnsupportedFormat { format: extension }),
    }
}

/// Decode an in-memory byte buffer for `parse_buffer`'s raw-bytes variant.
/// `hint_extension` is the caller-declared extension used only to steer the
/// probe; an unrecognized header for that extension is a decode failure,
/// surfaced as `InvalidInput` per §4.1.
pub fn load_buffer(bytes: Vec<u8>, hint_extension: &str) -> Result<AudioSource> {
    let extension = hint_extension.to_lowercase();
    if !is_format_supported(&extension) {
        return Err(BeatParserError::UnsupportedFormat { format: extension });
    }
    if extension == "wav" {
        let cursor = Cursor::new(bytes);
        return load_wav_reader(cursor, "wav".to_string());
    }
    load_with_symphonia(Box::new(Cursor::new(bytes)), Some(extension.as_str()))
}

fn load_wav<P: AsRef<Path>>(path: P) -> Result<AudioSource> {
    let path = path.as_ref();
    let file = File::open(path)?;
    load_wav_reader(file, "wav".to_string())
}

fn load_wav_reader<R: std::io::Read + 'static>(reader: R, extension: String) -> Result<AudioSource> {
    let reader = hound::WavReader::new(reader)
        .map_err(|e| BeatParserError::invalid_input(format!("malformed wav header: {e}")))?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels;
    let bit_depth = spec.bits_per_sample;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| BeatParserError::invalid_input(format!("malformed wav samples: {e}")))?,
        hound::SampleFormat::Int => {
            let raw: std::result::Result<Vec<i32>, _> = reader.into_samples().collect();
            raw.map_err(|e| BeatParserError::invalid_input(format!("malformed wav samples: {e}")))?
                .into_iter()
                .map(|s| int_to_float(s, bit_depth))
                .collect()
        }
    };

    Ok(AudioSource {
        samples,
        sample_rate,
        channels,
        format: AudioFormat {
            extension,
            bit_depth: Some(bit_depth),
            compression: None,
        },
    })
}

fn load_with_symphonia(
    source: Box<dyn symphonia::core::io::MediaSource>,
    extension_hint: Option<&str>,
) -> Result<AudioSource> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension_hint {
        hint.with_extension(ext);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| BeatParserError::invalid_input(format!("could not probe audio container: {e}")))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| BeatParserError::invalid_input("no decodable audio track found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| BeatParserError::invalid_input("no sample rate in stream"))?;

    let channels = codec_params
        .channels
        .ok_or_else(|| BeatParserError::invalid_input("no channel layout in stream"))?
        .count() as u16;

    let bits_per_sample = codec_params.bits_per_sample;
    let codec_type = codec_params.codec;

    let dec_opts: DecoderOptions = Default::default();
    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &dec_opts)
        .map_err(|e| BeatParserError::invalid_input(format!("no decoder for codec: {e}")))?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(_)) => break,
            Err(_) => break,
        };

        while !format.metadata().is_latest() {
            format.metadata().pop();
        }

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => convert_audio_buffer_to_f32(&decoded, &mut samples),
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(_) => break,
        }
    }

    if samples.is_empty() {
        return Err(BeatParserError::invalid_input("decoded zero samples"));
    }

    Ok(AudioSource {
        samples,
        sample_rate,
        channels,
        format: AudioFormat {
            extension: extension_hint.unwrap_or("unknown").to_string(),
            bit_depth: bits_per_sample.map(|b| b as u16),
            compression: Some(format!("{codec_type:?}")),
        },
    })
}

fn int_to_float(sample: i32, bit_depth: u16) -> f32 {
    match bit_depth {
        8 => (sample as f32 - 128.0) / 128.0,
        16 => sample as f32 / 32768.0,
        24 => sample as f32 / 8_388_608.0,
        32 => sample as f32 / 2_147_483_648.0,
        _ => sample as f32 / 32768.0,
    }
}

fn convert_audio_buffer_to_f32(buffer: &AudioBufferRef, output: &mut Vec<f32>) {
    macro_rules! interleave {
        ($buf:expr, $convert:expr) => {{
            let channels = $buf.spec().channels.count();
            let frames = $buf.capacity();
            for frame_idx in 0..frames {
                for ch in 0..channels {
                    let channel_buf = $buf.chan(ch);
                    if frame_idx < channel_buf.len() {
                        output.push($convert(channel_buf[frame_idx]));
                    }
                }
            }
        }};
    }

    match buffer {
        AudioBufferRef::F32(buf) => interleave!(buf, |s: f32| s),
        AudioBufferRef::F64(buf) => interleave!(buf, |s: f64| s as f32),
        AudioBufferRef::S32(buf) => interleave!(buf, |s: i32| s as f32 / 2_147_483_648.0),
        AudioBufferRef::S16(buf) => interleave!(buf, |s: i16| s as f32 / 32768.0),
        _ => {
            tracing::warn!("unsupported audio buffer sample format, skipping packet");
        }
    }
}
