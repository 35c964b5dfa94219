//! The module contains [FfmpegBackend], a [FrameBackend] that can decode
//! frames from a video in almost any kind of video file format (using FFmpeg).

use std::path::Path;

use ctor::ctor;

use ffmpeg::codec::Context as FFmpegCodecContext;
use ffmpeg::codec::decoder::Video as FFmpegVideoDecoder;
use ffmpeg::format::Pixel as FFmpegPixelFormat;
use ffmpeg::format::context::Input as FFmpegInputFormatContext;
use ffmpeg::format::stream::Stream as FFmpegStream;
use ffmpeg::frame::Video as FFmpegVideoFrame;
use ffmpeg::media::Type as FFmpegMediaType;
use ffmpeg::software::scaling::Context as FFmpegScalingContext;
use ffmpeg::software::scaling::flag::Flags as FFmpegScalingFlags;
use ffmpeg_next as ffmpeg;

use super::open_error;
use crate::backend::{
    BackendError, BackendStats, DecodeError, FrameBackend, IntoBackendError, IntoDecodeError,
};
use crate::frame::{Dimensions, Frame, Pixel};
use crate::registry::BackendRegistry;

/// Requests at most this many frames past the decoder's position are reached
/// by decoding forward instead of seeking.
const MAX_FORWARD_DECODE: usize = 48;

/// Microseconds per second (FFmpeg's `AV_TIME_BASE`).
const SEEK_TIME_BASE: f64 = 1_000_000.0;

/// A [FrameBackend] that decodes frames from a video file using FFmpeg.
///
/// Frames are decoded on request. Reading frames in order only ever decodes
/// forward, anything else seeks to the closest preceding keyframe and decodes
/// forward from there.
pub struct FfmpegBackend {
    input_context: FFmpegInputFormatContext,
    decoder: FFmpegVideoDecoder,
    scaler: RgbaScaler,
    video_stream_index: usize,
    /// Seconds per timestamp tick.
    time_base: f64,
    start_time: i64,
    stats: BackendStats,
    /// The index of the frame the decoder will produce next, if known.
    next_index: Option<usize>,
    stream_over: bool,
}

impl FfmpegBackend {
    /// The name this backend is registered under.
    pub const NAME: &'static str = "ffmpeg";

    /// Open the video file at `path`. The video stream's own frame rate is
    /// used when it has one, otherwise `frame_rate` is.
    pub fn open<P: AsRef<Path>>(path: P, frame_rate: f64) -> Result<Self, BackendError> {
        Self::open_impl(path.as_ref(), frame_rate)
    }

    fn open_impl(path: &Path, frame_rate: f64) -> Result<Self, BackendError> {
        let input_context = ffmpeg::format::input(path).map_err(|e| match e {
            ffmpeg::Error::InvalidData => BackendError::UnsupportedSource(path.display().to_string()),
            e => open_error(path, e),
        })?;

        let video_stream = input_context
            .streams()
            .best(FFmpegMediaType::Video)
            .ok_or_else(|| open_error(path, "no video stream was found"))?;
        let video_stream_index = video_stream.index();

        let decoder = FFmpegCodecContext::from_parameters(video_stream.parameters())?
            .decoder()
            .video()?;

        let stats = Self::stream_stats(&input_context, &video_stream, &decoder, frame_rate)
            .ok_or_else(|| {
                open_error(
                    path,
                    format!("bad frame size {}x{}", decoder.width(), decoder.height()),
                )
            })?;

        let time_base = f64::from(video_stream.time_base());
        let start_time = video_stream.start_time().max(0);
        let scaler = RgbaScaler::new(decoder.format(), stats.dimensions)?;

        Ok(Self {
            input_context,
            decoder,
            scaler,
            video_stream_index,
            time_base,
            start_time,
            stats,
            next_index: Some(0),
            stream_over: false,
        })
    }

    fn stream_stats(
        input_context: &FFmpegInputFormatContext,
        video_stream: &FFmpegStream,
        decoder: &FFmpegVideoDecoder,
        fallback_fps: f64,
    ) -> Option<BackendStats> {
        let fps_frac = video_stream.avg_frame_rate();
        let fps = if fps_frac.numerator() > 0 && fps_frac.denominator() > 0 {
            f64::from(fps_frac)
        } else {
            fallback_fps
        };

        // Containers don't always record a frame count, in which case it's
        // estimated from the duration.
        let frame_count = if video_stream.frames() > 0 {
            video_stream.frames() as usize
        } else if video_stream.duration() > 0 {
            let seconds = video_stream.duration() as f64 * f64::from(video_stream.time_base());
            (seconds * fps).round() as usize
        } else {
            let seconds = input_context.duration().max(0) as f64 / SEEK_TIME_BASE;
            (seconds * fps).round() as usize
        };

        let dimensions = Dimensions::new(decoder.width() as usize, decoder.height() as usize)?;

        Some(BackendStats {
            fps,
            frame_count,
            dimensions,
        })
    }

    /// Register this backend under [Self::NAME].
    pub fn register(registry: &mut BackendRegistry) {
        let result = registry.register(Self::NAME, |path: &Path, frame_rate: f64| {
            Self::open(path, frame_rate).map(|backend| Box::new(backend) as Box<dyn FrameBackend>)
        });

        if let Err(e) = result {
            log::error!("{e}");
        }
    }

    /// Move the decoder to the keyframe at or before frame `n`.
    fn seek_to(&mut self, n: usize) -> Result<(), DecodeError> {
        let start_seconds = self.start_time as f64 * self.time_base;
        let target_seconds = start_seconds + n as f64 / self.stats.fps;
        let timestamp = (target_seconds * SEEK_TIME_BASE) as i64;

        log::trace!("Seeking to frame {n} ({target_seconds:.3}s).");

        self.input_context.seek(timestamp, ..timestamp)?;
        self.decoder.flush();
        self.next_index = None;
        self.stream_over = false;

        Ok(())
    }

    /// Receive the next decoded frame, feeding packets into the decoder as
    /// needed. [None] is returned once the stream is over.
    fn next_ffmpeg_frame(&mut self) -> Result<Option<FFmpegVideoFrame>, DecodeError> {
        let mut decoded = FFmpegVideoFrame::empty();

        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return Ok(Some(decoded));
            }

            if self.stream_over {
                return Ok(None);
            }

            // The packet iterator mutates `input_context`, not its own state,
            // so it can be re-created for every packet.
            let mut packets = self.input_context.packets();

            loop {
                let Some((stream, packet)) = packets.next() else {
                    self.decoder.send_eof()?;
                    self.stream_over = true;
                    break;
                };

                if stream.index() == self.video_stream_index {
                    self.decoder.send_packet(&packet)?;
                    break;
                }
            }
        }
    }

    /// The frame index of a decoded frame, based on its timestamp.
    fn index_of(&self, decoded: &FFmpegVideoFrame) -> Option<usize> {
        let timestamp = decoded.timestamp().or(decoded.pts())?;
        let seconds = (timestamp - self.start_time) as f64 * self.time_base;

        Some((seconds * self.stats.fps).round().max(0.0) as usize)
    }

    fn to_frame(&mut self, decoded: &FFmpegVideoFrame) -> Result<Frame, DecodeError> {
        let dimensions = self.stats.dimensions;
        let rgba = self.scaler.scale(decoded)?;

        // Rows can be padded, so only the first `width` pixels of each row
        // are copied.
        let row_len = dimensions.width() * size_of::<Pixel>();
        let stride = rgba.stride(0);
        let mut data = Vec::with_capacity(dimensions.area() * size_of::<Pixel>());
        for row in rgba.data(0).chunks(stride).take(dimensions.height()) {
            data.extend_from_slice(row.get(..row_len).unwrap_or(row));
        }

        Frame::from_rgba_bytes(&data, dimensions).map_err(|e| DecodeError::Failed(Box::new(e)))
    }
}

impl FrameBackend for FfmpegBackend {
    fn stats(&self) -> BackendStats {
        self.stats
    }

    fn decode_frame(&mut self, n: usize) -> Result<Frame, DecodeError> {
        if n >= self.stats.frame_count {
            return Err(DecodeError::OutOfRange {
                index: n,
                frame_count: self.stats.frame_count,
            });
        }

        if !decodes_forward(self.next_index, n) {
            self.seek_to(n)?;
        }

        while let Some(decoded) = self.next_ffmpeg_frame()? {
            // Frames without timestamps are counted from the last known one.
            let index = self
                .index_of(&decoded)
                .or(self.next_index)
                .unwrap_or(n);
            self.next_index = Some(index + 1);

            if index >= n {
                return self.to_frame(&decoded);
            }
        }

        Err(DecodeError::from(format!(
            "The video stream ended before frame {n}."
        )))
    }
}

/// Whether frame `n` is reached by decoding forward from `next_index` (the
/// frame the decoder will produce next) rather than by seeking.
fn decodes_forward(next_index: Option<usize>, n: usize) -> bool {
    next_index.is_some_and(|next| n >= next && n - next <= MAX_FORWARD_DECODE)
}

/// Converts decoded frames to RGBA. Frames that are already RGBA are passed
/// through untouched.
struct RgbaScaler(Option<(FFmpegScalingContext, FFmpegVideoFrame)>);

impl RgbaScaler {
    fn new(format: FFmpegPixelFormat, dimensions: Dimensions) -> Result<Self, ffmpeg::Error> {
        if format == FFmpegPixelFormat::RGBA {
            return Ok(Self(None));
        }

        let (width, height) = (dimensions.width() as u32, dimensions.height() as u32);
        let scaler = FFmpegScalingContext::get(
            format,
            width,
            height,
            FFmpegPixelFormat::RGBA,
            width,
            height,
            FFmpegScalingFlags::BILINEAR,
        )?;

        Ok(Self(Some((scaler, FFmpegVideoFrame::empty()))))
    }

    fn scale<'a>(
        &'a mut self,
        decoded: &'a FFmpegVideoFrame,
    ) -> Result<&'a FFmpegVideoFrame, ffmpeg::Error> {
        match self.0.as_mut() {
            Some((scaler, rgba)) => {
                scaler.run(decoded, rgba)?;
                Ok(rgba)
            }
            None => Ok(decoded),
        }
    }
}

/// SAFETY: FFmpeg's scaling context (aliased [FFmpegScalingContext] here) *is*
/// safe to send between threads, `ffmpeg_next` just doesn't mark it [Send].
/// See https://github.com/zmwangx/rust-ffmpeg/issues/252
unsafe impl Send for RgbaScaler {}

impl IntoDecodeError for ffmpeg::Error {}

impl IntoBackendError for ffmpeg::Error {}

/// Initializes FFmpeg. This happens when the [crate] is loaded.
///
/// You should never actually call this function.
#[ctor]
fn ffmpeg_init() {
    if let Err(e) = ffmpeg::init() {
        log::error!("FFmpeg failed to initialize: {e}");
    }
}
