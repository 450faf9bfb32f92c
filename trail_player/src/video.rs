// THEORY:
// OpenCV adapters for the trail engine's collaborator traits. Frames cross the boundary
// as 8-bit RGB `image` buffers; OpenCV keeps its native BGR `Mat` on its own side.
//
// Ownership rules:
// 1.  `VideoInput` owns the capture handle, `VideoOutput` owns the writer and the
//     display window. Each releases its handles in `Drop`, so early returns, stop
//     requests and errors all clean up the same way.
// 2.  `Mog2Background` owns an OpenCV MOG2 subtractor and exposes it as a
//     `BackgroundModel`, so the engine never sees OpenCV types.

use anyhow::{Context, Result, anyhow};
use image::GrayImage;
use motion_trails::{
    BackgroundModel, BinaryMask, Frame, FrameSink, FrameSource, TrailError, TrailResult,
};
use opencv::{
    core::{self, Mat, Ptr, Scalar, Size},
    highgui, imgproc,
    prelude::*,
    video::{self, BackgroundSubtractorMOG2},
    videoio::{self, VideoCapture, VideoWriter},
};
use tracing::warn;

/// Frames of history kept by the MOG2 model.
const MOG2_HISTORY: i32 = 500;
const MOG2_VAR_THRESHOLD: f64 = 16.0;

/// Converts an 8-bit BGR `Mat` into an RGB frame.
pub fn mat_to_frame(bgr: &Mat) -> TrailResult<Frame> {
    let mut rgb = Mat::default();
    imgproc::cvt_color(bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0).context("BGR to RGB")?;
    let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
    let bytes = rgb.data_bytes().context("reading frame bytes")?.to_vec();
    Frame::from_raw(width, height, bytes)
        .ok_or_else(|| TrailError::source(format!("frame buffer is not {width}x{height} RGB")))
}

/// Wraps an RGB buffer in a 3-channel `Mat` without reordering channels.
fn frame_to_mat(frame: &Frame) -> TrailResult<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        frame.height() as i32,
        frame.width() as i32,
        core::CV_8UC3,
        Scalar::all(0.0),
    )
    .context("allocating frame Mat")?;
    mat.data_bytes_mut()
        .context("writing frame bytes")?
        .copy_from_slice(frame.as_raw());
    Ok(mat)
}

/// Converts an RGB frame into an 8-bit BGR `Mat` for display and encoding.
pub fn frame_to_bgr(frame: &Frame) -> TrailResult<Mat> {
    let rgb = frame_to_mat(frame)?;
    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0).context("RGB to BGR")?;
    Ok(bgr)
}

/// A video file opened for sequential reading.
pub struct VideoInput {
    capture: VideoCapture,
    buffer: Mat,
}

impl VideoInput {
    pub fn open(path: &str) -> Result<Self> {
        let capture = VideoCapture::from_file(path, videoio::CAP_ANY)
            .with_context(|| format!("opening video '{path}'"))?;
        if !capture.is_opened()? {
            return Err(anyhow!("could not open video '{path}'"));
        }
        Ok(Self {
            capture,
            buffer: Mat::default(),
        })
    }

    pub fn frame_size(&self) -> Result<Size> {
        let width = self.capture.get(videoio::CAP_PROP_FRAME_WIDTH)?;
        let height = self.capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?;
        Ok(Size::new(width as i32, height as i32))
    }

    pub fn fps(&self) -> Result<f64> {
        Ok(self.capture.get(videoio::CAP_PROP_FPS)?)
    }
}

impl FrameSource for VideoInput {
    fn next_frame(&mut self) -> TrailResult<Option<Frame>> {
        let grabbed = self
            .capture
            .read(&mut self.buffer)
            .context("reading video frame")?;
        if !grabbed || self.buffer.empty() {
            return Ok(None);
        }
        mat_to_frame(&self.buffer).map(Some)
    }
}

impl Drop for VideoInput {
    fn drop(&mut self) {
        if let Err(err) = self.capture.release() {
            warn!(%err, "failed to release video capture");
        }
    }
}

/// Where composited frames go: an optional encoder and an optional live window.
pub struct VideoOutput {
    writer: Option<VideoWriter>,
    window: Option<String>,
}

impl VideoOutput {
    pub fn new() -> Self {
        Self {
            writer: None,
            window: None,
        }
    }

    /// Records to `path` with the `mp4v` codec at the input's rate and size.
    pub fn record_to(mut self, path: &str, fps: f64, size: Size) -> Result<Self> {
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = VideoWriter::new(path, fourcc, fps, size, true)
            .with_context(|| format!("creating video writer for '{path}'"))?;
        if !writer.is_opened()? {
            return Err(anyhow!("could not open '{path}' for writing"));
        }
        self.writer = Some(writer);
        Ok(self)
    }

    /// Shows every frame in a window named `title`; `q` in that window stops the run.
    pub fn display_as(mut self, title: &str) -> Result<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)
            .with_context(|| format!("opening window '{title}'"))?;
        self.window = Some(title.to_owned());
        Ok(self)
    }
}

impl Default for VideoOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for VideoOutput {
    fn write_frame(&mut self, frame: &Frame) -> TrailResult<()> {
        if self.writer.is_none() && self.window.is_none() {
            return Ok(());
        }
        let bgr = frame_to_bgr(frame)?;
        if let Some(writer) = self.writer.as_mut() {
            writer
                .write(&bgr)
                .map_err(|err| TrailError::sink(format!("encoding frame: {err}")))?;
        }
        if let Some(title) = self.window.as_deref() {
            highgui::imshow(title, &bgr)
                .map_err(|err| TrailError::sink(format!("displaying frame: {err}")))?;
        }
        Ok(())
    }

    fn stop_requested(&mut self) -> TrailResult<bool> {
        if self.window.is_none() {
            return Ok(false);
        }
        let key = highgui::wait_key(1).context("polling keyboard")?;
        Ok(key & 0xFF == 'q' as i32)
    }
}

impl Drop for VideoOutput {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(err) = writer.release() {
                warn!(%err, "failed to release video writer");
            }
        }
        if self.window.is_some() {
            if let Err(err) = highgui::destroy_all_windows() {
                warn!(%err, "failed to close display windows");
            }
        }
    }
}

/// OpenCV's Gaussian-mixture background subtractor, shadows disabled.
pub struct Mog2Background {
    subtractor: Ptr<BackgroundSubtractorMOG2>,
}

impl Mog2Background {
    pub fn new() -> Result<Self> {
        let subtractor =
            video::create_background_subtractor_mog2(MOG2_HISTORY, MOG2_VAR_THRESHOLD, false)
                .context("creating MOG2 background subtractor")?;
        Ok(Self { subtractor })
    }
}

impl BackgroundModel for Mog2Background {
    fn apply(&mut self, frame: &Frame) -> TrailResult<BinaryMask> {
        // Channel order does not matter to the mixture model.
        let input = frame_to_mat(frame)?;
        let mut foreground = Mat::default();
        self.subtractor
            .apply(&input, &mut foreground, -1.0)
            .context("MOG2 apply")?;
        let bytes = foreground
            .data_bytes()
            .context("reading foreground mask")?
            .to_vec();
        let gray = GrayImage::from_raw(frame.width(), frame.height(), bytes).ok_or_else(|| {
            TrailError::source("MOG2 mask does not match frame size".to_string())
        })?;
        Ok(BinaryMask::from_gray(gray))
    }

    fn reset(&mut self) {
        match Self::new() {
            Ok(fresh) => *self = fresh,
            Err(err) => warn!(%err, "MOG2 reset failed; keeping current model"),
        }
    }
}
