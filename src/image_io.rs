use std::io::Cursor;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use tracing::debug;

use crate::canvas::Cell;
use crate::color::{Color, nearest_index};
use crate::document::Document;
use crate::error::{EditorError, Result};

pub const MAX_EXPORT_SCALE: u32 = 32;

/// Animated export flavours chosen by file extension.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Png,
    Gif,
    Apng,
}

impl ExportKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            "apng" => Ok(Self::Apng),
            _ => Err(EditorError::UnsupportedFormat(ext)),
        }
    }
}

fn scaled(img: RgbaImage, scale: u32) -> RgbaImage {
    let scale = scale.clamp(1, MAX_EXPORT_SCALE);
    if scale == 1 {
        return img;
    }
    imageops::resize(&img, img.width() * scale, img.height() * scale, FilterType::Nearest)
}

fn flattened_frames(doc: &Document, scale: u32) -> Vec<RgbaImage> {
    doc.frames.iter().map(|f| scaled(f.flatten(doc.side), scale)).collect()
}

/// Current frame flattened, upscaled by `scale` and PNG-encoded.
pub fn export_png(doc: &Document, frame: usize, scale: u32) -> Result<Vec<u8>> {
    let img = scaled(doc.frame(frame)?.flatten(doc.side), scale);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// All frames as an infinitely looping GIF.
pub fn export_gif(doc: &Document, ms_per_frame: u64, scale: u32) -> Result<Vec<u8>> {
    let frames = flattened_frames(doc, scale);
    let Some(first) = frames.first() else { return Err(EditorError::Empty("no frames to export")) };
    if first.width() > u16::MAX as u32 {
        return Err(EditorError::InvalidSide(first.width()));
    }
    let (w, h) = (first.width() as u16, first.height() as u16);
    let delay_cs = (ms_per_frame / 10).clamp(1, u16::MAX as u64) as u16;

    let mut out = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut out, w, h, &[])?;
        encoder.set_repeat(gif::Repeat::Infinite)?;
        for img in frames {
            let mut rgba = img.into_raw();
            let mut frame = gif::Frame::from_rgba_speed(w, h, &mut rgba, 10);
            frame.delay = delay_cs;
            frame.dispose = gif::DisposalMethod::Background;
            encoder.write_frame(&frame)?;
        }
    }
    debug!(bytes = out.len(), frames = doc.frames.len(), "encoded GIF");
    Ok(out)
}

/// All frames as an infinitely looping animated PNG.
pub fn export_apng(doc: &Document, ms_per_frame: u64, scale: u32) -> Result<Vec<u8>> {
    let frames = flattened_frames(doc, scale);
    let Some(first) = frames.first() else { return Err(EditorError::Empty("no frames to export")) };
    let (w, h) = first.dimensions();
    let delay_ms = ms_per_frame.clamp(1, u16::MAX as u64) as u16;

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, w, h);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_animated(frames.len() as u32, 0)?;
        let mut writer = encoder.write_header()?;
        for img in &frames {
            writer.set_frame_delay(delay_ms, 1000)?;
            writer.set_dispose_op(png::DisposeOp::Background)?;
            writer.write_image_data(img.as_raw())?;
        }
        writer.finish()?;
    }
    debug!(bytes = out.len(), frames = frames.len(), "encoded APNG");
    Ok(out)
}

/// Renders the document into the format implied by `path` and writes it.
pub fn export_to_path(doc: &Document, path: &Path, frame: usize, ms_per_frame: u64, scale: u32) -> Result<()> {
    let bytes = match ExportKind::from_path(path)? {
        ExportKind::Png => export_png(doc, frame, scale)?,
        ExportKind::Gif => export_gif(doc, ms_per_frame, scale)?,
        ExportKind::Apng => export_apng(doc, ms_per_frame, scale)?,
    };
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Loads an image from disk as RGBA frames.
/// - png/jpg/jpeg: one frame
/// - gif: every frame, composed to full size by the decoder
pub fn load_rgba_frames(path: &Path) -> Result<Vec<RgbaImage>> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" | "jpg" | "jpeg" => {
            let img = image::open(path)?;
            Ok(vec![img.to_rgba8()])
        }
        "gif" => decode_gif(std::fs::File::open(path)?),
        _ => Err(EditorError::UnsupportedFormat(ext)),
    }
}

fn decode_gif<R: std::io::Read>(reader: R) -> Result<Vec<RgbaImage>> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options.read_info(reader)?;
    let (w, h) = (decoder.width() as u32, decoder.height() as u32);
    let mut canvas = RgbaImage::new(w, h);
    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame()? {
        let Some(patch) = RgbaImage::from_raw(frame.width as u32, frame.height as u32, frame.buffer.to_vec()) else {
            return Err(EditorError::Empty("truncated GIF frame"));
        };
        // frames may cover only part of the logical screen
        imageops::overlay(&mut canvas, &patch, frame.left as i64, frame.top as i64);
        frames.push(canvas.clone());
        if frame.dispose == gif::DisposalMethod::Background {
            canvas = RgbaImage::new(w, h);
        }
    }
    if frames.is_empty() {
        return Err(EditorError::Empty("GIF has no frames"));
    }
    Ok(frames)
}

/// Resizes `img` to the canvas with nearest-neighbour and converts it to cells.
/// Nearly transparent pixels stay empty; `snap_to` quantizes colors to a palette.
pub fn rgba_to_cells(img: &RgbaImage, side: u32, snap_to: Option<&[Color]>) -> Vec<Cell> {
    let resized;
    let src = if img.dimensions() == (side, side) {
        img
    } else {
        resized = imageops::resize(img, side, side, FilterType::Nearest);
        &resized
    };
    src.pixels()
        .map(|px| {
            let [r, g, b, a] = px.0;
            if a < 8 {
                return None;
            }
            let c = Color::rgba(r, g, b, a);
            let snapped = snap_to
                .and_then(|pal| nearest_index(c, pal).map(|i| Color { a, ..pal[i] }))
                .unwrap_or(c);
            Some(snapped)
        })
        .collect()
}

/// Imports raster frames as new layers, one document frame per image.
/// - image 0 lands on `frame`, image 1 on `frame + 1`, and so on
/// - frames are appended when the document runs out
/// - each image is fitted with [`rgba_to_cells`]
///
/// Returns how many layers were added. Layers added before an error stay in place.
pub fn import_frames(doc: &mut Document, frame: usize, name: &str, images: &[RgbaImage], snap_to: Option<&[Color]>) -> Result<usize> {
    for (i, img) in images.iter().enumerate() {
        let cells = rgba_to_cells(img, doc.side, snap_to);
        doc.push_layer_cells(frame + i, name, cells)?;
    }
    Ok(images.len())
}
