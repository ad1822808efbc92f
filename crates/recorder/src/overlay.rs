//! Detection overlays for the display copy.

use contracts::{Detection, Frame};
use tracing::trace;

const BOX_COLOR: [u8; 3] = [0, 255, 0];
const BOX_THICKNESS: u32 = 2;
const TEXT_COLOR: [u8; 3] = [0, 0, 0];

/// Font pixels per glyph pixel
const LABEL_SCALE: u32 = 2;
const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;
/// Padding around the caption, in glyph pixels
const LABEL_PAD: u32 = 1;

/// Return a copy of `frame` with a box and a `label conf` caption drawn for
/// every detection
///
/// The caption sits on a filled bar above the box, or just inside its top
/// edge when the box touches the top of the frame. The input frame (and any
/// buffer or sink sharing its pixels) is untouched.
pub fn annotate(frame: &Frame, detections: &[Detection]) -> Frame {
    if detections.is_empty() {
        return frame.clone();
    }

    let mut pixels = frame.to_pixels();
    for detection in detections {
        trace!(frame_id = frame.frame_id, label = %detection.caption(), "drawing detection");
        draw_box(&mut pixels, frame, detection);
        draw_label(&mut pixels, frame, detection);
    }
    frame.with_pixels(pixels)
}

/// Bar size in pixels for a caption of `chars` glyphs
fn label_size(chars: usize) -> (u32, u32) {
    let pad = LABEL_PAD * LABEL_SCALE;
    let advance = (GLYPH_WIDTH + 1) * LABEL_SCALE;
    (chars as u32 * advance + pad, GLYPH_HEIGHT * LABEL_SCALE + 2 * pad)
}

fn draw_label(pixels: &mut [u8], frame: &Frame, detection: &Detection) {
    if frame.width == 0 || frame.height == 0 {
        return;
    }
    let caption = detection.caption();
    let (bar_w, bar_h) = label_size(caption.chars().count());

    let x0 = (detection.bbox.x1.max(0.0) as u32).min(frame.width - 1);
    let y1 = (detection.bbox.y1.max(0.0) as u32).min(frame.height - 1);
    let y0 = y1.checked_sub(bar_h).unwrap_or(y1);

    for y in y0..y0 + bar_h {
        for x in x0..x0 + bar_w {
            put(pixels, frame, x, y, BOX_COLOR);
        }
    }

    let pad = LABEL_PAD * LABEL_SCALE;
    let advance = (GLYPH_WIDTH + 1) * LABEL_SCALE;
    for (i, c) in caption.chars().enumerate() {
        let gx = x0 + pad + i as u32 * advance;
        let gy = y0 + pad;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..LABEL_SCALE {
                    for dx in 0..LABEL_SCALE {
                        let x = gx + col * LABEL_SCALE + dx;
                        let y = gy + row as u32 * LABEL_SCALE + dy;
                        put(pixels, frame, x, y, TEXT_COLOR);
                    }
                }
            }
        }
    }
}

/// 3x5 bitmap rows, most significant bit on the left
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        ' ' => [0; 5],
        _ => [0b111, 0b001, 0b010, 0b000, 0b010],
    }
}

fn draw_box(pixels: &mut [u8], frame: &Frame, detection: &Detection) {
    if frame.width == 0 || frame.height == 0 {
        return;
    }
    let max_x = frame.width - 1;
    let max_y = frame.height - 1;
    let clamp = |v: f32, max: u32| -> u32 { (v.max(0.0) as u32).min(max) };

    let x1 = clamp(detection.bbox.x1, max_x);
    let y1 = clamp(detection.bbox.y1, max_y);
    let x2 = clamp(detection.bbox.x2, max_x);
    let y2 = clamp(detection.bbox.y2, max_y);
    if x2 < x1 || y2 < y1 {
        return;
    }

    for t in 0..BOX_THICKNESS {
        for x in x1..=x2 {
            put(pixels, frame, x, (y1 + t).min(y2), BOX_COLOR);
            put(pixels, frame, x, y2.saturating_sub(t).max(y1), BOX_COLOR);
        }
        for y in y1..=y2 {
            put(pixels, frame, (x1 + t).min(x2), y, BOX_COLOR);
            put(pixels, frame, x2.saturating_sub(t).max(x1), y, BOX_COLOR);
        }
    }
}

/// Set one pixel; coordinates outside the frame are ignored
#[inline]
fn put(pixels: &mut [u8], frame: &Frame, x: u32, y: u32, color: [u8; 3]) {
    if x >= frame.width || y >= frame.height {
        return;
    }
    let bpp = frame.format.bytes_per_pixel();
    let idx = (y as usize * frame.width as usize + x as usize) * bpp;
    if let Some(px) = pixels.get_mut(idx..idx + 3) {
        px.copy_from_slice(&color);
    }
}
