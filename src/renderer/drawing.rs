use crate::renderer::fonts::FontConfig;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect;

pub fn horizontal_line(image: &mut RgbaImage, x: u32, y: u32, width: u32, colour: Rgba<u8>) {
    draw_line_segment_mut(
        image,
        (x as f32, y as f32),
        ((x + width) as f32, y as f32),
        colour,
    );
}

pub fn vertical_line(image: &mut RgbaImage, x: u32, y1: u32, y2: u32, colour: Rgba<u8>) {
    draw_line_segment_mut(
        image,
        (x as f32, y1 as f32),
        (x as f32, y2 as f32),
        colour,
    );
}

pub fn text(
    image: &mut RgbaImage,
    colour: Rgba<u8>,
    x: i32,
    y: i32,
    font_config: &FontConfig,
    text: &str,
) {
    draw_text_mut(
        image,
        colour,
        x,
        y,
        font_config.scale,
        &font_config.font,
        text,
    );
}

/// Connect consecutive points. A single point is drawn as a small square.
pub fn polyline(image: &mut RgbaImage, points: &[(f32, f32)], colour: Rgba<u8>) {
    match points {
        [] => {}
        [(x, y)] => marker(image, *x, *y, colour),
        _ => {
            for pair in points.windows(2) {
                draw_line_segment_mut(image, pair[0], pair[1], colour);
            }
        }
    }
}

pub fn marker(image: &mut RgbaImage, x: f32, y: f32, colour: Rgba<u8>) {
    draw_filled_rect_mut(
        image,
        Rect::at(x.round() as i32 - 1, y.round() as i32 - 1).of_size(3, 3),
        colour,
    );
}

pub fn fill(image: &mut RgbaImage, colour: Rgba<u8>) {
    for pixel in image.pixels_mut() {
        *pixel = colour;
    }
}
