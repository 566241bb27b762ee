use image::{Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

pub const WIDTH: u32 = 1280;
pub const HEIGHT: u32 = 720;

/// Left stripe: bottom-left to vanishing area, slope ≈ -0.545.
pub const LEFT_STRIPE: ((f32, f32), (f32, f32)) = ((240.0, 660.0), (625.0, 450.0));
/// Right stripe: slope ≈ 0.646.
pub const RIGHT_STRIPE: ((f32, f32), (f32, f32)) = ((1060.0, 660.0), (735.0, 450.0));

pub fn stripe_slope(stripe: ((f32, f32), (f32, f32))) -> f64 {
    let ((x0, y0), (x1, y1)) = stripe;
    ((y1 - y0) / (x1 - x0)) as f64
}

/// Uniform asphalt-gray frame.
pub fn blank_road() -> RgbImage {
    RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([80, 80, 80]))
}

/// Asphalt with two white lane stripes inside the default region of interest
/// and a horizontal shadow band across the lane.
pub fn two_lane_road() -> RgbImage {
    let mut frame = blank_road();
    paint_stripe(&mut frame, LEFT_STRIPE, 8.0, Rgb([255, 255, 255]));
    paint_stripe(&mut frame, RIGHT_STRIPE, 8.0, Rgb([255, 255, 255]));
    paint_stripe(&mut frame, ((560.0, 560.0), (760.0, 560.0)), 6.0, Rgb([30, 30, 30]));
    frame
}

fn paint_stripe(frame: &mut RgbImage, stripe: ((f32, f32), (f32, f32)), width: f32, color: Rgb<u8>) {
    let ((x0, y0), (x1, y1)) = stripe;
    let (dx, dy) = (x1 - x0, y1 - y0);
    let len = (dx * dx + dy * dy).sqrt();
    let (nx, ny) = (-dy / len * width / 2.0, dx / len * width / 2.0);
    let quad = [
        Point::new((x0 + nx).round() as i32, (y0 + ny).round() as i32),
        Point::new((x1 + nx).round() as i32, (y1 + ny).round() as i32),
        Point::new((x1 - nx).round() as i32, (y1 - ny).round() as i32),
        Point::new((x0 - nx).round() as i32, (y0 - ny).round() as i32),
    ];
    draw_polygon_mut(frame, &quad, color);
}
