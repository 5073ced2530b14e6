//! Garment region estimation from a face box.
//!
//! Regions are placed with fixed body proportions relative to the face and
//! clamped to the frame. Nothing here looks at pixels.

use image::{imageops, RgbImage, SubImage};
use sightline_models::{FaceBox, GarmentRegions, Region};

use crate::config::BodyGeometry;

/// Estimate the torso region below `face`.
pub fn shirt_region(
    face: &FaceBox,
    geometry: &BodyGeometry,
    frame_width: u32,
    frame_height: u32,
) -> Region {
    let w = face.width as i64;
    let h = face.height as i64;
    let x = face.x as i64;
    let y = face.y as i64;

    let x1 = x - scaled(geometry.shoulder_left, w);
    let x2 = x + scaled(geometry.shoulder_right, w);
    let y1 = y + h;
    let y2 = y1 + scaled(geometry.shirt_depth, h);

    clamped(x1, y1, x2, y2, frame_width, frame_height)
}

/// Estimate the leg region directly below `shirt`, sharing its horizontal span.
pub fn pant_region(
    face: &FaceBox,
    shirt: &Region,
    geometry: &BodyGeometry,
    frame_width: u32,
    frame_height: u32,
) -> Region {
    let y1 = shirt.y2 as i64;
    let y2 = y1 + scaled(geometry.pant_depth, face.height as i64);

    clamped(
        shirt.x1 as i64,
        y1,
        shirt.x2 as i64,
        y2,
        frame_width,
        frame_height,
    )
}

/// Estimate every garment region for one detection.
///
/// The pant region is only produced when `with_pants` is set.
pub fn estimate_regions(
    face: &FaceBox,
    geometry: &BodyGeometry,
    frame_width: u32,
    frame_height: u32,
    with_pants: bool,
) -> GarmentRegions {
    let shirt = shirt_region(face, geometry, frame_width, frame_height);
    let pants = with_pants
        .then(|| pant_region(face, &shirt, geometry, frame_width, frame_height));

    GarmentRegions { shirt, pants }
}

/// Borrowed view of `region` within `frame`, clipped to the frame bounds.
pub fn view_region<'a>(frame: &'a RgbImage, region: &Region) -> SubImage<&'a RgbImage> {
    let r = region.clip(frame.width(), frame.height());
    imageops::crop_imm(frame, r.x1, r.y1, r.width(), r.height())
}

/// `trunc(multiplier * extent)`
#[inline]
fn scaled(multiplier: f64, extent: i64) -> i64 {
    (multiplier * extent as f64).trunc() as i64
}

fn clamped(x1: i64, y1: i64, x2: i64, y2: i64, frame_width: u32, frame_height: u32) -> Region {
    let fw = frame_width as i64;
    let fh = frame_height as i64;
    Region::new(
        x1.clamp(0, fw) as u32,
        y1.clamp(0, fh) as u32,
        x2.clamp(0, fw) as u32,
        y2.clamp(0, fh) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> BodyGeometry {
        BodyGeometry::default()
    }

    #[test]
    fn test_shirt_region_centered_face() {
        let face = FaceBox::new(100, 50, 40, 40);
        let shirt = shirt_region(&face, &geometry(), 640, 480);
        assert_eq!(shirt, Region::new(60, 90, 180, 190));
    }

    #[test]
    fn test_shirt_depth_truncates() {
        // 2.5 * 15 = 37.5 -> 37
        let face = FaceBox::new(100, 0, 15, 15);
        let shirt = shirt_region(&face, &geometry(), 640, 480);
        assert_eq!(shirt.y1, 15);
        assert_eq!(shirt.y2, 52);
    }

    #[test]
    fn test_shirt_clamped_left_and_bottom() {
        let face = FaceBox::new(10, 400, 40, 40);
        let shirt = shirt_region(&face, &geometry(), 640, 480);
        assert_eq!(shirt.x1, 0);
        assert_eq!(shirt.x2, 90);
        assert_eq!(shirt.y1, 440);
        assert_eq!(shirt.y2, 480);
    }

    #[test]
    fn test_shirt_clamped_right() {
        let face = FaceBox::new(600, 10, 40, 40);
        let shirt = shirt_region(&face, &geometry(), 640, 480);
        assert_eq!(shirt.x1, 560);
        assert_eq!(shirt.x2, 640);
    }

    #[test]
    fn test_face_at_bottom_edge_gives_empty_shirt() {
        let face = FaceBox::new(100, 450, 40, 40);
        let shirt = shirt_region(&face, &geometry(), 640, 480);
        assert_eq!(shirt.y1, 480);
        assert!(shirt.is_empty());
    }

    #[test]
    fn test_pant_region_follows_shirt() {
        let face = FaceBox::new(100, 20, 40, 40);
        let regions = estimate_regions(&face, &geometry(), 640, 480, true);
        let pants = regions.pants.expect("pants requested");
        assert_eq!(pants.y1, regions.shirt.y2);
        assert_eq!(pants.y2, regions.shirt.y2 + 120);
        assert_eq!((pants.x1, pants.x2), (regions.shirt.x1, regions.shirt.x2));
    }

    #[test]
    fn test_pant_region_clamped() {
        let face = FaceBox::new(100, 250, 40, 40);
        let regions = estimate_regions(&face, &geometry(), 640, 480, true);
        assert_eq!(regions.shirt.y2, 390);
        assert_eq!(regions.pants.map(|p| p.y2), Some(480));
    }

    #[test]
    fn test_no_pants_unless_requested() {
        let face = FaceBox::new(100, 20, 40, 40);
        assert!(estimate_regions(&face, &geometry(), 640, 480, false).pants.is_none());
    }

    #[test]
    fn test_view_region_clips() {
        use image::GenericImageView;

        let frame = RgbImage::new(64, 48);
        let view = view_region(&frame, &Region::new(50, 40, 90, 70));
        assert_eq!(view.dimensions(), (14, 8));
        let empty = view_region(&frame, &Region::new(10, 48, 30, 48));
        assert_eq!(empty.dimensions().1, 0);
    }

    #[test]
    fn test_shirt_view_scores_its_own_pixels() {
        use crate::color::{color_presence, ColorQuery, NamedColor};
        use image::Rgb;

        // Red below the face, grey everywhere else
        let face = FaceBox::new(100, 20, 40, 40);
        let regions = estimate_regions(&face, &geometry(), 320, 240, true);
        let shirt = regions.shirt;
        let frame = RgbImage::from_fn(320, 240, |x, y| {
            if (shirt.x1..shirt.x2).contains(&x) && (shirt.y1..shirt.y2).contains(&y) {
                Rgb([220, 20, 20])
            } else {
                Rgb([128, 128, 128])
            }
        });

        let red = ColorQuery::Named(NamedColor::Red);
        let view = view_region(&frame, &regions.shirt);
        assert_eq!(color_presence(&*view, &red), 1.0);
        let pants = regions.pants.expect("pants requested");
        assert_eq!(color_presence(&*view_region(&frame, &pants), &red), 0.0);
    }

    #[test]
    fn test_regions_are_deterministic_and_in_frame() {
        for (x, y, w, h) in [(0, 0, 5, 5), (630, 470, 50, 50), (320, 240, 200, 10), (1, 479, 1, 1)] {
            let face = FaceBox::new(x, y, w, h);
            let a = estimate_regions(&face, &geometry(), 640, 480, true);
            let b = estimate_regions(&face, &geometry(), 640, 480, true);
            assert_eq!(a, b);
            for region in [Some(a.shirt), a.pants].into_iter().flatten() {
                assert!(region.x1 <= 640 && region.x2 <= 640);
                assert!(region.y1 <= 480 && region.y2 <= 480);
            }
        }
    }
}
