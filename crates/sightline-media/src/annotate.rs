//! Match annotation drawn onto a frame.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use sightline_models::{FaceBox, MatchKind, Region, ScoreSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Face box colour for a full match.
pub const FULL_MATCH_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Face box colour for a face-only match.
pub const FACE_ONLY_COLOR: Rgb<u8> = Rgb([255, 165, 0]);
/// Shirt region box colour.
pub const SHIRT_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const LINE_THICKNESS: u32 = 2;
const LABEL_BAR_HEIGHT: i32 = 30;
const LABEL_BAR_EXTRA_WIDTH: u32 = 100;
const LABEL_SCALE: f32 = 20.0;
const SHIRT_LABEL_SCALE: f32 = 14.0;

/// Font locations tried when none is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Colour of the face box and label bar for a classification.
pub fn kind_color(kind: MatchKind) -> Rgb<u8> {
    match kind {
        MatchKind::FullMatch => FULL_MATCH_COLOR,
        MatchKind::FaceOnlyMatch => FACE_ONLY_COLOR,
    }
}

/// Label text, e.g. `MATCH FOUND: 93%`.
pub fn status_text(kind: MatchKind, scores: &ScoreSet) -> String {
    format!("{}: {}%", kind.status_label(), scores.percent())
}

/// Draws match boxes and labels.
///
/// Without a font the boxes and label bar are still drawn; only text is left out.
pub struct Annotator {
    font: Option<Font<'static>>,
}

impl Annotator {
    /// Annotator that draws boxes only.
    pub fn without_text() -> Self {
        Self { font: None }
    }

    /// Annotator using a TrueType font from memory.
    pub fn from_font_bytes(bytes: Vec<u8>) -> MediaResult<Self> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| MediaError::internal("font data is not a valid TrueType font"))?;
        Ok(Self { font: Some(font) })
    }

    /// Load the configured font, or the first system font found.
    ///
    /// Falls back to [`Annotator::without_text`] when nothing loads.
    pub fn load(configured: Option<&Path>) -> Self {
        let candidates = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            match Self::from_font_bytes(bytes) {
                Ok(annotator) => {
                    info!(font = %path.display(), "Loaded annotation font");
                    return annotator;
                }
                Err(e) => debug!(font = %path.display(), error = %e, "Skipping font"),
            }
        }

        debug!("No annotation font found; labels will be drawn without text");
        Self::without_text()
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw the face box, shirt box and status label for one classified detection.
    pub fn annotate(
        &self,
        frame: &mut RgbImage,
        face: &FaceBox,
        shirt: &Region,
        kind: MatchKind,
        scores: &ScoreSet,
    ) {
        let color = kind_color(kind);

        draw_box(frame, face.x as i32, face.y as i32, face.width, face.height, color);

        draw_box(
            frame,
            shirt.x1 as i32,
            shirt.y1 as i32,
            shirt.width(),
            shirt.height(),
            SHIRT_COLOR,
        );
        if let Some(font) = &self.font {
            draw_text_mut(
                frame,
                SHIRT_COLOR,
                shirt.x1 as i32,
                shirt.y1 as i32 - SHIRT_LABEL_SCALE as i32 - 5,
                Scale::uniform(SHIRT_LABEL_SCALE),
                font,
                "Shirt Area",
            );
        }

        let bar_x = face.x as i32;
        let bar_y = face.y as i32 - LABEL_BAR_HEIGHT;
        let bar_width = face.width + LABEL_BAR_EXTRA_WIDTH;
        draw_filled_rect_mut(
            frame,
            Rect::at(bar_x, bar_y).of_size(bar_width, LABEL_BAR_HEIGHT as u32),
            color,
        );
        if let Some(font) = &self.font {
            draw_text_mut(
                frame,
                TEXT_COLOR,
                bar_x + 2,
                bar_y + (LABEL_BAR_HEIGHT - LABEL_SCALE as i32) / 2,
                Scale::uniform(LABEL_SCALE),
                font,
                &status_text(kind, scores),
            );
        }
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::load(None)
    }
}

/// Hollow rectangle `LINE_THICKNESS` pixels wide, drawn inward. Zero-sized boxes are skipped.
fn draw_box(frame: &mut RgbImage, x: i32, y: i32, width: u32, height: u32, color: Rgb<u8>) {
    for inset in 0..LINE_THICKNESS {
        let w = width.saturating_sub(2 * inset);
        let h = height.saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        let offset = inset as i32;
        draw_hollow_rect_mut(frame, Rect::at(x + offset, y + offset).of_size(w, h), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores() -> ScoreSet {
        ScoreSet {
            face_score: 0.9,
            clothing_score: Some(1.0),
            final_score: 0.93,
        }
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(MatchKind::FullMatch, &scores()), "MATCH FOUND: 93%");
        assert_eq!(
            status_text(MatchKind::FaceOnlyMatch, &scores()),
            "FACE MATCH (Check Clothes): 93%"
        );
    }

    #[test]
    fn test_full_match_draws_green_face_and_blue_shirt() {
        let mut frame = RgbImage::new(200, 200);
        let face = FaceBox::new(40, 60, 20, 20);
        let shirt = Region::new(20, 80, 80, 130);

        Annotator::without_text().annotate(&mut frame, &face, &shirt, MatchKind::FullMatch, &scores());

        // left edge of face box, below the label bar
        assert_eq!(*frame.get_pixel(40, 70), FULL_MATCH_COLOR);
        assert_eq!(*frame.get_pixel(41, 70), FULL_MATCH_COLOR);
        assert_eq!(*frame.get_pixel(20, 100), SHIRT_COLOR);
        // label bar spans (x, y-30)..(x+w+100, y)
        assert_eq!(*frame.get_pixel(150, 45), FULL_MATCH_COLOR);
        // interior untouched
        assert_eq!(*frame.get_pixel(50, 100), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_face_only_uses_orange() {
        let mut frame = RgbImage::new(100, 100);
        let face = FaceBox::new(10, 40, 20, 20);
        let shirt = Region::new(0, 60, 50, 100);

        Annotator::without_text().annotate(&mut frame, &face, &shirt, MatchKind::FaceOnlyMatch, &scores());
        assert_eq!(*frame.get_pixel(10, 50), FACE_ONLY_COLOR);
    }

    #[test]
    fn test_annotate_tolerates_edges_and_empty_regions() {
        let mut frame = RgbImage::new(50, 50);
        let face = FaceBox::new(0, 0, 50, 50);
        let shirt = Region::new(0, 50, 50, 50);

        Annotator::without_text().annotate(&mut frame, &face, &shirt, MatchKind::FullMatch, &scores());
        assert_eq!(*frame.get_pixel(0, 0), FULL_MATCH_COLOR);
    }

    #[test]
    fn test_invalid_font_bytes_rejected() {
        assert!(Annotator::from_font_bytes(vec![0, 1, 2, 3]).is_err());
    }
}
