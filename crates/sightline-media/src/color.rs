//! Named clothing colour scoring.
//!
//! A garment region is converted to HSV using the OpenCV 8-bit convention
//! (hue halved to `0..=180`, saturation and value in `0..=255`) and the share
//! of pixels inside the colour's ranges becomes the score. Hue, unlike raw RGB,
//! stays put when lighting changes, which keeps a "red shirt" red in shadow.

use image::{GenericImageView, Rgb};
use std::fmt;
use tracing::warn;

/// Coverage is multiplied by this, so 25% literal coverage saturates the score.
pub const COVERAGE_GAIN: f64 = 4.0;

/// Score returned for colour names outside the palette.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Names that disable the colour check.
const DONT_CARE: &[&str] = &["none", "unknown", ""];

/// Inclusive HSV bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }
}

const BLACK: &[HsvRange] = &[HsvRange::new([0, 0, 0], [180, 255, 50])];
const WHITE: &[HsvRange] = &[HsvRange::new([0, 0, 160], [180, 50, 255])];
const GREY: &[HsvRange] = &[HsvRange::new([0, 0, 50], [180, 50, 160])];
// Red straddles hue 0 and needs both ends of the wheel.
const RED: &[HsvRange] = &[
    HsvRange::new([0, 70, 50], [10, 255, 255]),
    HsvRange::new([170, 70, 50], [180, 255, 255]),
];
const BLUE: &[HsvRange] = &[HsvRange::new([100, 60, 50], [140, 255, 255])];
const GREEN: &[HsvRange] = &[HsvRange::new([35, 50, 50], [85, 255, 255])];
const YELLOW: &[HsvRange] = &[HsvRange::new([20, 100, 100], [35, 255, 255])];
const BEIGE: &[HsvRange] = &[HsvRange::new([20, 10, 150], [40, 90, 255])];
const ORANGE: &[HsvRange] = &[HsvRange::new([10, 100, 100], [25, 255, 255])];

/// Colours the scorer knows how to mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Black,
    White,
    Grey,
    Red,
    Blue,
    Green,
    Yellow,
    Beige,
    Orange,
}

impl NamedColor {
    pub const ALL: [NamedColor; 9] = [
        NamedColor::Black,
        NamedColor::White,
        NamedColor::Grey,
        NamedColor::Red,
        NamedColor::Blue,
        NamedColor::Green,
        NamedColor::Yellow,
        NamedColor::Beige,
        NamedColor::Orange,
    ];

    /// Look up a normalized (trimmed, lower-case) name, resolving aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "black" => Some(Self::Black),
            "white" | "cream" => Some(Self::White),
            "grey" | "gray" => Some(Self::Grey),
            "red" => Some(Self::Red),
            "blue" | "navy" => Some(Self::Blue),
            "green" => Some(Self::Green),
            "yellow" => Some(Self::Yellow),
            "beige" => Some(Self::Beige),
            "orange" => Some(Self::Orange),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::White => "white",
            Self::Grey => "grey",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Beige => "beige",
            Self::Orange => "orange",
        }
    }

    /// HSV ranges whose union forms this colour's mask.
    pub fn ranges(&self) -> &'static [HsvRange] {
        match self {
            Self::Black => BLACK,
            Self::White => WHITE,
            Self::Grey => GREY,
            Self::Red => RED,
            Self::Blue => BLUE,
            Self::Green => GREEN,
            Self::Yellow => YELLOW,
            Self::Beige => BEIGE,
            Self::Orange => ORANGE,
        }
    }

    #[inline]
    pub fn matches(&self, hsv: [u8; 3]) -> bool {
        self.ranges().iter().any(|r| r.contains(hsv))
    }
}

impl fmt::Display for NamedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed colour request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorQuery {
    /// "none", "unknown" or blank: every region passes
    DontCare,
    Named(NamedColor),
    /// Name outside the palette; scored neutrally
    Unrecognized(String),
}

impl ColorQuery {
    /// Parse a user-supplied colour name. Case and surrounding whitespace are ignored.
    pub fn parse(name: &str) -> Self {
        let normalized = name.trim().to_lowercase();
        if DONT_CARE.contains(&normalized.as_str()) {
            return Self::DontCare;
        }
        match NamedColor::from_name(&normalized) {
            Some(color) => Self::Named(color),
            None => Self::Unrecognized(normalized),
        }
    }
}

impl fmt::Display for ColorQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DontCare => write!(f, "any"),
            Self::Named(color) => write!(f, "{color}"),
            Self::Unrecognized(name) => write!(f, "{name} (unrecognized)"),
        }
    }
}

/// Convert one RGB pixel to 8-bit HSV the way OpenCV's `COLOR_RGB2HSV` does.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(i32::from);
    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    if diff == 0 {
        return [0, 0, v as u8];
    }

    let s = (255.0 * diff as f64 / v as f64 + 0.5).floor() as i32;

    let sector = if v == r {
        g - b
    } else if v == g {
        b - r + 2 * diff
    } else {
        r - g + 4 * diff
    };
    let mut h = (sector as f64 * 30.0 / diff as f64 + 0.5).floor() as i32;
    if h < 0 {
        h += 180;
    }

    [h as u8, s as u8, v as u8]
}

/// Fraction of the crop's pixels that fall inside `color`'s mask.
///
/// Returns 0.0 for an empty crop.
pub fn coverage_ratio<I>(crop: &I, color: NamedColor) -> f64
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    let (width, height) = crop.dimensions();
    let total = width as u64 * height as u64;
    if total == 0 {
        return 0.0;
    }

    let matched = crop
        .pixels()
        .filter(|(_, _, Rgb(px))| color.matches(rgb_to_hsv(*px)))
        .count() as u64;

    matched as f64 / total as f64
}

/// Score in `[0, 1]` for how strongly `query` is present in `crop`.
pub fn color_presence<I>(crop: &I, query: &ColorQuery) -> f64
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    let (width, height) = crop.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    match query {
        ColorQuery::DontCare => 1.0,
        ColorQuery::Named(color) => (coverage_ratio(crop, *color) * COVERAGE_GAIN).min(1.0),
        ColorQuery::Unrecognized(name) => {
            warn!(color = %name, "Unknown colour name, assuming a neutral match");
            NEUTRAL_SCORE
        }
    }
}

/// Convenience wrapper taking the colour by name.
pub fn score_color<I>(crop: &I, name: &str) -> f64
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    color_presence(crop, &ColorQuery::parse(name))
}
