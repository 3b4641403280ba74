use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgba, RgbaImage, imageops};
use imageproc::drawing::draw_text_mut;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::metadata::MetadataRecord;

/// Last-resort font compiled into the binary.
static BUNDLED_FONT: &[u8] = include_bytes!("../static/DejaVuSansMono.ttf");

/// Layout of the metadata panel drawn onto each photo
pub struct OverlayConfig {
    pub font_size: f32,
    pub small_font_size: f32,
    pub line_height: u32,
    pub padding: u32,
    pub panel_color: Rgba<u8>,
    pub text_color: Rgba<u8>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            small_font_size: 18.0,
            line_height: 30,
            padding: 10,
            panel_color: Rgba([0, 0, 0, 128]),
            text_color: Rgba([255, 255, 255, 255]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    File(PathBuf),
    Bundled,
    Unavailable,
}

/// Font used for overlay text, resolved once at startup.
pub struct OverlayFont {
    font: Option<FontVec>,
    source: FontSource,
}

/// System fonts known to cover Japanese as well as Latin text.
fn platform_font_candidates() -> Vec<PathBuf> {
    let paths: &[&str] = if cfg!(target_os = "windows") {
        &[
            "C:/Windows/Fonts/meiryo.ttc",
            "C:/Windows/Fonts/msgothic.ttc",
            "C:/Windows/Fonts/YuGothM.ttc",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/System/Library/Fonts/ヒラギノ角ゴシック W4.ttc",
            "/Library/Fonts/Osaka.ttf",
            "/System/Library/Fonts/AppleGothic.ttf",
        ]
    } else {
        &[
            "/usr/share/fonts/truetype/fonts-japanese-gothic.ttf",
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        ]
    };
    paths.iter().map(PathBuf::from).collect()
}

/// First platform font that exists on this machine, if any.
pub fn detect_font_path() -> Option<PathBuf> {
    platform_font_candidates().into_iter().find(|p| p.exists())
}

fn load_font_file(path: &Path) -> Option<FontVec> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            debug!("Font {:?} not readable: {}", path, e);
            return None;
        }
    };
    // Collections (.ttc) are read from their first face
    match FontVec::try_from_vec_and_index(data, 0) {
        Ok(font) => Some(font),
        Err(_) => {
            debug!("Font {:?} could not be parsed", path);
            None
        }
    }
}

impl OverlayFont {
    /// Try `preferred` paths, then platform fonts, then the bundled font.
    pub fn resolve(preferred: &[PathBuf]) -> Self {
        for path in preferred.iter().cloned().chain(platform_font_candidates()) {
            if let Some(font) = load_font_file(&path) {
                info!("Overlay font: {:?}", path);
                return Self {
                    font: Some(font),
                    source: FontSource::File(path),
                };
            }
        }
        Self::bundled()
    }

    pub fn bundled() -> Self {
        match FontVec::try_from_vec(BUNDLED_FONT.to_vec()) {
            Ok(font) => {
                info!("Overlay font: bundled DejaVu Sans Mono");
                Self {
                    font: Some(font),
                    source: FontSource::Bundled,
                }
            }
            Err(_) => {
                warn!("Bundled font could not be parsed, overlay text will be omitted");
                Self {
                    font: None,
                    source: FontSource::Unavailable,
                }
            }
        }
    }

    pub fn source(&self) -> &FontSource {
        &self.source
    }
}

/// Text lines drawn on the panel, top to bottom.
pub fn overlay_lines(record: &MetadataRecord) -> Vec<String> {
    let mut lines = vec![
        format!("Name: {}", record.user_name),
        format!("Location: {}", record.location),
        format!("Tags: {}", record.joined_tags()),
        format!("Time: {}", record.timestamp),
    ];
    if record.has_comment() {
        lines.push(format!("Comment: {}", record.comment));
    }
    lines
}

pub fn panel_height(line_count: usize, config: &OverlayConfig) -> u32 {
    line_count as u32 * config.line_height + config.padding * 2
}

/// Burn the metadata into the top-left corner of a photo.
///
/// Always returns an opaque RGB image of the same size as the input.
pub fn annotate(image: &DynamicImage, record: &MetadataRecord, font: &OverlayFont) -> DynamicImage {
    annotate_with_config(image, record, font, &OverlayConfig::default())
}

pub fn annotate_with_config(
    image: &DynamicImage,
    record: &MetadataRecord,
    font: &OverlayFont,
    config: &OverlayConfig,
) -> DynamicImage {
    let mut rgba_image = image.to_rgba8();
    let lines = overlay_lines(record);

    let width = rgba_image.width();
    let height = panel_height(lines.len(), config);
    if width > 0 && height > 0 {
        let panel = RgbaImage::from_pixel(width, height, config.panel_color);
        imageops::overlay(&mut rgba_image, &panel, 0, 0);
    }

    if let Some(font) = &font.font {
        let last = lines.len() - 1;
        for (i, line) in lines.iter().enumerate() {
            // Only the comment line is drawn small
            let size = if i == last && record.has_comment() {
                config.small_font_size
            } else {
                config.font_size
            };
            let y = config.padding + i as u32 * config.line_height;
            draw_text_mut(
                &mut rgba_image,
                config.text_color,
                config.padding as i32,
                y as i32,
                PxScale::from(size),
                font,
                line,
            );
        }
    }

    // Flatten for JPEG
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba_image).to_rgb8())
}
