// Rendering with real fonts. Every test returns early on machines without
// any installed font; set TILEMARK_FONT_DIR to point at one.

use super::test_harness::system_fonts;
use base64::Engine;
use tilemark::dom::{Document, MemoryDocument};
use tilemark::surface::GlyphCanvas;
use tilemark::{Watermark, WatermarkOptions};

fn decode_data_url(url: &str) -> image::RgbaImage {
    let payload = url
        .strip_prefix("data:image/png;base64,")
        .expect("png data url");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .unwrap();
    image::load_from_memory(&bytes).unwrap().to_rgba8()
}

#[test]
fn test_rendered_tile_is_decodable_png_of_raster_size() {
    let Some(fonts) = system_fonts() else { return };
    let mut doc = MemoryDocument::with_line_metrics(fonts.clone());
    let options = WatermarkOptions::new()
        .text("  WATERMARK  ")
        .font("24px sans-serif")
        .fill_style("rgba(200, 0, 0, 0.5)");

    let watermark = Watermark::create(GlyphCanvas::new(fonts), &mut doc, &options).unwrap();
    let tile = watermark.last_tile().unwrap();
    let image = decode_data_url(&tile.data_url);

    assert_eq!(image.dimensions(), (tile.raster_width, tile.raster_height));
    assert_eq!(
        watermark.surface().image().dimensions(),
        (tile.raster_width, tile.raster_height)
    );
}

#[test]
fn test_rendered_tile_has_translucent_ink() {
    let Some(fonts) = system_fonts() else { return };
    let mut doc = MemoryDocument::with_line_metrics(fonts.clone());
    let options = WatermarkOptions::new()
        .text("WATERMARK")
        .font("bold 32px sans-serif")
        .fill_style("rgba(0, 0, 255, 0.5)")
        .degree(-22.0);

    let watermark = Watermark::create(GlyphCanvas::new(fonts), &mut doc, &options).unwrap();
    let image = watermark.surface().image();

    let inked: Vec<_> = image.pixels().filter(|p| p[3] > 0).collect();
    assert!(!inked.is_empty(), "text should cover some pixels");
    // Source-over on a transparent surface never exceeds the fill alpha
    assert!(inked.iter().all(|p| p[3] <= 128));
    assert!(inked.iter().all(|p| p[0] == 0 && p[1] == 0));
}

#[test]
fn test_ink_stays_inside_rotated_text_box() {
    let Some(fonts) = system_fonts() else { return };
    let mut doc = MemoryDocument::with_line_metrics(fonts.clone());
    let options = WatermarkOptions::new()
        .text("MARK")
        .font("40px sans-serif")
        .fill_style("#000")
        .degree(0.0);

    let watermark = Watermark::create(GlyphCanvas::new(fonts), &mut doc, &options).unwrap();
    let tile = watermark.last_tile().unwrap();
    let image = watermark.surface().image();

    // Unrotated, the tile is the text box; ink must touch its middle row
    let middle = tile.raster_height / 2;
    assert!((0..image.width()).any(|x| image.get_pixel(x, middle)[3] > 0));
}

#[test]
fn test_html_export_references_tile() {
    let Some(fonts) = system_fonts() else { return };
    let mut doc = MemoryDocument::with_line_metrics(fonts.clone());
    let watermark =
        Watermark::create(GlyphCanvas::new(fonts), &mut doc, &WatermarkOptions::default()).unwrap();

    let html = doc.to_html();
    assert!(html.contains("background-image: url(data:image/png;base64,"));
    assert!(html.contains("z-index: 9999"));
    assert_eq!(doc.children(doc.body()), vec![watermark.overlay().unwrap()]);
}

#[test]
fn test_png_bytes_match_data_url() {
    let Some(fonts) = system_fonts() else { return };
    let mut doc = MemoryDocument::with_line_metrics(fonts.clone());
    let options = WatermarkOptions::new().text("PNG").font("16px sans-serif");

    let watermark = Watermark::create(GlyphCanvas::new(fonts), &mut doc, &options).unwrap();
    let png = watermark.surface().png_bytes().unwrap();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&png);

    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    assert_eq!(
        watermark.last_tile().unwrap().data_url,
        format!("data:image/png;base64,{}", encoded)
    );
}

#[test]
fn test_low_alpha_hsl_fill_stays_translucent() {
    let Some(fonts) = system_fonts() else { return };
    let mut doc = MemoryDocument::with_line_metrics(fonts.clone());
    let options = WatermarkOptions::new()
        .text("WATERMARK")
        .font("bold 32px sans-serif")
        .fill_style("hsla(0, 0%, 0%, 0.05)");

    let watermark = Watermark::create(GlyphCanvas::new(fonts), &mut doc, &options).unwrap();
    let image = watermark.surface().image();

    let max_alpha = image.pixels().map(|p| p[3]).max().unwrap_or(0);
    assert!(max_alpha > 0, "text should cover some pixels");
    // round(0.05 * 255)
    assert!(max_alpha <= 13, "max alpha {}", max_alpha);
}
