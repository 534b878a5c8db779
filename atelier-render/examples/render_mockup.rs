use atelier_core::{
    Element, ElementSize, Filters, ImageSource, Point, Scene, ShapeType, Space, TextContent, WatermarkConfig,
};
use atelier_render::{Renderer, Resources};
use image::{ImageFormat, Rgba, RgbaImage};
use std::fs;
use std::io::Cursor;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut logo = RgbaImage::new(100, 100);
    for (x, y, px) in logo.enumerate_pixels_mut() {
        *px = if (x / 10 + y / 10) % 2 == 0 {
            Rgba([220, 40, 40, 255])
        } else {
            Rgba([40, 40, 220, 255])
        };
    }
    let mut logo_bytes = Vec::new();
    logo.write_to(&mut Cursor::new(&mut logo_bytes), ImageFormat::Png)?;
    info!(size = logo_bytes.len(), "logo resource created");

    let mut resources = Resources::new();
    resources.insert("logo.png".to_string(), logo_bytes);

    let mut scene = Scene::new(Space::Percent, 800, 600);
    scene.canvas.background = "#f5efe0".to_string();
    scene.canvas.watermark = Some(WatermarkConfig {
        enabled: true,
        ..WatermarkConfig::default()
    });

    scene.add(Element::shape(ShapeType::Circle, Point::new(50.0, 50.0), ElementSize::percent(45.0)));

    let mut logo_element = Element::image(Point::new(50.0, 45.0), ElementSize::percent(25.0))
        .with_source(ImageSource::Permanent("logo.png".into()))
        .with_rotation(15.0);
    if let Some(img) = logo_element.image_content_mut() {
        img.filters = Filters {
            saturation: 140.0,
            hue: 30.0,
            ..Filters::default()
        };
    }
    scene.add(logo_element);

    let mut caption = TextContent::new("Atelier Coffee", 40.0);
    caption.font_weight = 700;
    caption.text_color = "#1f2937".to_string();
    scene.add(Element::text(caption, Point::new(50.0, 85.0), ElementSize::percent(40.0)));

    let mut renderer = Renderer::new();
    let artifact = renderer.export(&scene, &resources, "mockup")?;
    fs::write(&artifact.file_name, &artifact.bytes)?;
    info!(file = %artifact.file_name, "saved");

    Ok(())
}
