/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use atelier_core::{ElementKind, ElementSize, Scene, Selection, ShapeType, Space, TextAlign};
use dioxus::prelude::*;

/// Live HTML preview of a scene. The browser composes the same layers the
/// rasterizer draws, so what the user edits matches the export.
pub fn render_to_rsx(scene: &Scene, selection: Option<&Selection>) -> Element {
    let container_style = container_style(scene);

    rsx! {
        div {
            class: "atelier-canvas",
            style: "{container_style}",
            for element in scene.draw_order() {
                {
                    let style = element_style(scene, element);
                    let selected = selection.is_some_and(|s| s.contains(element.id));
                    let class = if selected { "atelier-element selected" } else { "atelier-element" };
                    let key = element.id.to_string();

                    match &element.kind {
                        ElementKind::Image(img) => match img.source_url() {
                            Some(src) => rsx! {
                                img { key: "{key}", class: "{class}", src: "{src}", style: "{style}", draggable: "false" }
                            },
                            None => rsx! {
                                div { key: "{key}", class: "{class} pending", style: "{style} border: 1px dashed #9ca3af;" }
                            },
                        },
                        ElementKind::Shape(_) => rsx! {
                            div { key: "{key}", class: "{class}", style: "{style}" }
                        },
                        ElementKind::Text(text) => rsx! {
                            div { key: "{key}", class: "{class}", style: "{style}", "{text.text}" }
                        },
                    }
                }
            }
        }
    }
}

pub fn container_style(scene: &Scene) -> String {
    let mut style = format!(
        "position: relative; width: {}px; height: {}px; background-color: {}; overflow: hidden;",
        scene.canvas.width, scene.canvas.height, scene.canvas.background
    );
    if let Some(bg) = &scene.canvas.background_image {
        style.push_str(&format!(
            " background-image: url('{bg}'); background-size: cover; background-position: center;"
        ));
    }
    style
}

/// Absolute placement plus the kind-specific look of one element.
pub fn element_style(scene: &Scene, element: &atelier_core::Element) -> String {
    let rotate = if element.rotation != 0.0 {
        format!(" rotate({}deg)", element.rotation)
    } else {
        String::new()
    };

    let unit = match scene.space {
        Space::Percent => "%",
        Space::Pixel => "px",
    };
    let mut style = format!(
        "position: absolute; left: {}{unit}; top: {}{unit};",
        element.position.x, element.position.y
    );

    match &element.kind {
        ElementKind::Text(text) => {
            let shift = match text.text_align {
                TextAlign::Left => "0",
                TextAlign::Center => "-50%",
                TextAlign::Right => "-100%",
            };
            let font_style = match text.font_style {
                atelier_core::FontStyle::Normal => "normal",
                atelier_core::FontStyle::Italic => "italic",
            };
            style.push_str(&format!(
                " font-size: {}px; font-family: {}; font-weight: {}; font-style: {font_style}; color: {}; white-space: pre; line-height: 1.2; transform: translate({shift}, -50%){rotate};",
                text.font_size, text.font_family, text.font_weight, text.text_color
            ));
        }
        _ => {
            style.push_str(&size_style(element));
            let translate = match scene.space {
                Space::Percent => "translate(-50%, -50%)",
                Space::Pixel => "translate(0, 0)",
            };
            style.push_str(&format!(" transform: {translate}{rotate};"));
        }
    }

    match &element.kind {
        ElementKind::Image(img) if !img.filters.is_identity() => {
            style.push_str(&format!(" filter: {}; object-fit: contain;", img.filters.css_filter()));
        }
        ElementKind::Image(_) => style.push_str(" object-fit: contain;"),
        ElementKind::Shape(shape) => {
            style.push_str(&format!(" background-color: {}; box-sizing: border-box;", shape.fill_color));
            if shape.stroke_width > 0.0 {
                style.push_str(&format!(" border: {}px solid {};", shape.stroke_width, shape.stroke_color));
            }
            if shape.shape_type == ShapeType::Circle {
                style.push_str(" border-radius: 50%;");
            }
        }
        ElementKind::Text(_) => {}
    }

    style
}

fn size_style(element: &atelier_core::Element) -> String {
    let ratio = element.aspect_ratio.filter(|_| element.maintain_aspect_ratio);
    match (element.size, ratio) {
        (ElementSize::Percent { value }, Some(ratio)) => {
            format!(" width: {value}%; aspect-ratio: {ratio};")
        }
        (ElementSize::Percent { value }, None) => format!(" width: {value}%; height: {value}%;"),
        (ElementSize::Pixels { width, .. }, Some(ratio)) => {
            format!(" width: {width}px; aspect-ratio: {ratio};")
        }
        (ElementSize::Pixels { width, height }, None) => format!(" width: {width}px; height: {height}px;"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{Element, Filters, ImageSource, Point, TextContent};

    #[test]
    fn percent_elements_are_centred() {
        let mut scene = Scene::new(Space::Percent, 800, 600);
        let id = scene.add(
            Element::image(Point::new(25.0, 40.0), ElementSize::percent(30.0))
                .with_source(ImageSource::Permanent("a.png".into()))
                .with_aspect_ratio(2.0)
                .with_rotation(90.0),
        );
        let style = element_style(&scene, scene.get(id).unwrap());
        assert!(style.contains("left: 25%; top: 40%;"));
        assert!(style.contains("width: 30%; aspect-ratio: 2;"));
        assert!(style.contains("transform: translate(-50%, -50%) rotate(90deg);"));
        assert!(!style.contains("filter"));
    }

    #[test]
    fn filters_and_shapes_map_to_css() {
        let mut scene = Scene::new(Space::Pixel, 500, 500);
        let mut image = Element::image(Point::new(10.0, 20.0), ElementSize::pixels(100.0, 80.0));
        if let Some(img) = image.image_content_mut() {
            img.filters = Filters { brightness: 120.0, ..Filters::default() };
        }
        let image = scene.add(image);
        let circle = scene.add(Element::shape(ShapeType::Circle, Point::new(0.0, 0.0), ElementSize::pixels(50.0, 50.0)));

        let style = element_style(&scene, scene.get(image).unwrap());
        assert!(style.contains("left: 10px; top: 20px;"));
        assert!(style.contains("width: 100px; height: 80px;"));
        assert!(style.contains("filter: brightness(120%) contrast(100%) hue-rotate(0deg) saturate(100%);"));

        let style = element_style(&scene, scene.get(circle).unwrap());
        assert!(style.contains("border-radius: 50%;"));
        assert!(style.contains("background-color: #3b82f6;"));
    }

    #[test]
    fn text_shifts_with_alignment() {
        let mut scene = Scene::new(Space::Percent, 800, 600);
        let mut content = TextContent::new("Hi", 24.0);
        content.text_align = TextAlign::Right;
        let id = scene.add(Element::text(content, Point::new(50.0, 50.0), ElementSize::percent(20.0)));
        let style = element_style(&scene, scene.get(id).unwrap());
        assert!(style.contains("transform: translate(-100%, -50%);"));
        assert!(style.contains("font-size: 24px;"));
    }

    #[test]
    fn container_carries_background_image() {
        let mut scene = Scene::new(Space::Percent, 320, 240);
        scene.canvas.background_image = Some("templates/tote-bag.png".into());
        let style = container_style(&scene);
        assert!(style.starts_with("position: relative; width: 320px; height: 240px; background-color: #ffffff;"));
        assert!(style.contains("url('templates/tote-bag.png')"));
    }
}
