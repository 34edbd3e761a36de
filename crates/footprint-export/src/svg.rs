//! SVG export serializer.
//!
//! Builds a standalone SVG document with the [`svg`] crate. Shapes keep
//! the scene's memoized path data in projected coordinates and share one
//! `<g transform>` that maps them into the cropped output frame, so the
//! file stays as small as the live map.
//!
//! Every region path carries the class `region`, plus `visited` when the
//! region is in the selection, and a `data-name` attribute. Text is
//! XML-escaped by the `svg` crate.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::{Description, Element, Group, Path, Rectangle, Title};
use svg::node::{Node, Text};

use footprint_core::{MapConfig, MapScene, Point, SelectionStore, Size, ViewTransform};

use crate::colors::{MapColors, css_hex};
use crate::crop::ExportFrame;

/// Label font size in screen pixels.
const LABEL_FONT_SIZE: f64 = 11.0;

/// Parameters for [`to_svg`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgOptions<'a> {
    /// Document title, emitted as `<title>`.
    pub title: Option<&'a str>,
    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,
    /// Draw a name label at the anchor of each visited region.
    pub labels: bool,
    /// Margin around the content, in screen pixels.
    pub padding: f64,
    /// On-screen map size. When set, only content inside it is exported.
    pub viewport: Option<Size>,
    /// Outline width, in screen pixels.
    pub stroke_width: f64,
    /// Palette.
    pub colors: MapColors,
}

impl Default for SvgOptions<'_> {
    fn default() -> Self {
        Self::from_config(&MapConfig::default(), MapColors::default())
    }
}

impl SvgOptions<'_> {
    /// Options using the export padding from `config`, no metadata and
    /// no labels.
    #[must_use]
    pub const fn from_config(config: &MapConfig, colors: MapColors) -> Self {
        Self {
            title: None,
            description: None,
            labels: false,
            padding: config.export_padding,
            viewport: None,
            stroke_width: 0.5,
            colors,
        }
    }
}

/// Serialize `scene` as it appears under `transform` to an SVG string.
///
/// The document is cropped to the transformed content plus
/// `options.padding`. A scene with nothing to draw yields a valid,
/// zero-size document.
#[must_use]
pub fn to_svg(
    scene: &MapScene,
    selection: &SelectionStore,
    transform: &ViewTransform,
    options: &SvgOptions<'_>,
) -> String {
    let frame = ExportFrame::around(scene, transform, options.padding, options.viewport).unwrap_or(ExportFrame {
        origin: Point::new(0.0, 0.0),
        width: 0.0,
        height: 0.0,
    });
    let width = round2(frame.width);
    let height = round2(frame.height);

    let mut doc = Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (0.0, 0.0, width, height));

    if let Some(title) = options.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = options.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }
    if let Some(background) = options.colors.background {
        doc = doc.add(
            Rectangle::new()
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", css_hex(background)),
        );
    }

    // Shift the live transform so the frame's origin lands at (0, 0).
    let placed = ViewTransform {
        scale: transform.scale,
        translate: Point::new(
            round2(transform.translate.x - frame.origin.x),
            round2(transform.translate.y - frame.origin.y),
        ),
    };
    let mut regions = Group::new()
        .set("class", "regions")
        .set("transform", placed.svg_attr())
        .set("fill-rule", "evenodd")
        .set("stroke", css_hex(options.colors.border))
        .set("stroke-width", options.stroke_width)
        .set("stroke-linejoin", "round");
    let mut visited = Vec::new();
    for shape in scene.shapes() {
        let is_visited = selection.contains(&shape.name);
        let (class, fill) = if is_visited {
            visited.push(shape);
            ("region visited", options.colors.visited)
        } else {
            ("region", options.colors.land)
        };
        regions = regions.add(
            Path::new()
                .set("class", class)
                .set("data-name", shape.name.as_str())
                .set("fill", css_hex(fill))
                .set("vector-effect", "non-scaling-stroke")
                .set("d", shape.path.as_str()),
        );
    }
    doc = doc.add(regions);

    if options.labels && !visited.is_empty() {
        visited.sort_by(|a, b| footprint_core::stats::compare_names(&a.name, &b.name));
        let mut labels = Group::new()
            .set("class", "labels")
            .set("font-family", "sans-serif")
            .set("font-size", LABEL_FONT_SIZE)
            .set("text-anchor", "middle")
            .set("fill", css_hex(options.colors.label));
        for shape in visited {
            let at = frame.to_output(transform.apply(shape.anchor), 1.0);
            if !at.is_finite() {
                continue;
            }
            let mut text = Element::new("text");
            text.assign("x", round2(at.x));
            text.assign("y", round2(at.y));
            text.append(Text::new(shape.name.as_str()));
            labels = labels.add(text);
        }
        doc = doc.add(labels);
    }

    tracing::debug!(
        shapes = scene.shapes().len(),
        visited = selection.len(),
        labels = options.labels,
        "serialized SVG export"
    );
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
