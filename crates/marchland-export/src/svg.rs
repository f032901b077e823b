//! SVG export serializer.
//!
//! Converts traced borders into an SVG string using the [`svg`] crate for
//! document construction, XML escaping, and path data formatting.
//!
//! Each border becomes a `<g id="border-{id}" data-regions="{a}-{b}">`
//! group holding one `<path>` per polyline. Border coordinates are
//! normalized with `v` growing upward; they are scaled to pixels and
//! flipped onto SVG's downward y axis.
//!
//! Optional [`SvgMetadata`] embeds `<title>`, `<desc>`, and the trace
//! configuration so exported files can be identified and reproduced.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Group, Path, Title};
use svg::node::{Node, Text, Value};

use marchland_trace::{Border, BorderRenderer, Dimensions, Point, Polyline};

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped by the `svg`
/// crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized [`TraceConfig`](marchland_trace::TraceConfig), emitted
    /// inside `<metadata>` wrapped in a namespaced `<marchland:trace>`
    /// element.
    pub config_json: Option<&'a str>,
}

/// Stroke styling and output scale.
#[derive(Debug, Clone)]
pub struct SvgStyle<'a> {
    /// Stroke color for every border path.
    pub stroke: &'a str,
    /// Stroke width in output units.
    pub stroke_width: f64,
    /// Output units per raster pixel.
    pub scale: f64,
}

impl Default for SvgStyle<'_> {
    fn default() -> Self {
        Self {
            stroke: "black",
            stroke_width: 1.0,
            scale: 1.0,
        }
    }
}

/// Map a normalized point onto the pixel grid, flipping `v`.
fn to_pixels(p: Point, dimensions: Dimensions, scale: f64) -> (f64, f64) {
    let w = f64::from(dimensions.width) * scale;
    let h = f64::from(dimensions.height) * scale;
    (p.x * w, (1.0 - p.y) * h)
}

fn path_data(polyline: &Polyline, dimensions: Dimensions, scale: f64) -> String {
    let points = polyline.points();
    if points.len() < 2 {
        return String::new();
    }

    let mut data = Data::new().move_to(to_pixels(points[0], dimensions, scale));
    for &p in &points[1..] {
        data = data.line_to(to_pixels(p, dimensions, scale));
    }
    String::from(Value::from(data))
}

/// Build an SVG path `d` attribute string from a normalized polyline.
///
/// Uses `M` for the first point and `L` for subsequent points, in the
/// pixel space of `dimensions` with y pointing down. Returns an empty
/// string for polylines with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use marchland_trace::{Dimensions, Point, Polyline};
/// use marchland_export::build_path_data;
///
/// let seam = Polyline::new(vec![Point::new(0.5, 1.0), Point::new(0.5, 0.0)]);
/// let dims = Dimensions { width: 4, height: 4 };
/// assert_eq!(build_path_data(&seam, dims), "M2,0 L2,4");
/// ```
#[must_use]
pub fn build_path_data(polyline: &Polyline, dimensions: Dimensions) -> String {
    path_data(polyline, dimensions, 1.0)
}

/// Incremental SVG builder fed one border at a time.
///
/// Hand it to [`TraceOutput::render_with`](marchland_trace::TraceOutput::render_with)
/// and call [`finish`](Self::finish) for the document string.
pub struct SvgRenderer<'a> {
    document: Document,
    dimensions: Dimensions,
    style: SvgStyle<'a>,
    paths: usize,
}

impl<'a> SvgRenderer<'a> {
    /// Start a document sized to `dimensions` times [`SvgStyle::scale`].
    #[must_use]
    pub fn new(dimensions: Dimensions, metadata: &SvgMetadata<'_>, style: SvgStyle<'a>) -> Self {
        let w = f64::from(dimensions.width) * style.scale;
        let h = f64::from(dimensions.height) * style.scale;
        let mut document = Document::new()
            .set("width", w)
            .set("height", h)
            .set("viewBox", (0, 0, w, h));

        if let Some(title) = metadata.title {
            document = document.add(Title::new(title));
        }

        if let Some(description) = metadata.description {
            document = document.add(Description::new().add(Text::new(description)));
        }

        if let Some(config_json) = metadata.config_json {
            let mut trace_el = Element::new("marchland:trace");
            trace_el.assign("xmlns:marchland", "https://marchland.dev/ns/1");
            trace_el.append(Text::new(config_json));
            let mut metadata_el = Element::new("metadata");
            metadata_el.append(trace_el);
            document = document.add(metadata_el);
        }

        Self {
            document,
            dimensions,
            style,
            paths: 0,
        }
    }

    /// Number of `<path>` elements written so far.
    #[must_use]
    pub const fn path_count(&self) -> usize {
        self.paths
    }

    /// Close the document and return it with an XML declaration.
    #[must_use]
    pub fn finish(self) -> String {
        // The svg crate omits the XML declaration, so we prepend it.
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}\n",
            self.document
        )
    }
}

impl BorderRenderer for SvgRenderer<'_> {
    fn render(&mut self, border: &Border) {
        let mut group = Group::new()
            .set("id", format!("border-{}", border.id()))
            .set(
                "data-regions",
                format!("{}-{}", border.region_a(), border.region_b()),
            );
        // Polylines with fewer than 2 points cannot form a visible segment.
        for polyline in border.polylines() {
            let d = path_data(polyline, self.dimensions, self.style.scale);
            if d.is_empty() {
                continue;
            }
            group = group.add(
                Path::new()
                    .set("d", d)
                    .set("fill", "none")
                    .set("stroke", self.style.stroke)
                    .set("stroke-width", self.style.stroke_width),
            );
            self.paths += 1;
        }
        self.document.append(group);
    }
}

/// Serialize borders into an SVG document string.
///
/// Borders are written in slice order, one group each; a border with no
/// drawable polyline still gets an empty group so ids stay addressable.
///
/// # Examples
///
/// ```
/// use marchland_trace::Dimensions;
/// use marchland_export::{SvgMetadata, SvgStyle, to_svg};
///
/// let dims = Dimensions { width: 8, height: 6 };
/// let svg = to_svg(&[], dims, &SvgMetadata::default(), &SvgStyle::default());
/// assert!(svg.contains(r#"viewBox="0 0 8 6""#));
/// ```
#[must_use]
pub fn to_svg(
    borders: &[Border],
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
    style: &SvgStyle<'_>,
) -> String {
    let mut renderer = SvgRenderer::new(dimensions, metadata, style.clone());
    for border in borders {
        renderer.render(border);
    }
    renderer.finish()
}
