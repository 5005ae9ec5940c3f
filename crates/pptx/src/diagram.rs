//! Diagram specification → single-slide editable PPTX.
//!
//! Design units map linearly onto the area below the title. Nodes are clamped
//! to the slide so a generator that lays out past the canvas still produces a
//! usable drawing. Fills come from the palette by node layer; the brand chrome
//! is the same as on deck slides.

use crate::package;
use crate::shape::{
    inches, Align, Anchor, Connector, Dash, Fill, Geometry, Outline, Paragraph, Rect, Shape,
    TextFrame, TextStyle, SLIDE_HEIGHT, SLIDE_WIDTH,
};
use crate::writer::{DeckRenderer, SlideDrawing};
use deck_core::diagram::{Bounds, DiagramNode, DiagramSpec, LineStyle, NodeShape};
use deck_core::{BrandPalette, Result, Rgb, BRAND, WHITE};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

/// EMU per design unit; 1333 units span the slide width.
pub const EMU_PER_UNIT: f64 = 6_858.0;

/// Top of the canvas, below the title (0.75in).
pub const CANVAS_TOP: i64 = 685_800;

/// Title used when the specification has none.
pub const DEFAULT_TITLE: &str = "Diagram";

/// Renders diagram specifications into PPTX packages.
#[derive(Debug, Clone, Copy)]
pub struct DiagramRenderer<'p> {
    palette: &'p BrandPalette,
}

impl Default for DiagramRenderer<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramRenderer<'static> {
    pub fn new() -> Self {
        Self { palette: &BRAND }
    }
}

impl<'p> DiagramRenderer<'p> {
    pub fn with_palette(palette: &'p BrandPalette) -> Self {
        Self { palette }
    }

    /// The diagram slide, chrome included. Containers sit below nodes and
    /// connectors above them.
    pub fn draw(&self, spec: &DiagramSpec) -> SlideDrawing {
        let p = self.palette;
        let mut drawing = SlideDrawing::new(WHITE);

        drawing.push(Shape::text_box(
            "Title",
            Rect::inches(0.5, 0.15, 9.0, 0.55),
            TextFrame::single(Paragraph::new(
                title(spec),
                TextStyle::new(p.title_font, 24.0, p.primary).bold(),
            )),
        ));

        for container in &spec.containers {
            let Some(bounds) = spec.container_bounds(container) else {
                log::debug!("Container '{}' has no known nodes; skipped", container.id);
                continue;
            };
            let rect = canvas_rect(&bounds);
            let name = format!("Container {}", container.id);
            drawing.push(
                Shape::rectangle(name, rect, Fill::Solid(p.light_gray))
                    .with_geometry(Geometry::RoundRect)
                    .with_outline(Outline {
                        color: p.accent,
                        width_pt: 1.0,
                    }),
            );
            if !container.label.trim().is_empty() {
                let label_height = inches(0.3);
                drawing.push(Shape::text_box(
                    format!("Container Label {}", container.id),
                    Rect {
                        x: rect.x,
                        y: (rect.y - label_height).max(0),
                        cx: rect.cx,
                        cy: label_height,
                    },
                    TextFrame::single(Paragraph::new(
                        container.label.trim(),
                        TextStyle::new(p.body_font, 11.0, p.text_light).bold(),
                    )),
                ));
            }
        }

        for node in &spec.nodes {
            drawing.push(self.node_shape(node));
        }

        for (idx, (connection, from, to)) in spec.resolved_connections().enumerate() {
            let start = canvas_rect(&from.bounds()).center();
            let end = canvas_rect(&to.bounds()).center();
            let mut connector = Connector::arrow(
                format!("Connector {}", idx + 1),
                start,
                end,
                p.text,
            );
            connector.dash = match connection.line_style() {
                LineStyle::Solid => Dash::Solid,
                LineStyle::Dashed => Dash::Dashed,
                LineStyle::Dotted => Dash::Dotted,
            };
            connector.start_arrow = connection.arrow_at_source();
            connector.end_arrow = connection.arrow_at_target();
            drawing.connectors.push(connector);

            if !connection.label.trim().is_empty() {
                let width = inches(1.6);
                let height = inches(0.3);
                drawing.push(Shape::text_box(
                    format!("Connector Label {}", idx + 1),
                    Rect {
                        x: ((start.0 + end.0) / 2 - width / 2).clamp(0, SLIDE_WIDTH - width),
                        y: ((start.1 + end.1) / 2 - height).clamp(0, SLIDE_HEIGHT - height),
                        cx: width,
                        cy: height,
                    },
                    TextFrame::single(
                        Paragraph::new(
                            connection.label.trim(),
                            TextStyle::new(p.caption_font, 9.0, p.text_light),
                        )
                        .aligned(Align::Center),
                    ),
                ));
            }
        }

        for (idx, annotation) in spec.annotations.iter().enumerate() {
            if annotation.text.trim().is_empty() {
                continue;
            }
            let rect = canvas_rect(&Bounds {
                x: annotation.position.x,
                y: annotation.position.y,
                width: 300.0,
                height: 55.0,
            });
            drawing.push(Shape::text_box(
                format!("Annotation {}", idx + 1),
                rect,
                TextFrame::single(Paragraph::new(
                    annotation.text.trim(),
                    TextStyle::new(p.caption_font, 10.0, p.text_light).italic(),
                )),
            ));
        }

        DeckRenderer::with_palette(p).apply_chrome(&mut drawing, 1, 1);
        drawing
    }

    /// Write the one-slide package to `writer` and return it.
    pub fn write<W: Write + Seek>(&self, spec: &DiagramSpec, writer: W) -> Result<W> {
        package::write_package(&[self.draw(spec)], title(spec), self.palette, writer)
    }

    /// Render to `path`. The file appears only once it is completely written.
    pub fn render_to_path(&self, spec: &DiagramSpec, path: &Path) -> Result<PathBuf> {
        package::persist(path, |file| self.write(spec, file).map(drop))?;
        log::info!(
            "Rendered diagram '{}' ({} nodes, {} connections) to {}",
            title(spec),
            spec.nodes.len(),
            spec.connections.len(),
            path.display()
        );
        Ok(path.to_path_buf())
    }

    fn node_shape(&self, node: &DiagramNode) -> Shape {
        let p = self.palette;
        let mut paragraphs = vec![Paragraph::new(
            node.label.trim(),
            TextStyle::new(p.title_font, 12.0, WHITE).bold(),
        )
        .aligned(Align::Center)];
        if !node.description.trim().is_empty() {
            paragraphs.push(
                Paragraph::new(node.description.trim(), TextStyle::new(p.body_font, 9.0, WHITE))
                    .aligned(Align::Center),
            );
        }

        Shape::rectangle(
            format!("Node {}", node.id),
            canvas_rect(&node.bounds()),
            Fill::Solid(layer_color(p, node.layer)),
        )
        .with_geometry(geometry(node.shape))
        .with_outline(Outline {
            color: WHITE,
            width_pt: 2.0,
        })
        .with_text(TextFrame::new(paragraphs).anchored(Anchor::Middle))
    }
}

fn title(spec: &DiagramSpec) -> &str {
    match spec.title.trim() {
        "" => DEFAULT_TITLE,
        t => t,
    }
}

fn geometry(shape: NodeShape) -> Geometry {
    match shape {
        NodeShape::Rectangle => Geometry::Rect,
        NodeShape::RoundedRectangle => Geometry::RoundRect,
        NodeShape::Circle => Geometry::Ellipse,
        NodeShape::Diamond => Geometry::Diamond,
        NodeShape::Cloud => Geometry::Cloud,
        NodeShape::Cylinder => Geometry::Can,
        NodeShape::Process => Geometry::FlowChartProcess,
        NodeShape::Decision => Geometry::FlowChartDecision,
        NodeShape::Data => Geometry::FlowChartInputOutput,
    }
}

/// Fill of a node: first tier primary, then secondary, accent, dark.
fn layer_color(p: &BrandPalette, layer: Option<u32>) -> Rgb {
    match layer.unwrap_or(1) {
        0 | 1 => p.primary,
        2 => p.secondary,
        3 => p.accent,
        _ => p.dark,
    }
}

fn units(value: f64) -> i64 {
    (value * EMU_PER_UNIT).round() as i64
}

/// Slide rectangle of a design-unit box, kept inside the canvas.
fn canvas_rect(bounds: &Bounds) -> Rect {
    let cx = units(bounds.width).clamp(1, SLIDE_WIDTH);
    let cy = units(bounds.height).clamp(1, SLIDE_HEIGHT - CANVAS_TOP);
    Rect {
        x: units(bounds.x).clamp(0, SLIDE_WIDTH - cx),
        y: (CANVAS_TOP + units(bounds.y)).clamp(CANVAS_TOP, SLIDE_HEIGHT - cy),
        cx,
        cy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::diagram::{Annotation, Connection, Container, Point, Size};

    fn node(id: &str, shape: NodeShape, layer: Option<u32>, x: f64, y: f64) -> DiagramNode {
        DiagramNode {
            id: id.to_string(),
            label: id.to_uppercase(),
            shape,
            layer,
            position: Point { x, y },
            ..DiagramNode::default()
        }
    }

    fn sample() -> DiagramSpec {
        DiagramSpec {
            title: "Order flow".to_string(),
            nodes: vec![
                node("web", NodeShape::Cloud, Some(1), 100.0, 100.0),
                node("db", NodeShape::Cylinder, Some(2), 500.0, 300.0),
            ],
            connections: vec![
                Connection {
                    from: "web".to_string(),
                    to: "db".to_string(),
                    label: "writes".to_string(),
                    kind: "dashed".to_string(),
                    ..Connection::default()
                },
                Connection {
                    from: "web".to_string(),
                    to: "nowhere".to_string(),
                    ..Connection::default()
                },
            ],
            containers: vec![Container {
                id: "backend".to_string(),
                label: "Backend".to_string(),
                nodes: vec!["db".to_string()],
                ..Container::default()
            }],
            annotations: vec![Annotation {
                text: "Peak: 2k rps".to_string(),
                ..Annotation::default()
            }],
            ..DiagramSpec::default()
        }
    }

    #[test]
    fn test_design_units_map_onto_canvas() {
        assert_eq!(units(1333.0 + 1.0 / 3.0), SLIDE_WIDTH);
        let rect = canvas_rect(&Bounds {
            x: 100.0,
            y: 0.0,
            width: 200.0,
            height: 100.0,
        });
        assert_eq!(rect.x, inches(0.75));
        assert_eq!(rect.y, CANVAS_TOP);
        assert_eq!(rect.cx, inches(1.5));
    }

    #[test]
    fn test_nodes_are_clamped_to_the_slide() {
        let rect = canvas_rect(&Bounds {
            x: 5000.0,
            y: -400.0,
            width: 200.0,
            height: 5000.0,
        });
        assert_eq!(rect.x + rect.cx, SLIDE_WIDTH);
        assert_eq!(rect.y, CANVAS_TOP);
        assert_eq!(rect.y + rect.cy, SLIDE_HEIGHT);
    }

    #[test]
    fn test_nodes_shapes_and_layer_fills() {
        let drawing = DiagramRenderer::new().draw(&sample());
        assert_eq!(drawing.background, WHITE);
        assert_eq!(drawing.shape("Title").unwrap().plain_text(), "Order flow");

        let web = drawing.shape("Node web").unwrap();
        assert_eq!(web.geometry, Geometry::Cloud);
        assert_eq!(web.fill, Fill::Solid(BRAND.primary));
        assert_eq!(web.plain_text(), "WEB");
        assert_eq!(web.text.as_ref().unwrap().anchor, Anchor::Middle);

        let db = drawing.shape("Node db").unwrap();
        assert_eq!(db.geometry, Geometry::Can);
        assert_eq!(db.fill, Fill::Solid(BRAND.secondary));
    }

    #[test]
    fn test_containers_sit_below_nodes() {
        let drawing = DiagramRenderer::new().draw(&sample());
        let position = |name: &str| drawing.shapes.iter().position(|s| s.name == name).unwrap();
        assert!(position("Container backend") < position("Node db"));

        let container = drawing.shape("Container backend").unwrap();
        assert_eq!(container.geometry, Geometry::RoundRect);
        assert_eq!(container.fill, Fill::Solid(BRAND.light_gray));
        // Padded box around the single node
        let db = drawing.shape("Node db").unwrap();
        assert!(container.rect.x < db.rect.x && container.rect.y < db.rect.y);
        assert_eq!(
            drawing.shape("Container Label backend").unwrap().plain_text(),
            "Backend"
        );
    }

    #[test]
    fn test_connectors_join_node_centers() {
        let drawing = DiagramRenderer::new().draw(&sample());
        // The dangling connection is dropped
        assert_eq!(drawing.connectors.len(), 1);

        let connector = &drawing.connectors[0];
        assert_eq!(connector.from, drawing.shape("Node web").unwrap().rect.center());
        assert_eq!(connector.to, drawing.shape("Node db").unwrap().rect.center());
        assert_eq!(connector.dash, Dash::Dashed);
        assert!(connector.end_arrow && !connector.start_arrow);
        assert_eq!(drawing.shape("Connector Label 1").unwrap().plain_text(), "writes");

        let xml = drawing.to_xml().unwrap();
        // Connectors come after every shape
        assert!(xml.rfind("<p:sp>").unwrap() < xml.find("<p:cxnSp>").unwrap());
    }

    #[test]
    fn test_annotations_and_chrome() {
        let drawing = DiagramRenderer::new().draw(&sample());
        let note = drawing.shape("Annotation 1").unwrap();
        assert_eq!(note.plain_text(), "Peak: 2k rps");
        assert!(note.text.as_ref().unwrap().paragraphs[0].style.italic);

        assert!(drawing.shape("Header Band").is_some());
        assert_eq!(drawing.shape("Wordmark").unwrap().plain_text(), BRAND.wordmark);
    }

    #[test]
    fn test_empty_spec_still_draws_a_slide() {
        let drawing = DiagramRenderer::new().draw(&DiagramSpec::default());
        assert_eq!(drawing.shape("Title").unwrap().plain_text(), DEFAULT_TITLE);
        assert!(drawing.connectors.is_empty());
        let node = DiagramNode {
            size: Size {
                width: 0.0,
                height: -5.0,
            },
            ..DiagramNode::default()
        };
        let shape = DiagramRenderer::new().node_shape(&node);
        assert!(shape.rect.cx > 0 && shape.rect.cy > 0);
    }
}
