//! Shapes drawn on a slide and their DrawingML serialization.
//!
//! Every shape is either a text box or a filled preset geometry (which may
//! also carry text); connectors are straight lines between two points. Text is
//! always written as real runs so it stays editable.

use deck_core::Rgb;
use quick_xml::escape::escape;
use std::fmt::Write as FmtWrite;

/// EMUs per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Slide width: 10in.
pub const SLIDE_WIDTH: i64 = 9_144_000;

/// Slide height: 5.625in (16:9).
pub const SLIDE_HEIGHT: i64 = 5_143_500;

/// Language tag written on every run.
const LANG: &str = "fr-FR";

/// Left margin per nesting level, in EMU.
const LEVEL_MARGIN: i64 = 342_900;

/// Hanging indent of bulleted paragraphs, in EMU.
const HANGING_INDENT: i64 = 228_600;

/// Convert inches to EMU.
pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH).round() as i64
}

/// Position and size in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Rect {
    /// Rectangle from inch coordinates.
    pub fn inches(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: inches(x),
            y: inches(y),
            cx: inches(width),
            cy: inches(height),
        }
    }

    /// Center point.
    pub fn center(&self) -> (i64, i64) {
        (self.x + self.cx / 2, self.y + self.cy / 2)
    }
}

/// Shape fill.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    None,
    Solid(Rgb),
    /// Evenly spaced stops along `angle` degrees.
    Linear { stops: Vec<Rgb>, angle: f64 },
}

/// Shape border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outline {
    pub color: Rgb,
    pub width_pt: f64,
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    fn as_str(&self) -> &'static str {
        match self {
            Align::Left => "l",
            Align::Center => "ctr",
            Align::Right => "r",
        }
    }
}

/// Vertical text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    Top,
    Middle,
}

/// Run formatting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: &'static str,
    pub size_pt: f64,
    pub bold: bool,
    pub italic: bool,
    pub color: Rgb,
}

impl TextStyle {
    /// Regular text in `font` at `size_pt`.
    pub fn new(font: &'static str, size_pt: f64, color: Rgb) -> Self {
        Self {
            font,
            size_pt,
            bold: false,
            italic: false,
            color,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn with_size(mut self, size_pt: f64) -> Self {
        self.size_pt = size_pt;
        self
    }
}

/// One paragraph with a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub style: TextStyle,
    pub align: Align,
    pub level: u8,
    pub space_before_pt: Option<f64>,
    pub bullet: Option<char>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            align: Align::Left,
            level: 0,
            space_before_pt: None,
            bullet: None,
        }
    }

    pub fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn with_space_before(mut self, points: f64) -> Self {
        self.space_before_pt = Some(points);
        self
    }

    pub fn with_bullet(mut self, bullet: char) -> Self {
        self.bullet = Some(bullet);
        self
    }

    fn to_xml(&self, xml: &mut String) -> std::fmt::Result {
        xml.push_str("<a:p>");

        write!(xml, r#"<a:pPr algn="{}""#, self.align.as_str())?;
        if self.level > 0 {
            write!(xml, r#" lvl="{}""#, self.level)?;
        }
        if self.bullet.is_some() {
            let margin = LEVEL_MARGIN * (i64::from(self.level) + 1);
            write!(xml, r#" marL="{}" indent="{}""#, margin, -HANGING_INDENT)?;
        }
        xml.push('>');
        if let Some(points) = self.space_before_pt {
            write!(xml, r#"<a:spcBef><a:spcPts val="{}"/></a:spcBef>"#, (points * 100.0).round() as i64)?;
        }
        match self.bullet {
            Some(ch) => {
                write!(
                    xml,
                    r#"<a:buFont typeface="Arial"/><a:buChar char="{}"/>"#,
                    escape(&ch.to_string())
                )?;
            }
            None => xml.push_str("<a:buNone/>"),
        }
        xml.push_str("</a:pPr>");

        if self.text.is_empty() {
            write!(xml, r#"<a:endParaRPr lang="{}" sz="{}" dirty="0"/>"#, LANG, self.size())?;
        } else {
            xml.push_str("<a:r>");
            write!(xml, r#"<a:rPr lang="{}" sz="{}""#, LANG, self.size())?;
            if self.style.bold {
                xml.push_str(r#" b="1""#);
            }
            if self.style.italic {
                xml.push_str(r#" i="1""#);
            }
            xml.push_str(r#" dirty="0">"#);
            write_solid_fill(xml, self.style.color)?;
            let font = escape(self.style.font);
            write!(xml, r#"<a:latin typeface="{0}"/><a:cs typeface="{0}"/>"#, font)?;
            xml.push_str("</a:rPr>");
            write!(xml, "<a:t>{}</a:t>", escape(&self.text))?;
            xml.push_str("</a:r>");
        }

        xml.push_str("</a:p>");
        Ok(())
    }

    /// Font size in hundredths of a point.
    fn size(&self) -> i64 {
        (self.style.size_pt * 100.0).round() as i64
    }
}

/// Text content of a shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextFrame {
    pub paragraphs: Vec<Paragraph>,
    pub anchor: Anchor,
}

impl TextFrame {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs,
            anchor: Anchor::Top,
        }
    }

    /// A frame holding a single paragraph.
    pub fn single(paragraph: Paragraph) -> Self {
        Self::new(vec![paragraph])
    }

    pub fn anchored(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Paragraph texts joined by `\n`.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_xml(&self, xml: &mut String) -> std::fmt::Result {
        xml.push_str("<p:txBody>");
        let anchor = match self.anchor {
            Anchor::Top => "t",
            Anchor::Middle => "ctr",
        };
        write!(
            xml,
            r#"<a:bodyPr wrap="square" lIns="91440" tIns="45720" rIns="91440" bIns="45720" rtlCol="0" anchor="{}"><a:noAutofit/></a:bodyPr>"#,
            anchor
        )?;
        xml.push_str("<a:lstStyle/>");
        if self.paragraphs.is_empty() {
            write!(xml, r#"<a:p><a:endParaRPr lang="{}" dirty="0"/></a:p>"#, LANG)?;
        }
        for paragraph in &self.paragraphs {
            paragraph.to_xml(xml)?;
        }
        xml.push_str("</p:txBody>");
        Ok(())
    }
}

/// Kind of shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    TextBox,
    Rectangle,
}

/// DrawingML preset geometry of a shape outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Geometry {
    #[default]
    Rect,
    RoundRect,
    Ellipse,
    Diamond,
    Cloud,
    Can,
    FlowChartProcess,
    FlowChartDecision,
    FlowChartInputOutput,
}

impl Geometry {
    /// Value of the `prst` attribute.
    pub fn preset(&self) -> &'static str {
        match self {
            Geometry::Rect => "rect",
            Geometry::RoundRect => "roundRect",
            Geometry::Ellipse => "ellipse",
            Geometry::Diamond => "diamond",
            Geometry::Cloud => "cloud",
            Geometry::Can => "can",
            Geometry::FlowChartProcess => "flowChartProcess",
            Geometry::FlowChartDecision => "flowChartDecision",
            Geometry::FlowChartInputOutput => "flowChartInputOutput",
        }
    }
}

/// A shape on a slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub name: String,
    pub kind: ShapeKind,
    pub geometry: Geometry,
    pub rect: Rect,
    pub fill: Fill,
    /// `None` draws no border.
    pub outline: Option<Outline>,
    pub text: Option<TextFrame>,
}

impl Shape {
    /// A borderless, unfilled text box.
    pub fn text_box(name: impl Into<String>, rect: Rect, frame: TextFrame) -> Self {
        Self {
            name: name.into(),
            kind: ShapeKind::TextBox,
            geometry: Geometry::Rect,
            rect,
            fill: Fill::None,
            outline: None,
            text: Some(frame),
        }
    }

    /// A filled rectangle without border or text.
    pub fn rectangle(name: impl Into<String>, rect: Rect, fill: Fill) -> Self {
        Self {
            name: name.into(),
            kind: ShapeKind::Rectangle,
            geometry: Geometry::Rect,
            rect,
            fill,
            outline: None,
            text: None,
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_outline(mut self, outline: Outline) -> Self {
        self.outline = Some(outline);
        self
    }

    pub fn with_text(mut self, frame: TextFrame) -> Self {
        self.text = Some(frame);
        self
    }

    /// Paragraph texts joined by `\n`; empty for shapes without text.
    pub fn plain_text(&self) -> String {
        self.text.as_ref().map(TextFrame::plain_text).unwrap_or_default()
    }

    /// Serialize as `<p:sp>` with the given shape id.
    pub(crate) fn to_xml(&self, id: u32, xml: &mut String) -> std::fmt::Result {
        xml.push_str("<p:sp>");
        xml.push_str("<p:nvSpPr>");
        write!(xml, r#"<p:cNvPr id="{}" name="{}"/>"#, id, escape(&self.name))?;
        match self.kind {
            ShapeKind::TextBox => xml.push_str(r#"<p:cNvSpPr txBox="1"/>"#),
            ShapeKind::Rectangle => xml.push_str("<p:cNvSpPr/>"),
        }
        xml.push_str("<p:nvPr/>");
        xml.push_str("</p:nvSpPr>");

        xml.push_str("<p:spPr>");
        xml.push_str("<a:xfrm>");
        write!(xml, r#"<a:off x="{}" y="{}"/>"#, self.rect.x, self.rect.y)?;
        write!(xml, r#"<a:ext cx="{}" cy="{}"/>"#, self.rect.cx, self.rect.cy)?;
        xml.push_str("</a:xfrm>");
        write!(xml, r#"<a:prstGeom prst="{}"><a:avLst/></a:prstGeom>"#, self.geometry.preset())?;
        match &self.fill {
            Fill::None => xml.push_str("<a:noFill/>"),
            Fill::Solid(color) => write_solid_fill(xml, *color)?,
            Fill::Linear { stops, angle } => write_linear_fill(xml, stops, *angle)?,
        }
        match &self.outline {
            Some(outline) => {
                write!(xml, r#"<a:ln w="{}">"#, line_width(outline.width_pt))?;
                write_solid_fill(xml, outline.color)?;
                xml.push_str("</a:ln>");
            }
            None => xml.push_str("<a:ln><a:noFill/></a:ln>"),
        }
        xml.push_str("</p:spPr>");

        if let Some(frame) = &self.text {
            frame.to_xml(xml)?;
        }

        xml.push_str("</p:sp>");
        Ok(())
    }
}

/// Dash pattern of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dash {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// A straight connector from one point to another, in EMU.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub name: String,
    pub from: (i64, i64),
    pub to: (i64, i64),
    pub color: Rgb,
    pub width_pt: f64,
    pub dash: Dash,
    /// Arrowhead at `from`.
    pub start_arrow: bool,
    /// Arrowhead at `to`.
    pub end_arrow: bool,
}

impl Connector {
    /// A solid line with an arrowhead at `to`.
    pub fn arrow(name: impl Into<String>, from: (i64, i64), to: (i64, i64), color: Rgb) -> Self {
        Self {
            name: name.into(),
            from,
            to,
            color,
            width_pt: 2.0,
            dash: Dash::Solid,
            start_arrow: false,
            end_arrow: true,
        }
    }

    /// Serialize as `<p:cxnSp>` with the given shape id.
    pub(crate) fn to_xml(&self, id: u32, xml: &mut String) -> std::fmt::Result {
        let (x1, y1) = self.from;
        let (x2, y2) = self.to;

        xml.push_str("<p:cxnSp><p:nvCxnSpPr>");
        write!(xml, r#"<p:cNvPr id="{}" name="{}"/>"#, id, escape(&self.name))?;
        xml.push_str("<p:cNvCxnSpPr/><p:nvPr/></p:nvCxnSpPr>");

        xml.push_str("<p:spPr><a:xfrm");
        // The box is always drawn top-left to bottom-right; flips give direction
        if x2 < x1 {
            xml.push_str(r#" flipH="1""#);
        }
        if y2 < y1 {
            xml.push_str(r#" flipV="1""#);
        }
        xml.push('>');
        write!(xml, r#"<a:off x="{}" y="{}"/>"#, x1.min(x2), y1.min(y2))?;
        write!(xml, r#"<a:ext cx="{}" cy="{}"/>"#, (x2 - x1).abs(), (y2 - y1).abs())?;
        xml.push_str("</a:xfrm>");
        xml.push_str(r#"<a:prstGeom prst="straightConnector1"><a:avLst/></a:prstGeom>"#);

        write!(xml, r#"<a:ln w="{}">"#, line_width(self.width_pt))?;
        write_solid_fill(xml, self.color)?;
        match self.dash {
            Dash::Solid => {}
            Dash::Dashed => xml.push_str(r#"<a:prstDash val="dash"/>"#),
            Dash::Dotted => xml.push_str(r#"<a:prstDash val="sysDot"/>"#),
        }
        if self.start_arrow {
            xml.push_str(r#"<a:headEnd type="triangle"/>"#);
        }
        if self.end_arrow {
            xml.push_str(r#"<a:tailEnd type="triangle"/>"#);
        }
        xml.push_str("</a:ln></p:spPr></p:cxnSp>");
        Ok(())
    }
}

/// Line width in EMU.
fn line_width(points: f64) -> i64 {
    (points * 12_700.0).round() as i64
}

pub(crate) fn write_solid_fill(xml: &mut String, color: Rgb) -> std::fmt::Result {
    write!(xml, r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, color.hex())
}

fn write_linear_fill(xml: &mut String, stops: &[Rgb], angle: f64) -> std::fmt::Result {
    xml.push_str(r#"<a:gradFill rotWithShape="1"><a:gsLst>"#);
    let last = stops.len().saturating_sub(1).max(1) as f64;
    for (idx, color) in stops.iter().enumerate() {
        let pos = (idx as f64 / last * 100_000.0).round() as i64;
        write!(xml, r#"<a:gs pos="{}"><a:srgbClr val="{}"/></a:gs>"#, pos, color.hex())?;
    }
    xml.push_str("</a:gsLst>");
    write!(xml, r#"<a:lin ang="{}" scaled="0"/>"#, (angle * 60_000.0).round() as i64)?;
    xml.push_str("</a:gradFill>");
    Ok(())
}
