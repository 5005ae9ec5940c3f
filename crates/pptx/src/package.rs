//! Package parts of a PresentationML document.
//!
//! A rendered deck has one slide master with a single blank layout, a theme
//! derived from the brand palette, and one part per slide. Relationship ids
//! are fixed: in `presentation.xml.rels`, `rId1` is the master, `rId2` the
//! theme and `rId{3 + i}` the i-th slide.

use crate::shape::{SLIDE_HEIGHT, SLIDE_WIDTH};
use crate::writer::SlideDrawing;
use deck_core::{BrandPalette, Error};
use quick_xml::escape::escape;
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE_PROPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_EXTENDED_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

/// First relationship id used for slides in `presentation.xml.rels`.
pub const FIRST_SLIDE_REL: usize = 3;

/// First `sldId` value allowed by the schema.
const FIRST_SLIDE_ID: usize = 256;

/// Notes page size written into `presentation.xml` (portrait letter).
const NOTES_WIDTH: i64 = 6_858_000;
const NOTES_HEIGHT: i64 = 9_144_000;

/// Empty group shape header shared by every shape tree.
pub(crate) const SP_TREE_HEADER: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

/// Write a complete package holding `drawings`, in order, and return the
/// writer.
pub fn write_package<W: Write + Seek>(
    drawings: &[SlideDrawing],
    title: &str,
    palette: &BrandPalette,
    writer: W,
) -> deck_core::Result<W> {
    let count = drawings.len();
    let mut zip = ZipWriter::new(writer);
    let created = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    add_part(&mut zip, "[Content_Types].xml", content_types_xml(count).map_err(fmt_error)?)?;
    add_part(&mut zip, "_rels/.rels", root_rels_xml().map_err(fmt_error)?)?;
    add_part(
        &mut zip,
        "docProps/core.xml",
        core_props_xml(title, palette.wordmark, &created).map_err(fmt_error)?,
    )?;
    add_part(&mut zip, "docProps/app.xml", app_props_xml(count).map_err(fmt_error)?)?;
    add_part(&mut zip, "ppt/presentation.xml", presentation_xml(count).map_err(fmt_error)?)?;
    add_part(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        presentation_rels_xml(count).map_err(fmt_error)?,
    )?;
    add_part(&mut zip, "ppt/slideMasters/slideMaster1.xml", slide_master_xml())?;
    add_part(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        slide_master_rels_xml().map_err(fmt_error)?,
    )?;
    add_part(&mut zip, "ppt/slideLayouts/slideLayout1.xml", slide_layout_xml())?;
    add_part(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        slide_layout_rels_xml().map_err(fmt_error)?,
    )?;
    add_part(&mut zip, "ppt/theme/theme1.xml", theme_xml(palette).map_err(fmt_error)?)?;

    let slide_rels = slide_rels_xml().map_err(fmt_error)?;
    for (idx, drawing) in drawings.iter().enumerate() {
        let number = idx + 1;
        log::debug!(
            "Writing slide {}/{} ({} shapes, {} connectors)",
            number,
            count,
            drawing.shapes.len(),
            drawing.connectors.len()
        );
        add_part(&mut zip, &slide_part_name(number), drawing.to_xml().map_err(fmt_error)?)?;
        add_part(&mut zip, &slide_rels_part_name(number), slide_rels.clone())?;
    }

    zip.finish()
        .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))
}

/// Create `path` through `write`. The file appears only once it is completely
/// written; missing parent directories are created.
pub fn persist<F>(path: &Path, write: F) -> deck_core::Result<()>
where
    F: FnOnce(&mut File) -> deck_core::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::IoError(e.error))?;
    Ok(())
}

fn add_part<W: Write + Seek>(zip: &mut ZipWriter<W>, name: &str, content: String) -> deck_core::Result<()> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)
        .map_err(|e| Error::ZipError(format!("Failed to start '{}': {}", name, e)))?;
    zip.write_all(content.as_bytes())?;
    Ok(())
}

fn fmt_error(e: std::fmt::Error) -> Error {
    Error::XmlError(format!("Failed to write XML: {}", e))
}

/// Path of the i-th (1-based) slide part inside the archive.
pub fn slide_part_name(number: usize) -> String {
    format!("ppt/slides/slide{}.xml", number)
}

/// Path of the i-th (1-based) slide's relationship part.
pub fn slide_rels_part_name(number: usize) -> String {
    format!("ppt/slides/_rels/slide{}.xml.rels", number)
}

/// Opening tag of a part rooted in the PresentationML namespace.
pub(crate) fn presentation_root(tag: &str, extra_attrs: &str) -> String {
    format!(
        r#"<p:{} xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"{}>"#,
        tag, NS_A, NS_R, NS_P, extra_attrs
    )
}

pub fn content_types_xml(slide_count: usize) -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#);
    xml.push_str(r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#);
    xml.push_str(r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#);
    for number in 1..=slide_count {
        write!(
            xml,
            r#"<Override PartName="/{}" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            slide_part_name(number)
        )?;
    }
    xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#);
    xml.push_str("</Types>");
    Ok(xml)
}

pub fn root_rels_xml() -> Result<String, std::fmt::Error> {
    relationships(&[
        ("rId1", REL_OFFICE_DOCUMENT, "ppt/presentation.xml".to_string()),
        ("rId2", REL_CORE_PROPS, "docProps/core.xml".to_string()),
        ("rId3", REL_EXTENDED_PROPS, "docProps/app.xml".to_string()),
    ])
}

pub fn presentation_xml(slide_count: usize) -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(1024 + slide_count * 48);
    xml.push_str(XML_DECL);
    xml.push_str(&presentation_root("presentation", r#" saveSubsetFonts="1""#));

    xml.push_str("<p:sldMasterIdLst>");
    xml.push_str(r#"<p:sldMasterId id="2147483648" r:id="rId1"/>"#);
    xml.push_str("</p:sldMasterIdLst>");

    if slide_count > 0 {
        xml.push_str("<p:sldIdLst>");
        for idx in 0..slide_count {
            write!(
                xml,
                r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                FIRST_SLIDE_ID + idx,
                FIRST_SLIDE_REL + idx
            )?;
        }
        xml.push_str("</p:sldIdLst>");
    }

    write!(xml, r#"<p:sldSz cx="{}" cy="{}"/>"#, SLIDE_WIDTH, SLIDE_HEIGHT)?;
    write!(xml, r#"<p:notesSz cx="{}" cy="{}"/>"#, NOTES_WIDTH, NOTES_HEIGHT)?;
    xml.push_str("</p:presentation>");
    Ok(xml)
}

pub fn presentation_rels_xml(slide_count: usize) -> Result<String, std::fmt::Error> {
    let mut rels = vec![
        ("rId1".to_string(), REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml".to_string()),
        ("rId2".to_string(), REL_THEME, "theme/theme1.xml".to_string()),
    ];
    for idx in 0..slide_count {
        rels.push((
            format!("rId{}", FIRST_SLIDE_REL + idx),
            REL_SLIDE,
            format!("slides/slide{}.xml", idx + 1),
        ));
    }
    let borrowed: Vec<(&str, &str, String)> = rels
        .iter()
        .map(|(id, ty, target)| (id.as_str(), *ty, target.clone()))
        .collect();
    relationships(&borrowed)
}

/// Every slide points at the single blank layout.
pub fn slide_rels_xml() -> Result<String, std::fmt::Error> {
    relationships(&[(
        "rId1",
        REL_SLIDE_LAYOUT,
        "../slideLayouts/slideLayout1.xml".to_string(),
    )])
}

pub fn slide_master_xml() -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    xml.push_str(&presentation_root("sldMaster", ""));
    xml.push_str(r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>"#);
    xml.push_str(SP_TREE_HEADER);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#);
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#);
    xml.push_str("</p:sldMaster>");
    xml
}

pub fn slide_master_rels_xml() -> Result<String, std::fmt::Error> {
    relationships(&[
        ("rId1", REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml".to_string()),
        ("rId2", REL_THEME, "../theme/theme1.xml".to_string()),
    ])
}

pub fn slide_layout_xml() -> String {
    let mut xml = String::with_capacity(768);
    xml.push_str(XML_DECL);
    xml.push_str(&presentation_root("sldLayout", r#" type="blank" preserve="1""#));
    xml.push_str(r#"<p:cSld name="Blank"><p:spTree>"#);
    xml.push_str(SP_TREE_HEADER);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sldLayout>");
    xml
}

pub fn slide_layout_rels_xml() -> Result<String, std::fmt::Error> {
    relationships(&[(
        "rId1",
        REL_SLIDE_MASTER,
        "../slideMasters/slideMaster1.xml".to_string(),
    )])
}

/// Theme whose color and font schemes come from the palette, so text typed
/// into the deck later picks up the brand as well.
pub fn theme_xml(palette: &BrandPalette) -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    write!(xml, r#"<a:theme xmlns:a="{}" name="{}">"#, NS_A, palette.wordmark)?;
    xml.push_str("<a:themeElements>");

    write!(xml, r#"<a:clrScheme name="{}">"#, palette.wordmark)?;
    let scheme = [
        ("dk1", palette.text),
        ("lt1", palette.background),
        ("dk2", palette.primary),
        ("lt2", palette.light_gray),
        ("accent1", palette.primary),
        ("accent2", palette.secondary),
        ("accent3", palette.accent),
        ("accent4", palette.dark),
        ("accent5", palette.text_light),
        ("accent6", palette.light_gray),
        ("hlink", palette.secondary),
        ("folHlink", palette.dark),
    ];
    for (slot, color) in scheme {
        write!(xml, r#"<a:{0}><a:srgbClr val="{1}"/></a:{0}>"#, slot, color.hex())?;
    }
    xml.push_str("</a:clrScheme>");

    write!(xml, r#"<a:fontScheme name="{}">"#, palette.wordmark)?;
    for (tag, face) in [("majorFont", palette.title_font), ("minorFont", palette.body_font)] {
        write!(
            xml,
            r#"<a:{0}><a:latin typeface="{1}"/><a:ea typeface=""/><a:cs typeface=""/></a:{0}>"#,
            tag, face
        )?;
    }
    xml.push_str("</a:fontScheme>");

    xml.push_str(FORMAT_SCHEME);
    xml.push_str("</a:themeElements>");
    xml.push_str("<a:objectDefaults/><a:extraClrSchemeLst/>");
    xml.push_str("</a:theme>");
    Ok(xml)
}

/// Minimal format scheme: the schema requires three entries per list.
const FORMAT_SCHEME: &str = concat!(
    r#"<a:fmtScheme name="Office">"#,
    r#"<a:fillStyleLst>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"</a:fillStyleLst>"#,
    r#"<a:lnStyleLst>"#,
    r#"<a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"</a:lnStyleLst>"#,
    r#"<a:effectStyleLst>"#,
    r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
    r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
    r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
    r#"</a:effectStyleLst>"#,
    r#"<a:bgFillStyleLst>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"</a:bgFillStyleLst>"#,
    r#"</a:fmtScheme>"#
);

/// `created` is a W3CDTF timestamp.
pub fn core_props_xml(title: &str, creator: &str, created: &str) -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(768);
    xml.push_str(XML_DECL);
    xml.push_str(concat!(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
        r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
        r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
    ));
    write!(xml, "<dc:title>{}</dc:title>", escape(title))?;
    write!(xml, "<dc:creator>{}</dc:creator>", escape(creator))?;
    write!(xml, r#"<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>"#, created)?;
    write!(xml, r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>"#, created)?;
    xml.push_str("</cp:coreProperties>");
    Ok(xml)
}

pub fn app_props_xml(slide_count: usize) -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#);
    write!(xml, "<Application>{}</Application>", env!("CARGO_PKG_NAME"))?;
    write!(xml, "<Slides>{}</Slides>", slide_count)?;
    xml.push_str("<PresentationFormat>On-screen Show (16:9)</PresentationFormat>");
    xml.push_str("</Properties>");
    Ok(xml)
}

fn relationships(rels: &[(&str, &str, String)]) -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_DECL);
    write!(xml, r#"<Relationships xmlns="{}">"#, NS_PKG_RELS)?;
    for (id, rel_type, target) in rels {
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            id, rel_type, target
        )?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}
