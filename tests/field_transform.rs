//! End-to-end transformation of `INCLUDEPICTURE` fields in real archives.
mod common;

use common::*;
use mergefields::ooxml::docx::Package;
use mergefields::{DiagnosticKind, FieldDocument, FieldError, TransformReport};

fn paragraph_texts(package: &Package) -> Vec<String> {
    let tree = package.tree();
    tree.descendants_named(tree.root(), "p")
        .into_iter()
        .map(|p| tree.text(p))
        .collect()
}

#[test]
fn test_three_pictures_at_intrinsic_size() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "one.png", 16, 8);
    write_png(dir.path(), "two.png", 10, 10);
    write_png(dir.path(), "three.png", 4, 12);

    let body = format!(
        "<w:p>{}{}</w:p><w:p>{}</w:p><w:p>{}{}{}</w:p>",
        text("Logo: "),
        field(r#" INCLUDEPICTURE "one.png" \* MERGEFORMAT "#, "[one]"),
        field(" INCLUDEPICTURE two.png ", "[two]"),
        text("left"),
        field(r#" INCLUDEPICTURE "three.png" "#, "[three]"),
        text("right"),
    );
    let mut doc = FieldDocument::from_bytes(&docx(&body), Some(dir.path())).unwrap();
    assert_eq!(doc.discover_and_classify().unwrap(), 3);

    let report = doc.transform().unwrap();
    assert_eq!(report, TransformReport { embedded: 3, skipped: 0 });
    assert!(doc.diagnostics().is_empty());

    let extents: Vec<(i64, i64)> = doc
        .pictures()
        .iter()
        .map(|field| field.embedded().unwrap().extent())
        .collect();
    assert_eq!(
        extents,
        vec![(16 * 12_700, 8 * 12_700), (10 * 12_700, 10 * 12_700), (4 * 12_700, 12 * 12_700)]
    );

    let saved = doc.to_bytes().unwrap();
    let package = Package::from_bytes(&saved).unwrap();
    let tree = package.tree();
    assert_eq!(tree.descendants_named(tree.root(), "drawing").len(), 3);
    assert!(tree.descendants_named(tree.root(), "fldChar").is_empty());
    assert!(tree.descendants_named(tree.root(), "instrText").is_empty());
    assert_eq!(paragraph_texts(&package), vec!["Logo: ", "", "leftright"]);

    for field in doc.pictures() {
        let partname = field.embedded().unwrap().partname();
        assert!(package.opc().contains(partname), "missing {}", partname.as_str());
    }
}

#[test]
fn test_document_without_picture_fields_is_unchanged() {
    let body = format!(
        "<w:p>{}{}</w:p>",
        text("Dear "),
        field(r#" MERGEFIELD "name" \* MERGEFORMAT "#, "«name»")
    );
    let original = docx(&body);
    let mut doc = FieldDocument::from_bytes(&original, None).unwrap();
    assert_eq!(doc.discover_and_classify().unwrap(), 0);
    assert_eq!(doc.fields().len(), 1);

    assert_eq!(doc.transform().unwrap(), TransformReport::default());
    assert!(!doc.package().tree().is_modified());

    let saved = doc.to_bytes().unwrap();
    assert_eq!(
        member(&saved, "word/document.xml"),
        member(&original, "word/document.xml")
    );
}

#[test]
fn test_nested_fields_are_untouched() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "a.png", 2, 2);
    let body = format!(
        "<w:p>{}{}{}{}{}{}{}{}{}{}</w:p>",
        begin(),
        instr("INCLUDEPICTURE a.png "),
        begin(),
        instr("INCLUDEPICTURE a.png "),
        begin(),
        instr("INCLUDEPICTURE a.png"),
        end(),
        end(),
        separate(),
        end(),
    );
    let mut doc = FieldDocument::from_bytes(&docx(&body), Some(dir.path())).unwrap();
    let before = doc.package().tree().to_xml();

    assert_eq!(doc.discover_and_classify().unwrap(), 0);
    let fields = doc.fields();
    assert_eq!(fields.len(), 3);
    assert!(fields[0].contains_nested());
    assert!(!fields[0].is_nested());
    assert!(fields[1].is_nested() && fields[1].contains_nested());
    assert!(fields[2].is_nested() && !fields[2].contains_nested());

    let diagnostics = doc.diagnostics();
    assert_eq!(diagnostics.of_kind(DiagnosticKind::ContainsNestedField).count(), 1);
    assert_eq!(diagnostics.of_kind(DiagnosticKind::NestedField).count(), 2);

    assert_eq!(doc.transform().unwrap(), TransformReport::default());
    assert_eq!(doc.package().tree().to_xml(), before);
}

#[test]
fn test_unterminated_field_is_fatal() {
    let body = format!(
        "<w:p>{}{}{}</w:p>",
        begin(),
        instr("INCLUDEPICTURE "),
        instr("partial.png")
    );
    let mut doc = FieldDocument::from_bytes(&docx(&body), None).unwrap();
    match doc.transform() {
        Err(FieldError::Unterminated { instruction }) => {
            assert_eq!(instruction, "INCLUDEPICTURE partial.png")
        },
        other => panic!("expected an unterminated field, got {:?}", other),
    }
}

#[test]
fn test_width_and_height_flags() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "wide.png", 20, 10);
    let body = format!(
        "<w:p>{}</w:p><w:p>{}</w:p><w:p>{}</w:p>",
        field(r#"INCLUDEPICTURE "wide.png" \w 40"#, ""),
        field(r#"INCLUDEPICTURE "wide.png" \h5"#, ""),
        field(r#"INCLUDEPICTURE "wide.png" \w 30 \h 30"#, ""),
    );
    let mut doc = FieldDocument::from_bytes(&docx(&body), Some(dir.path())).unwrap();
    assert_eq!(doc.transform().unwrap().embedded, 3);

    let extents: Vec<(i64, i64)> = doc
        .pictures()
        .iter()
        .map(|field| field.embedded().unwrap().extent())
        .collect();
    assert_eq!(
        extents,
        vec![(40 * 12_700, 20 * 12_700), (10 * 12_700, 5 * 12_700), (30 * 12_700, 30 * 12_700)]
    );
}

#[test]
fn test_invalid_flag_value_falls_back_to_intrinsic_size() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "a.png", 6, 3);
    let body = format!("<w:p>{}</w:p>", field(r#"INCLUDEPICTURE a.png \w wide"#, ""));
    let mut doc = FieldDocument::from_bytes(&docx(&body), Some(dir.path())).unwrap();
    assert_eq!(doc.transform().unwrap().embedded, 1);
    assert_eq!(
        doc.pictures()[0].embedded().unwrap().extent(),
        (6 * 12_700, 3 * 12_700)
    );
    assert_eq!(doc.diagnostics().of_kind(DiagnosticKind::InvalidFlagValue).count(), 1);
}

#[test]
fn test_picture_in_table_cell() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "cell.png", 3, 3);
    let body = format!(
        "<w:p>{}</w:p><w:tbl><w:tr><w:tc><w:p>{}</w:p></w:tc></w:tr></w:tbl>",
        text("intro"),
        field("INCLUDEPICTURE cell.png", "[cell]")
    );
    let mut doc = FieldDocument::from_bytes(&docx(&body), Some(dir.path())).unwrap();
    assert_eq!(doc.transform().unwrap().embedded, 1);

    let tree = doc.package().tree();
    let cell = tree.descendants_named(tree.root(), "tc")[0];
    let runs = tree.descendants_named(cell, "r");
    assert_eq!(runs.len(), 1);
    assert!(tree.first_child_named(runs[0], "drawing").is_some());
}

#[test]
fn test_missing_picture_leaves_field_untouched() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "present.png", 2, 2);
    let missing = field("INCLUDEPICTURE absent.png", "[cached]");
    let body = format!(
        "<w:p>{}</w:p><w:p>{}</w:p>",
        missing,
        field("INCLUDEPICTURE present.png", "")
    );
    let mut doc = FieldDocument::from_bytes(&docx(&body), Some(dir.path())).unwrap();
    let report = doc.transform().unwrap();
    assert_eq!(report, TransformReport { embedded: 1, skipped: 1 });

    let failures: Vec<_> = doc
        .diagnostics()
        .of_kind(DiagnosticKind::ResolutionFailed)
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(
        failures[0].instruction.as_deref(),
        Some("INCLUDEPICTURE absent.png")
    );

    let tree = doc.package().tree();
    let first = tree.descendants_named(tree.root(), "p")[0];
    assert_eq!(tree.node_to_xml(first), format!("<w:p>{}</w:p>", missing));
}

#[test]
fn test_second_transform_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "a.png", 5, 5);
    let body = format!("<w:p>{}</w:p>", field("INCLUDEPICTURE a.png", "[a]"));
    let mut doc = FieldDocument::from_bytes(&docx(&body), Some(dir.path())).unwrap();
    assert_eq!(doc.transform().unwrap().embedded, 1);

    let once = doc.to_bytes().unwrap();
    assert_eq!(doc.transform().unwrap(), TransformReport::default());
    let twice = doc.to_bytes().unwrap();
    assert_eq!(
        member(&once, "word/document.xml"),
        member(&twice, "word/document.xml")
    );
    assert!(member(&twice, "word/media/image2.png").is_none());
}

#[test]
fn test_save_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "a.png", 7, 7);
    let input = dir.path().join("in.docx");
    let output = dir.path().join("out.docx");
    let body = format!("<w:p>{}</w:p>", field(r#"INCLUDEPICTURE "a.png""#, ""));
    std::fs::write(&input, docx(&body)).unwrap();

    // Relative sources resolve against the document's own directory
    let mut doc = FieldDocument::open(&input).unwrap();
    assert_eq!(doc.transform().unwrap().embedded, 1);
    doc.save(&output).unwrap();

    let mut reopened = FieldDocument::open(&output).unwrap();
    assert_eq!(reopened.discover_and_classify().unwrap(), 0);
    assert!(reopened.fields().is_empty());

    let saved = std::fs::read(&output).unwrap();
    assert!(member(&saved, "word/media/image1.png").is_some());
    let rels = String::from_utf8(member(&saved, "word/_rels/document.xml.rels").unwrap()).unwrap();
    assert!(rels.contains("media/image1.png"));
    let types = String::from_utf8(member(&saved, "[Content_Types].xml").unwrap()).unwrap();
    assert!(types.contains("image/png"));
}

#[test]
fn test_data_url_source() {
    use base64::Engine;
    use std::io::Cursor;

    let mut png = Cursor::new(Vec::new());
    image::RgbImage::new(3, 2)
        .write_to(&mut png, image::ImageFormat::Png)
        .unwrap();
    let encoded = base64::engine::general_purpose::STANDARD.encode(png.into_inner());
    let body = format!(
        "<w:p>{}</w:p>",
        field(&format!(r#"INCLUDEPICTURE "data:image/png;base64,{}""#, encoded), "")
    );
    let mut doc = FieldDocument::from_bytes(&docx(&body), None).unwrap();
    assert_eq!(doc.transform().unwrap().embedded, 1);
    assert_eq!(
        doc.pictures()[0].embedded().unwrap().extent(),
        (3 * 12_700, 2 * 12_700)
    );
}

#[test]
fn test_picture_sized_at_declared_resolution() {
    use image::codecs::jpeg::{JpegEncoder, PixelDensity};

    let dir = tempfile::tempdir().unwrap();
    let mut jpeg = Vec::new();
    {
        let mut encoder = JpegEncoder::new(&mut jpeg);
        encoder.set_pixel_density(PixelDensity::dpi(300));
        encoder.encode_image(&image::RgbImage::new(300, 300)).unwrap();
    }
    std::fs::write(dir.path().join("scan.jpg"), jpeg).unwrap();
    write_png(dir.path(), "plain.png", 72, 36);

    let body = format!(
        "<w:p>{}</w:p><w:p>{}</w:p><w:p>{}</w:p>",
        field(r#"INCLUDEPICTURE "scan.jpg""#, ""),
        field(r#"INCLUDEPICTURE "scan.jpg" \w 36"#, ""),
        field(r#"INCLUDEPICTURE "plain.png""#, ""),
    );
    let mut doc = FieldDocument::from_bytes(&docx(&body), Some(dir.path())).unwrap();
    assert_eq!(doc.transform().unwrap().embedded, 3);

    let extents: Vec<(i64, i64)> = doc
        .pictures()
        .iter()
        .map(|field| field.embedded().unwrap().extent())
        .collect();
    // One inch square at 300 dpi, half an inch when the width is given, and
    // 72 dpi for an image without a declared resolution
    assert_eq!(
        extents,
        vec![(914_400, 914_400), (36 * 12_700, 36 * 12_700), (914_400, 457_200)]
    );
}
