//! `INCLUDEPICTURE` fields whose source is an http(s) URL.
#![cfg(feature = "remote")]

mod common;

use common::*;
use mergefields::{DiagnosticKind, FieldDocument, TransformOptions, TransformReport};
use std::io::{Cursor, Write};
use std::time::Duration;

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::RgbImage::new(width, height)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn remote_field(url: &str) -> String {
    format!(
        "<w:p>{}</w:p>",
        field(&format!(r#" INCLUDEPICTURE "{}" \* MERGEFORMAT "#, url), "[logo]")
    )
}

#[test]
fn test_remote_picture_is_embedded() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/images/logo.png")
        .match_header("user-agent", "letters/2.0")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(png(6, 3))
        .expect(1)
        .create();

    let body = remote_field(&format!("{}/images/logo.png", server.url()));
    let mut doc = FieldDocument::from_bytes(&docx(&body), None)
        .unwrap()
        .with_options(TransformOptions::new().with_user_agent("letters/2.0"));
    let report = doc.transform().unwrap();

    mock.assert();
    assert_eq!(report, TransformReport { embedded: 1, skipped: 0 });
    assert!(doc.diagnostics().is_empty());
    assert_eq!(
        doc.pictures()[0].embedded().unwrap().extent(),
        (6 * 12_700, 3 * 12_700)
    );
    let tree = doc.package().tree();
    assert_eq!(tree.descendants_named(tree.root(), "drawing").len(), 1);
    assert!(tree.descendants_named(tree.root(), "fldChar").is_empty());
}

#[test]
fn test_remote_not_found_leaves_field() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/missing.png")
        .with_status(404)
        .with_body("not here")
        .create();

    let body = remote_field(&format!("{}/missing.png", server.url()));
    let mut doc = FieldDocument::from_bytes(&docx(&body), None).unwrap();
    let before = doc.package().tree().to_xml();
    let report = doc.transform().unwrap();

    mock.assert();
    assert_eq!(report, TransformReport { embedded: 0, skipped: 1 });
    let failures: Vec<_> = doc.diagnostics().of_kind(DiagnosticKind::ResolutionFailed).collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].message.contains("404"), "{}", failures[0].message);
    assert_eq!(doc.package().tree().to_xml(), before);
    assert!(!doc.package().tree().is_modified());
}

#[test]
fn test_remote_failure_does_not_block_other_pictures() {
    let mut server = mockito::Server::new();
    let ok = server
        .mock("GET", "/a.png")
        .with_status(200)
        .with_body(png(2, 2))
        .create();
    let gone = server.mock("GET", "/b.png").with_status(500).create();

    let body = format!(
        "{}{}",
        remote_field(&format!("{}/a.png", server.url())),
        remote_field(&format!("{}/b.png", server.url()))
    );
    let mut doc = FieldDocument::from_bytes(&docx(&body), None).unwrap();
    let report = doc.transform().unwrap();

    ok.assert();
    gone.assert();
    assert_eq!(report, TransformReport { embedded: 1, skipped: 1 });
    assert!(doc.pictures()[0].embedded().is_some());
    assert!(doc.pictures()[1].embedded().is_none());
    let tree = doc.package().tree();
    assert_eq!(tree.descendants_named(tree.root(), "instrText").len(), 1);
}

#[test]
fn test_remote_timeout() {
    let mut server = mockito::Server::new();
    let _slow = server
        .mock("GET", "/slow.png")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(1500));
            w.write_all(b"late")
        })
        .create();

    let body = remote_field(&format!("{}/slow.png", server.url()));
    let mut doc = FieldDocument::from_bytes(&docx(&body), None)
        .unwrap()
        .with_options(TransformOptions::new().with_http_timeout(Duration::from_millis(200)));
    let report = doc.transform().unwrap();

    assert_eq!(report, TransformReport { embedded: 0, skipped: 1 });
    assert_eq!(doc.diagnostics().of_kind(DiagnosticKind::ResolutionFailed).count(), 1);
}
