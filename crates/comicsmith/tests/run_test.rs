//! End-to-end tests for the comic runner.

use comicsmith::{
    ComicsmithErrorKind, FailedPanelPolicy, RunOptions, render_manifest, run_comic,
};
use std::path::Path;

const SCRIPT: &str = r#"
[comic]
title = "Lighthouse <Keeper>"

[[panels]]
name = "storm"
description = "Panel 2: The storm arrives"
prompt = "A lighthouse in a storm"
edit_from = "calm"

[[panels]]
name = "calm"
description = "Panel 1: A calm evening"
prompt = "A lighthouse at dusk"

[[panels]]
name = "coda"
description = "Epilogue"
prompt = "The keeper asleep"
"#;

fn write_script(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("comic.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[tokio::test]
async fn test_dry_run_writes_ordered_document() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), SCRIPT);
    let out = dir.path().join("output");

    let options = RunOptions::builder()
        .script(script)
        .out(out.clone())
        .sequence(3u64)
        .dry_run(true)
        .build()
        .unwrap();
    let outcome = run_comic(&options, None).await.unwrap();

    assert!(outcome.report().is_success());
    assert_eq!(outcome.report().successes().len(), 3);
    assert_eq!(outcome.report().fallbacks(), &vec!["coda".to_string()]);
    assert_eq!(outcome.document(), &out.join("comic.html"));

    for file in ["calm_3.png", "storm_3.png", "coda_3.png"] {
        assert!(out.join("images").join(file).is_file(), "missing {}", file);
    }

    let html = std::fs::read_to_string(out.join("comic.html")).unwrap();
    assert!(html.contains("Lighthouse &lt;Keeper&gt;"));
    let calm = html.find("images/calm_3.png").unwrap();
    let storm = html.find("images/storm_3.png").unwrap();
    let coda = html.find("images/coda_3.png").unwrap();
    assert!(calm < storm && storm < coda);

    let manifest: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(out.join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest.len(), 3);
    assert_eq!(manifest[0]["image"], "images/calm_3.png");
    assert_eq!(manifest[2]["description"], "Epilogue");
}

#[tokio::test]
async fn test_missing_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), SCRIPT);

    let options = RunOptions::builder()
        .script(script)
        .out(dir.path().join("output"))
        .build()
        .unwrap();
    let err = run_comic(&options, None).await.unwrap_err();

    assert!(matches!(err.kind(), ComicsmithErrorKind::Config(_)));
    assert!(!dir.path().join("output").join("comic.html").exists());
}

#[tokio::test]
async fn test_invalid_script_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "[comic]\ntitle = \"x\"\n[[panels]]\nname = \"a\"\nprompt = \"p\"\nedit_from = \"a\"\n",
    );

    let options = RunOptions::builder()
        .script(script)
        .out(dir.path().join("output"))
        .dry_run(true)
        .build()
        .unwrap();
    let err = run_comic(&options, None).await.unwrap_err();

    assert!(matches!(err.kind(), ComicsmithErrorKind::Script(_)));
}

#[tokio::test]
async fn test_placeholder_policy_with_missing_base_image() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        r#"
[comic]
title = "Partial"

[[panels]]
name = "first"
description = "Panel 1: ok"
prompt = "fine"

[[panels]]
name = "second"
description = "Panel 2: broken"
prompt = "edit a file that is not there"
base_image = "does/not/exist.png"
"#,
    );
    let out = dir.path().join("output");

    let options = RunOptions::builder()
        .script(script)
        .out(out.clone())
        .sequence(1u64)
        .dry_run(true)
        .failed_panels(FailedPanelPolicy::Placeholder)
        .build()
        .unwrap();
    let outcome = run_comic(&options, None).await.unwrap();

    assert!(!outcome.report().is_success());
    assert_eq!(
        outcome.report().failure("second").unwrap().kind(),
        "source_not_found"
    );

    let html = std::fs::read_to_string(out.join("comic.html")).unwrap();
    assert!(html.contains("images/first_1.png"));
    assert!(html.contains("images/placeholder.png"));
    assert!(out.join("images/placeholder.png").is_file());
    assert!(html.find("Panel 1: ok").unwrap() < html.find("Panel 2: broken").unwrap());
}

fn write_manifest(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("manifest.json");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_render_manifest_without_synthesis() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(
        dir.path(),
        r#"[
  {"description": "Panel 2: second", "image": "images/b.png"},
  {"description": "Panel 1: first", "image": "images/a.png"}
]"#,
    );
    let out = dir.path().join("site");
    std::fs::create_dir_all(out.join("images")).unwrap();
    std::fs::write(out.join("images/a.png"), [1]).unwrap();
    std::fs::write(out.join("images/b.png"), [2]).unwrap();

    let path = render_manifest(&manifest, "Rerender", &out, FailedPanelPolicy::Omit).unwrap();

    let html = std::fs::read_to_string(path).unwrap();
    assert!(html.find("images/a.png").unwrap() < html.find("images/b.png").unwrap());
}

#[test]
fn test_render_manifest_rejects_unusable_images() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(
        dir.path(),
        r#"[
  {"description": "Panel 1: gone", "image": "images/missing.png"},
  {"description": "Panel 2: blank", "image": ""}
]"#,
    );
    let out = dir.path().join("site");

    let err = render_manifest(&manifest, "Broken", &out, FailedPanelPolicy::Omit).unwrap_err();
    assert!(matches!(err.kind(), ComicsmithErrorKind::Render(_)));
    assert!(!out.join("comic.html").exists());

    let path =
        render_manifest(&manifest, "Broken", &out, FailedPanelPolicy::Placeholder).unwrap();
    let html = std::fs::read_to_string(path).unwrap();
    assert!(!html.contains("src=\"\""));
    assert!(!html.contains("images/missing.png"));
    assert_eq!(html.matches("class=\"panel failed\"").count(), 2);
}

#[tokio::test]
async fn test_manifest_of_partial_run_renders_again() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        r#"
[comic]
title = "Partial"

[[panels]]
name = "first"
description = "Panel 1: ok"
prompt = "fine"

[[panels]]
name = "second"
description = "Panel 2: broken"
prompt = "edit a file that is not there"
base_image = "does/not/exist.png"
"#,
    );
    let out = dir.path().join("output");
    let options = RunOptions::builder()
        .script(script)
        .out(out.clone())
        .sequence(2u64)
        .dry_run(true)
        .failed_panels(FailedPanelPolicy::Placeholder)
        .build()
        .unwrap();
    run_comic(&options, None).await.unwrap();

    let path = render_manifest(
        &out.join("manifest.json"),
        "Partial",
        &out,
        FailedPanelPolicy::Omit,
    )
    .unwrap();

    let html = std::fs::read_to_string(path).unwrap();
    assert!(html.contains("images/first_2.png"));
    assert!(!html.contains("Panel 2: broken"));
}
