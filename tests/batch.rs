//! Batch-level behavior with recording and real codecs

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use resiz::paths::SUPPORTED_EXTENSIONS;
use resiz::{
    BatchCoordinator, BatchOptions, BatchResult, BatchState, CodecEngine, DimensionPlan,
    Dimensions, ErrorKind, ImageCodec, OutputFormat, ResizError, Result, TaskOutcome,
};
use tempfile::TempDir;

/// One recorded `convert` call
#[derive(Debug, Clone, PartialEq)]
struct Conversion {
    source: String,
    output: String,
    plan: DimensionPlan,
    format: OutputFormat,
    quality: u8,
}

/// Codec that reports configured sizes, records calls and writes empty outputs
#[derive(Default)]
struct RecordingCodec {
    sizes: HashMap<String, Dimensions>,
    failing: BTreeSet<String>,
    conversions: Mutex<Vec<Conversion>>,
}

impl RecordingCodec {
    fn with_size(mut self, name: &str, width: u32, height: u32) -> Self {
        self.sizes
            .insert(name.to_string(), Dimensions::new(width, height));
        self
    }

    fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    fn conversions(&self) -> Vec<Conversion> {
        let mut conversions = self.conversions.lock().unwrap().clone();
        conversions.sort_by(|a, b| a.source.cmp(&b.source));
        conversions
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

impl CodecEngine for RecordingCodec {
    fn read_metadata(&self, path: &Path) -> Result<Dimensions> {
        Ok(self
            .sizes
            .get(&file_name(path))
            .copied()
            .unwrap_or(Dimensions::new(10, 10)))
    }

    fn convert(
        &self,
        source: &Path,
        output: &Path,
        plan: DimensionPlan,
        format: OutputFormat,
        quality: u8,
    ) -> Result<()> {
        if self.failing.contains(&file_name(source)) {
            return Err(ResizError::codec(source, "injected encoder failure"));
        }

        std::fs::write(output, b"").map_err(|e| ResizError::codec(output, e.to_string()))?;
        self.conversions.lock().unwrap().push(Conversion {
            source: file_name(source),
            output: file_name(output),
            plan,
            format,
            quality,
        });
        Ok(())
    }
}

fn touch_all(dir: &Path, names: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for name in names {
        std::fs::write(dir.join(name), b"x").unwrap();
    }
}

fn membership(result: &BatchResult) -> BTreeSet<PathBuf> {
    result.source_paths().map(Path::to_path_buf).collect()
}

async fn run(codec: Arc<dyn CodecEngine>, concurrency: usize, options: BatchOptions) -> BatchResult {
    BatchCoordinator::new(codec)
        .with_concurrency(concurrency)
        .unwrap()
        .run_batch(options)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_end_to_end_webp_scenario() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("photos");
    touch_all(&source, &["a.jpg", "b.png"]);

    let codec = Arc::new(
        RecordingCodec::default()
            .with_size("a.jpg", 400, 200)
            .with_size("b.png", 100, 100),
    );
    let options = BatchOptions::new(&source)
        .destination(tmp.path().join("out"))
        .width(200)
        .format("webp")
        .quality(80);

    let result = run(codec.clone(), 2, options).await;
    assert_eq!(result.succeeded.len(), 2);
    assert!(result.failed.is_empty());

    assert_eq!(
        codec.conversions(),
        vec![
            Conversion {
                source: "a.jpg".into(),
                output: "a.webp".into(),
                plan: DimensionPlan { width: 200, height: 100 },
                format: OutputFormat::Webp,
                quality: 80,
            },
            Conversion {
                source: "b.png".into(),
                output: "b.webp".into(),
                plan: DimensionPlan { width: 200, height: 200 },
                format: OutputFormat::Webp,
                quality: 80,
            },
        ]
    );

    let out = std::fs::canonicalize(tmp.path().join("out")).unwrap();
    for outcome in &result.succeeded {
        match outcome {
            TaskOutcome::Success { output_path, .. } => {
                assert_eq!(output_path.parent(), Some(out.as_path()));
                assert!(output_path.exists());
            }
            other => panic!("expected success, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_serial_and_parallel_runs_agree() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("in");
    let names = ["1.jpg", "2.png", "3.gif", "4.webp", "5.tiff", "6.raw"];
    touch_all(&source, &names);

    let serial = run(
        Arc::new(RecordingCodec::default().failing_on("3.gif")),
        1,
        BatchOptions::new(&source).destination(tmp.path().join("serial")),
    )
    .await;
    let parallel = run(
        Arc::new(RecordingCodec::default().failing_on("3.gif")),
        names.len(),
        BatchOptions::new(&source).destination(tmp.path().join("parallel")),
    )
    .await;

    assert_eq!(serial.total(), names.len());
    assert_eq!(parallel.total(), names.len());
    assert_eq!(membership(&serial), membership(&parallel));
    assert_eq!(serial.failed.len(), parallel.failed.len());
}

#[tokio::test]
async fn test_single_codec_failure_is_isolated() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("in");
    touch_all(&source, &["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]);

    let codec = Arc::new(RecordingCodec::default().failing_on("c.jpg"));
    let options = BatchOptions::new(&source).destination(tmp.path().join("out"));
    let result = run(codec.clone(), 3, options).await;

    assert_eq!(result.succeeded.len(), 4);
    assert_eq!(result.failed.len(), 1);
    match &result.failed[0] {
        TaskOutcome::Failure {
            source_path,
            kind,
            detail,
        } => {
            assert!(source_path.ends_with("c.jpg"));
            assert_eq!(*kind, ErrorKind::CodecError);
            assert!(detail.contains("injected"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(codec.conversions().len(), 4);
}

#[tokio::test]
async fn test_zero_dimensions_fail_one_file() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("in");
    touch_all(&source, &["good.png", "empty.png"]);

    let codec = Arc::new(RecordingCodec::default().with_size("empty.png", 0, 0));
    let options = BatchOptions::new(&source).destination(tmp.path().join("out"));
    let result = run(codec, 2, options).await;

    assert_eq!(result.succeeded.len(), 1);
    assert!(matches!(
        result.failed[0],
        TaskOutcome::Failure {
            kind: ErrorKind::UnreadableDimensions,
            ..
        }
    ));
}

#[tokio::test]
async fn test_shared_stem_is_reported_not_overwritten() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("in");
    touch_all(&source.join("x"), &["a.png"]);
    touch_all(&source.join("y"), &["a.png"]);

    let codec = Arc::new(RecordingCodec::default());
    let options = BatchOptions::new(&source)
        .destination(tmp.path().join("out"))
        .format("png");
    let result = run(codec.clone(), 2, options).await;

    assert_eq!(result.total(), 2);
    assert_eq!(result.succeeded.len(), 1);
    assert!(result.succeeded[0].source_path().ends_with("x/a.png"));
    match &result.failed[0] {
        TaskOutcome::Failure {
            source_path,
            kind,
            detail,
        } => {
            assert!(source_path.ends_with("y/a.png"));
            assert_eq!(*kind, ErrorKind::CodecError);
            assert!(detail.contains("collides"));
        }
        other => panic!("expected failure, got {:?}", other),
    }

    assert_eq!(codec.conversions().len(), 1);
    let written = std::fs::read_dir(tmp.path().join("out")).unwrap().count();
    assert_eq!(written, 1);
}

#[tokio::test]
async fn test_destination_reuse() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("in");
    touch_all(&source, &["a.jpg"]);
    let destination = tmp.path().join("out");

    for _ in 0..2 {
        let options = BatchOptions::new(&source).destination(&destination);
        let result = run(Arc::new(RecordingCodec::default()), 1, options).await;
        assert!(result.is_complete_success());
    }
}

#[tokio::test]
async fn test_default_destination_is_created_beside_source() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("in");
    touch_all(&source, &["a.jpg"]);

    let result = run(
        Arc::new(RecordingCodec::default()),
        1,
        BatchOptions::new(&source),
    )
    .await;
    assert!(result.is_complete_success());

    let created: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("resized_"))
        .collect();
    assert_eq!(created.len(), 1);
    assert!(tmp.path().join(&created[0]).join("a.jpg").exists());
}

#[tokio::test]
async fn test_every_supported_extension_is_dispatched() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("in");
    let names: Vec<String> = SUPPORTED_EXTENSIONS
        .iter()
        .map(|ext| format!("img_{}.{}", ext, ext))
        .collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    touch_all(&source, &refs);

    let options = BatchOptions::new(&source)
        .destination(tmp.path().join("out"))
        .format("png");
    let result = run(Arc::new(RecordingCodec::default()), 4, options).await;
    assert_eq!(result.succeeded.len(), SUPPORTED_EXTENSIONS.len());
}

#[tokio::test]
async fn test_fatal_errors_dispatch_nothing() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("empty");
    std::fs::create_dir(&source).unwrap();
    let destination = tmp.path().join("out");

    let codec = Arc::new(RecordingCodec::default());
    let coordinator = BatchCoordinator::new(codec.clone());
    let err = coordinator
        .run_batch(BatchOptions::new(&source).destination(&destination))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptySource);
    assert!(err.is_batch_fatal());
    assert!(matches!(coordinator.state(), BatchState::Failed(_)));
    assert!(!destination.exists());
    assert!(codec.conversions().is_empty());
}

#[tokio::test]
async fn test_unsupported_single_file_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("scan.bmp");
    std::fs::write(&file, b"x").unwrap();

    let err = BatchCoordinator::new(Arc::new(RecordingCodec::default()))
        .run_batch(BatchOptions::new(&file))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[tokio::test]
async fn test_real_codec_converts_generated_images() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("in");
    std::fs::create_dir(&source).unwrap();
    RgbImage::from_pixel(80, 40, Rgb([200, 30, 30]))
        .save(source.join("wide.png"))
        .unwrap();
    RgbImage::from_pixel(30, 30, Rgb([30, 200, 30]))
        .save(source.join("square.jpg"))
        .unwrap();
    std::fs::write(source.join("broken.png"), b"definitely not a png").unwrap();

    let options = BatchOptions::new(&source)
        .destination(tmp.path().join("out"))
        .width(40)
        .format("png");
    let result = run(Arc::new(ImageCodec::new()), 2, options).await;

    assert_eq!(result.succeeded.len(), 2);
    assert_eq!(result.failed.len(), 1);
    assert!(result.failed[0].source_path().ends_with("broken.png"));

    let out = tmp.path().join("out");
    assert_eq!(image::image_dimensions(out.join("wide.png")).unwrap(), (40, 20));
    assert_eq!(image::image_dimensions(out.join("square.png")).unwrap(), (40, 40));
}

#[tokio::test]
async fn test_real_codec_single_file_to_jpeg() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("photo.png");
    RgbImage::from_pixel(60, 30, Rgb([1, 2, 3])).save(&file).unwrap();

    let options = BatchOptions::new(&file)
        .destination(tmp.path().join("out"))
        .height(15)
        .format("jpeg")
        .quality(70);
    let result = run(Arc::new(ImageCodec::new()), 1, options).await;

    assert!(result.is_complete_success());
    let written = tmp.path().join("out/photo.jpeg");
    assert_eq!(image::image_dimensions(written).unwrap(), (30, 15));
}
