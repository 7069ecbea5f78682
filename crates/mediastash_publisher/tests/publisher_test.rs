//! Tests for the publish / commit / rollback sequence.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use mediastash_core::{Collection, MediaCategory, MediaPayload, MediaUri, PublishRecord, Volume};
use mediastash_error::{MediaStashResult, PublishErrorKind, StorageError, StorageErrorKind};
use mediastash_index::{ContentIndex, FileSystemIndex, IndexEntry, ReadSource};
use mediastash_publisher::{CancellationFlag, MediaPublisher};
use sha2::{Digest, Sha256};
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Ways the wrapped index misbehaves.
enum Fault {
    FailWriteAfter(usize),
    FailCommit,
    FailCommitAndDelete,
    /// Commit reaches the real index, whose catalog row write then fails
    BreakCatalogOnCommit(std::path::PathBuf),
    FailReadBack,
    CancelOnOpenWrite(CancellationFlag),
    Stall {
        started: Arc<Mutex<Sender<()>>>,
        release: Arc<Mutex<Receiver<()>>>,
    },
}

struct FaultyIndex {
    inner: FileSystemIndex,
    fault: Fault,
}

struct FailingWriter {
    inner: Box<dyn Write + Send>,
    remaining: usize,
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.remaining {
            return Err(io::Error::other("disk full"));
        }
        self.remaining -= buf.len();
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct StallingWriter {
    inner: Box<dyn Write + Send>,
    started: Arc<Mutex<Sender<()>>>,
    release: Arc<Mutex<Receiver<()>>>,
    waited: bool,
}

impl Write for StallingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.waited {
            self.waited = true;
            let _ = self.started.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn injected(message: &str) -> mediastash_error::MediaStashError {
    StorageError::new(StorageErrorKind::FileWrite(message.to_string())).into()
}

impl ContentIndex for FaultyIndex {
    fn insert(
        &self,
        collection: &Collection,
        record: &PublishRecord,
    ) -> MediaStashResult<Option<MediaUri>> {
        self.inner.insert(collection, record)
    }

    fn open_write(&self, uri: &MediaUri) -> MediaStashResult<Option<Box<dyn Write + Send>>> {
        let Some(inner) = self.inner.open_write(uri)? else {
            return Ok(None);
        };
        let writer: Box<dyn Write + Send> = match &self.fault {
            Fault::FailWriteAfter(limit) => Box::new(FailingWriter {
                inner,
                remaining: *limit,
            }),
            Fault::CancelOnOpenWrite(flag) => {
                flag.cancel();
                inner
            }
            Fault::Stall { started, release } => Box::new(StallingWriter {
                inner,
                started: Arc::clone(started),
                release: Arc::clone(release),
                waited: false,
            }),
            _ => inner,
        };
        Ok(Some(writer))
    }

    fn open_read(&self, source: &ReadSource) -> MediaStashResult<Option<Box<dyn Read + Send>>> {
        self.inner.open_read(source)
    }

    fn update(&self, uri: &MediaUri, record: &PublishRecord) -> MediaStashResult<usize> {
        match self.fault {
            Fault::FailCommit | Fault::FailCommitAndDelete => Err(injected("update refused")),
            Fault::BreakCatalogOnCommit(ref root) => {
                let blocker = root
                    .join("external_primary/.catalog")
                    .join(format!("{}.tmp", uri.id()));
                std::fs::create_dir_all(blocker).unwrap();
                self.inner.update(uri, record)
            }
            _ => self.inner.update(uri, record),
        }
    }

    fn delete(&self, uri: &MediaUri) -> MediaStashResult<usize> {
        match self.fault {
            Fault::FailCommitAndDelete => Err(injected("delete refused")),
            _ => self.inner.delete(uri),
        }
    }

    fn entry(&self, uri: &MediaUri) -> MediaStashResult<Option<IndexEntry>> {
        match self.fault {
            Fault::FailReadBack => Err(injected("entry lookup refused")),
            _ => self.inner.entry(uri),
        }
    }

    fn query(&self, collection: &Collection) -> MediaStashResult<Vec<IndexEntry>> {
        self.inner.query(collection)
    }
}

fn collection(category: MediaCategory) -> Collection {
    Collection::new(Volume::external_primary(), category)
}

/// Files left in the hidden pending and catalog areas of the primary volume.
fn leftovers(root: &Path) -> usize {
    [".pending", ".catalog"]
        .iter()
        .map(|dir| {
            std::fs::read_dir(root.join("external_primary").join(dir))
                .map(|entries| entries.count())
                .unwrap_or(0)
        })
        .sum()
}

fn red_square() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([255, 0, 0])))
}

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

#[tokio::test]
async fn test_publish_image_appears_under_pictures() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(FileSystemIndex::open(temp_dir.path()).unwrap());
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let published = publisher.save_image(red_square()).await.unwrap();

    let (millis, suffix) = published.display_name().split_once('_').unwrap();
    assert_eq!(suffix, "image.jpg");
    assert_eq!(
        millis.parse::<i64>().unwrap(),
        published.captured_at().timestamp_millis()
    );
    assert_eq!(published.relative_path(), "Pictures");
    assert_eq!(published.mime_type(), "image/jpg");

    let visible = index.query(&collection(MediaCategory::Image)).unwrap();
    assert_eq!(visible.len(), 1);
    let entry = &visible[0];
    assert!(!*entry.pending());
    assert_eq!(entry.uri(), published.uri());
    assert_eq!(
        entry.record().integer(mediastash_core::columns::DATE_TAKEN),
        Some(published.captured_at().timestamp_millis())
    );

    let bytes = std::fs::read(entry.path()).unwrap();
    assert_eq!(bytes.len() as u64, *published.size_bytes());
    assert_eq!(&sha256_hex(&bytes), published.content_hash());
    assert!(entry.path().starts_with(temp_dir.path().join("external_primary/Pictures")));

    let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 100));
    let center = decoded.to_rgb8().get_pixel(50, 50).0;
    assert!(center[0] > 200 && center[1] < 50 && center[2] < 50);

    assert_eq!(leftovers(temp_dir.path()), 1);
}

#[tokio::test]
async fn test_publish_unreadable_video_leaves_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(FileSystemIndex::open(temp_dir.path().join("store")).unwrap());
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let missing = temp_dir.path().join("clip.mp4");
    let err = publisher.save_video(&missing).await.unwrap_err();
    assert!(matches!(err.kind(), PublishErrorKind::WriteFailed(_)));
    assert!(err.rolled_back);

    // A directory opens but cannot be read as a stream
    let directory = temp_dir.path().join("folder.mp4");
    std::fs::create_dir(&directory).unwrap();
    let err = publisher.save_video(&directory).await.unwrap_err();
    assert!(matches!(err.kind(), PublishErrorKind::WriteFailed(_)));
    assert!(err.rolled_back);

    assert!(index.query(&collection(MediaCategory::Video)).unwrap().is_empty());
    assert_eq!(leftovers(&temp_dir.path().join("store")), 0);
}

#[tokio::test]
async fn test_publish_audio_keeps_name_and_bytes() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(FileSystemIndex::open(temp_dir.path().join("store")).unwrap());
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let source = temp_dir.path().join("song.mp3");
    let content: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
    std::fs::write(&source, &content).unwrap();

    let published = publisher.save_audio(&source).await.unwrap();
    assert_eq!(published.display_name(), "song.mp3");
    assert_eq!(published.mime_type(), "audio/mpeg");
    assert_eq!(published.relative_path(), "Music");
    assert_eq!(*published.size_bytes(), content.len() as u64);
    assert_eq!(published.content_hash(), &sha256_hex(&content));

    let visible = index.query(&collection(MediaCategory::Audio)).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(
        visible[0].path(),
        &temp_dir.path().join("store/external_primary/Music/song.mp3")
    );
    assert_eq!(std::fs::read(visible[0].path()).unwrap(), content);
    assert_eq!(
        visible[0]
            .record()
            .integer(mediastash_core::columns::DATE_ADDED),
        Some(published.captured_at().timestamp_millis())
    );
}

#[tokio::test]
async fn test_declined_reservation_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(FileSystemIndex::open(temp_dir.path()).unwrap());
    index.unmount(&Volume::external_primary()).unwrap();
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let err = publisher.save_image(red_square()).await.unwrap_err();
    assert!(matches!(err.kind(), PublishErrorKind::ReservationDenied(_)));
    assert!(!err.rolled_back);
    assert!(index.query(&collection(MediaCategory::Image)).unwrap().is_empty());
    assert_eq!(leftovers(temp_dir.path()), 0);
}

#[test]
fn test_write_failure_rolls_back() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(FaultyIndex {
        inner: FileSystemIndex::open(temp_dir.path().join("store")).unwrap(),
        fault: Fault::FailWriteAfter(16),
    });
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let source = temp_dir.path().join("clip.mp4");
    std::fs::write(&source, vec![7u8; 4096]).unwrap();

    let err = publisher
        .publish_blocking(MediaCategory::Video, &MediaPayload::file(&source), None)
        .unwrap_err();
    match err.kind() {
        PublishErrorKind::WriteFailed(reason) => assert!(reason.contains("disk full")),
        other => panic!("expected WriteFailed, got {:?}", other),
    }
    assert!(err.rolled_back);
    assert!(index.query(&collection(MediaCategory::Video)).unwrap().is_empty());
    assert_eq!(leftovers(&temp_dir.path().join("store")), 0);
}

#[test]
fn test_commit_failure_rolls_back() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(FaultyIndex {
        inner: FileSystemIndex::open(temp_dir.path()).unwrap(),
        fault: Fault::FailCommit,
    });
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let err = publisher
        .publish_blocking(MediaCategory::Image, &MediaPayload::from(red_square()), None)
        .unwrap_err();
    assert!(matches!(err.kind(), PublishErrorKind::CommitFailed(_)));
    assert!(err.rolled_back);
    assert_eq!(leftovers(temp_dir.path()), 0);
}

#[test]
fn test_failed_rollback_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(FaultyIndex {
        inner: FileSystemIndex::open(temp_dir.path()).unwrap(),
        fault: Fault::FailCommitAndDelete,
    });
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let err = publisher
        .publish_blocking(MediaCategory::Image, &MediaPayload::from(red_square()), None)
        .unwrap_err();
    assert!(matches!(err.kind(), PublishErrorKind::CommitFailed(_)));
    assert!(!err.rolled_back);
    // The stranded reservation stays invisible to readers
    assert!(index.query(&collection(MediaCategory::Image)).unwrap().is_empty());
}

#[test]
fn test_payload_must_fit_category() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(FileSystemIndex::open(temp_dir.path()).unwrap());
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let err = publisher
        .publish_blocking(MediaCategory::Audio, &MediaPayload::from(red_square()), None)
        .unwrap_err();
    assert!(matches!(err.kind(), PublishErrorKind::PayloadMismatch { .. }));

    let err = publisher
        .publish_blocking(MediaCategory::Image, &MediaPayload::file("/tmp/a.mp3"), None)
        .unwrap_err();
    assert!(matches!(err.kind(), PublishErrorKind::PayloadMismatch { .. }));

    assert_eq!(leftovers(temp_dir.path()), 0);
}

#[test]
fn test_suggested_name_overrides_rule() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(FileSystemIndex::open(temp_dir.path().join("store")).unwrap());
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let source = temp_dir.path().join("raw.bin");
    std::fs::write(&source, b"movie").unwrap();

    let published = publisher
        .publish_blocking(
            MediaCategory::Video,
            &MediaPayload::file(&source),
            Some("holiday.mp4"),
        )
        .unwrap();
    assert_eq!(published.display_name(), "holiday.mp4");
    assert_eq!(published.mime_type(), "videos/mp4");
    assert_eq!(published.relative_path(), "Movies");
}

#[test]
fn test_repeated_publish_creates_distinct_entries() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(FileSystemIndex::open(temp_dir.path().join("store")).unwrap());
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let source = temp_dir.path().join("song.mp3");
    std::fs::write(&source, b"ID3 tune").unwrap();
    let payload = MediaPayload::file(&source);

    let first = publisher
        .publish_blocking(MediaCategory::Audio, &payload, None)
        .unwrap();
    let second = publisher
        .publish_blocking(MediaCategory::Audio, &payload, None)
        .unwrap();

    assert_ne!(first.uri(), second.uri());
    assert_eq!(first.display_name(), "song.mp3");
    assert_eq!(second.display_name(), "song (1).mp3");
    assert_eq!(first.content_hash(), second.content_hash());
    assert_eq!(index.query(&collection(MediaCategory::Audio)).unwrap().len(), 2);
}

#[test]
fn test_cancel_before_commit_rolls_back() {
    let temp_dir = TempDir::new().unwrap();
    let flag = CancellationFlag::new();
    let index = Arc::new(FaultyIndex {
        inner: FileSystemIndex::open(temp_dir.path()).unwrap(),
        fault: Fault::CancelOnOpenWrite(flag.clone()),
    });
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let err = publisher
        .publish_blocking_with(
            MediaCategory::Image,
            &MediaPayload::from(red_square()),
            None,
            &flag,
        )
        .unwrap_err();
    assert_eq!(err.kind(), &PublishErrorKind::Cancelled);
    assert!(err.rolled_back);
    assert_eq!(leftovers(temp_dir.path()), 0);
}

#[test]
fn test_cancelled_flag_skips_reservation() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(FileSystemIndex::open(temp_dir.path()).unwrap());
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let flag = CancellationFlag::new();
    flag.cancel();
    let err = publisher
        .publish_blocking_with(
            MediaCategory::Image,
            &MediaPayload::from(red_square()),
            None,
            &flag,
        )
        .unwrap_err();
    assert_eq!(err.kind(), &PublishErrorKind::Cancelled);
    assert!(!err.rolled_back);
    assert_eq!(leftovers(temp_dir.path()), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropped_publish_future_rolls_back() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("store");
    let (started_tx, started_rx) = channel();
    let (release_tx, release_rx) = channel();
    let index = Arc::new(FaultyIndex {
        inner: FileSystemIndex::open(&store).unwrap(),
        fault: Fault::Stall {
            started: Arc::new(Mutex::new(started_tx)),
            release: Arc::new(Mutex::new(release_rx)),
        },
    });
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let source = temp_dir.path().join("clip.mp4");
    std::fs::write(&source, vec![1u8; 1024]).unwrap();

    let publish = publisher.save_video(&source);
    let waited = tokio::time::timeout(Duration::from_millis(200), publish).await;
    assert!(waited.is_err(), "publish should still be stalled");

    // The background job holds a reservation while stalled
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(leftovers(&store) > 0);

    release_tx.send(()).unwrap();
    for _ in 0..250 {
        if leftovers(&store) == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(leftovers(&store), 0);
    assert!(index.query(&collection(MediaCategory::Video)).unwrap().is_empty());
}

#[test]
fn test_jpeg_quality_is_clamped() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(FileSystemIndex::open(temp_dir.path()).unwrap());

    assert_eq!(MediaPublisher::new(Arc::clone(&index)).jpeg_quality(), 100);
    assert_eq!(
        MediaPublisher::new(Arc::clone(&index))
            .with_jpeg_quality(0)
            .jpeg_quality(),
        1
    );
    assert_eq!(
        MediaPublisher::new(index).with_jpeg_quality(250).jpeg_quality(),
        100
    );
}

#[test]
fn test_commit_failing_midway_leaves_no_published_bytes() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("store");
    let index = Arc::new(FaultyIndex {
        inner: FileSystemIndex::open(&root).unwrap(),
        fault: Fault::BreakCatalogOnCommit(root.clone()),
    });
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let err = publisher
        .publish_blocking(
            MediaCategory::Image,
            &MediaPayload::from(red_square()),
            Some("x.jpg"),
        )
        .unwrap_err();
    assert!(matches!(err.kind(), PublishErrorKind::CommitFailed(_)));
    assert!(err.rolled_back);

    assert!(!root.join("external_primary/Pictures/x.jpg").exists());
    assert!(index.query(&collection(MediaCategory::Image)).unwrap().is_empty());
    let pending = std::fs::read_dir(root.join("external_primary/.pending"))
        .unwrap()
        .count();
    assert_eq!(pending, 0);
}

#[test]
fn test_failed_read_back_keeps_derived_name() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(FaultyIndex {
        inner: FileSystemIndex::open(temp_dir.path()).unwrap(),
        fault: Fault::FailReadBack,
    });
    let publisher = MediaPublisher::new(Arc::clone(&index));

    let published = publisher
        .publish_blocking(
            MediaCategory::Image,
            &MediaPayload::from(red_square()),
            Some("kept.jpg"),
        )
        .unwrap();
    assert_eq!(published.display_name(), "kept.jpg");
    assert_eq!(
        index.query(&collection(MediaCategory::Image)).unwrap().len(),
        1
    );
}
