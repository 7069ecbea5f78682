//! The publish / commit / rollback sequence.

use crate::reservation::Reservation;
use crate::writer::HashingWriter;
use crate::{CancellationFlag, PublishedMedia};
use chrono::Utc;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use mediastash_core::{
    CategoryProfile, Collection, MediaCategory, MediaPayload, MediaUri, PublishRecord, Volume,
};
use mediastash_error::{PublishError, PublishErrorKind, PublishResult};
use mediastash_index::{ContentIndex, ReadSource};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// JPEG quality used for bitmaps unless configured otherwise.
pub const DEFAULT_JPEG_QUALITY: u8 = 100;

/// Publishes payloads into a content index.
///
/// One parameterised sequence serves every category; the
/// [`CategoryProfile`] supplies the category's literal values. Publishers hold
/// no mutable state, so concurrent publishes never coordinate: each owns the
/// reservation it created.
///
/// # Example
///
/// ```no_run
/// use mediastash_core::MediaCategory;
/// use mediastash_index::FileSystemIndex;
/// use mediastash_publisher::MediaPublisher;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let index = Arc::new(FileSystemIndex::open("/tmp/mediastash")?);
/// let publisher = MediaPublisher::new(index);
///
/// let published = publisher.save_audio("/tmp/song.mp3").await?;
/// assert_eq!(published.display_name(), "song.mp3");
/// assert_eq!(*published.category(), MediaCategory::Audio);
/// # Ok(())
/// # }
/// ```
pub struct MediaPublisher<I: ContentIndex + ?Sized> {
    index: Arc<I>,
    volume: Volume,
    jpeg_quality: u8,
}

impl<I: ContentIndex + ?Sized> Clone for MediaPublisher<I> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
            volume: self.volume.clone(),
            jpeg_quality: self.jpeg_quality,
        }
    }
}

impl<I: ContentIndex + ?Sized + 'static> MediaPublisher<I> {
    /// Create a publisher targeting the primary external volume.
    pub fn new(index: Arc<I>) -> Self {
        Self {
            index,
            volume: Volume::external_primary(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Target a different volume.
    pub fn with_volume(mut self, volume: Volume) -> Self {
        self.volume = volume;
        self
    }

    /// Set the JPEG quality for bitmaps, clamped to 1..=100.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// The index entries are published into.
    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    /// Volume entries are published on.
    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// JPEG quality for bitmaps.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Publish a bitmap as a JPEG picture.
    pub async fn save_image(
        &self,
        bitmap: impl Into<DynamicImage>,
    ) -> PublishResult<PublishedMedia> {
        self.publish(MediaCategory::Image, MediaPayload::Image(bitmap.into()), None)
            .await
    }

    /// Publish a copy of a video file.
    pub async fn save_video(&self, file: impl Into<PathBuf>) -> PublishResult<PublishedMedia> {
        self.publish(MediaCategory::Video, MediaPayload::File(file.into()), None)
            .await
    }

    /// Publish a copy of an audio file under its own name.
    pub async fn save_audio(&self, file: impl Into<PathBuf>) -> PublishResult<PublishedMedia> {
        self.publish(MediaCategory::Audio, MediaPayload::File(file.into()), None)
            .await
    }

    /// Publish on the blocking pool.
    ///
    /// Dropping the returned future before it resolves cancels the publish:
    /// the background job still runs to the end, but rolls back instead of
    /// committing.
    pub async fn publish(
        &self,
        category: MediaCategory,
        payload: MediaPayload,
        suggested_name: Option<String>,
    ) -> PublishResult<PublishedMedia> {
        self.publish_cancellable(category, payload, suggested_name, CancellationFlag::new())
            .await
    }

    /// Publish on the blocking pool, observing a caller-held cancellation flag.
    pub async fn publish_cancellable(
        &self,
        category: MediaCategory,
        payload: MediaPayload,
        suggested_name: Option<String>,
        cancel: CancellationFlag,
    ) -> PublishResult<PublishedMedia> {
        let guard = cancel.cancel_on_drop();
        let publisher = self.clone();
        let job = tokio::task::spawn_blocking(move || {
            publisher.publish_blocking_with(category, &payload, suggested_name.as_deref(), &cancel)
        });

        let outcome = job.await;
        guard.disarm();

        outcome.unwrap_or_else(|e| {
            error!(error = %e, "Publish task did not complete");
            Err(PublishError::new(PublishErrorKind::WriteFailed(format!(
                "publish task aborted: {}",
                e
            ))))
        })
    }

    /// Publish on the current thread. Blocks on index calls and stream I/O.
    pub fn publish_blocking(
        &self,
        category: MediaCategory,
        payload: &MediaPayload,
        suggested_name: Option<&str>,
    ) -> PublishResult<PublishedMedia> {
        self.publish_blocking_with(category, payload, suggested_name, &CancellationFlag::new())
    }

    /// Publish on the current thread, observing `cancel` up to the commit point.
    #[instrument(
        skip(self, payload, suggested_name, cancel),
        fields(category = %category, payload = payload.kind_name(), volume = %self.volume)
    )]
    pub fn publish_blocking_with(
        &self,
        category: MediaCategory,
        payload: &MediaPayload,
        suggested_name: Option<&str>,
        cancel: &CancellationFlag,
    ) -> PublishResult<PublishedMedia> {
        if !payload.fits(category) {
            return Err(PublishError::new(PublishErrorKind::PayloadMismatch {
                category: category.to_string(),
                payload: payload.kind_name().to_string(),
            }));
        }
        if cancel.is_cancelled() {
            return Err(PublishError::new(PublishErrorKind::Cancelled));
        }

        let profile = CategoryProfile::for_category(category);
        let captured_at = Utc::now();
        let millis = captured_at.timestamp_millis();

        let display_name = match suggested_name {
            Some(name) => name.to_string(),
            None => profile
                .display_name()
                .derive(millis, payload.source_path())
                .ok_or_else(|| {
                    PublishError::new(PublishErrorKind::MissingFileName(
                        payload
                            .source_path()
                            .map(|p| p.display().to_string())
                            .unwrap_or_default(),
                    ))
                })?,
        };

        let collection = Collection::new(self.volume.clone(), category);
        let record = profile.pending_record(&display_name, millis);

        let uri = match self.index.insert(&collection, &record) {
            Ok(Some(uri)) => uri,
            Ok(None) => {
                warn!(collection = %collection, "Index declined reservation");
                return Err(PublishError::new(PublishErrorKind::ReservationDenied(
                    collection.to_string(),
                )));
            }
            Err(e) => {
                warn!(collection = %collection, error = %e, "Reservation failed");
                return Err(PublishError::new(PublishErrorKind::ReservationDenied(
                    format!("{}: {}", collection, e),
                )));
            }
        };
        debug!(uri = %uri, display_name = %display_name, "Reserved entry");

        let reservation = Reservation::new(self.index.as_ref(), uri);

        let (size_bytes, content_hash) = match self.write_payload(reservation.uri(), payload) {
            Ok(written) => written,
            Err(kind) => {
                let err = reservation.roll_back(kind);
                error!(error = %err, "Publish failed while writing");
                return Err(err);
            }
        };

        if cancel.is_cancelled() {
            let err = reservation.roll_back(PublishErrorKind::Cancelled);
            warn!(error = %err, "Publish cancelled before commit");
            return Err(err);
        }

        match self.index.update(reservation.uri(), &PublishRecord::commit()) {
            Ok(1) => {}
            Ok(rows) => {
                let err = reservation.roll_back(PublishErrorKind::CommitFailed(format!(
                    "expected 1 entry updated, got {}",
                    rows
                )));
                error!(error = %err, "Publish failed while committing");
                return Err(err);
            }
            Err(e) => {
                let err = reservation.roll_back(PublishErrorKind::CommitFailed(e.to_string()));
                error!(error = %err, "Publish failed while committing");
                return Err(err);
            }
        }
        let uri = reservation.commit();

        let display_name = match self.index.entry(&uri) {
            Ok(entry) => entry
                .and_then(|entry| entry.display_name().map(str::to_string))
                .unwrap_or(display_name),
            Err(e) => {
                warn!(uri = %uri, error = %e, "Could not read back published entry");
                display_name
            }
        };

        info!(
            uri = %uri,
            display_name = %display_name,
            size = size_bytes,
            hash = %content_hash,
            "Published media"
        );

        Ok(PublishedMedia::new(
            uri,
            category,
            display_name,
            profile.relative_path().to_string(),
            profile.mime_type().to_string(),
            size_bytes,
            content_hash,
            captured_at,
        ))
    }

    /// Stream the payload into a reservation.
    ///
    /// Both streams are scoped to this call and closed on every exit path.
    fn write_payload(
        &self,
        uri: &MediaUri,
        payload: &MediaPayload,
    ) -> Result<(u64, String), PublishErrorKind> {
        let sink = self
            .index
            .open_write(uri)
            .map_err(write_failed)?
            .ok_or_else(|| write_failed(format_args!("no write stream for {}", uri)))?;
        let mut out = HashingWriter::new(sink);

        match payload {
            MediaPayload::Image(bitmap) => {
                let encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
                bitmap
                    .to_rgb8()
                    .write_with_encoder(encoder)
                    .map_err(|e| write_failed(format_args!("JPEG encoding failed: {}", e)))?;
            }
            MediaPayload::File(path) => {
                let mut input = self
                    .index
                    .open_read(&ReadSource::File(path.clone()))
                    .map_err(write_failed)?
                    .ok_or_else(|| write_failed(format_args!("cannot open {}", path.display())))?;
                std::io::copy(&mut input, &mut out).map_err(|e| {
                    write_failed(format_args!("copy from {} failed: {}", path.display(), e))
                })?;
            }
        }

        out.flush()
            .map_err(|e| write_failed(format_args!("flush failed: {}", e)))?;
        Ok(out.finish())
    }
}

fn write_failed(reason: impl std::fmt::Display) -> PublishErrorKind {
    PublishErrorKind::WriteFailed(reason.to_string())
}
