// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SignatureExtractor — ties a source photo, its thresholded bitmap, and the
// edit session together.
//
// Changing sensitivity or source starts over: the new thresholding result
// replaces the live bitmap and the undo history is discarded. Background passes
// share one ticket counter with those changes, so only the most recent request
// is ever installed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sigextract_core::config::ExtractorConfig;
use sigextract_core::error::Result;
use sigextract_core::types::{Sensitivity, export_file_name};
use tracing::{debug, info, instrument};

use crate::bitmap::Bitmap;
use crate::edit::session::EditSession;
use crate::threshold::adaptive::{ThresholdParams, ThresholdStats, threshold_with_stats};
use crate::threshold::worker::{PendingThreshold, ThresholdOutcome, ThresholdWorker};

pub struct SignatureExtractor {
    source: Arc<Bitmap>,
    sensitivity: Sensitivity,
    config: ExtractorConfig,
    session: EditSession,
    stats: ThresholdStats,
    worker: ThresholdWorker,
}

impl SignatureExtractor {
    /// Threshold `source` at the configured default sensitivity and open an
    /// edit session on the result.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn new(source: Bitmap, config: ExtractorConfig) -> Result<Self> {
        let config = config.validated();
        let sensitivity = Sensitivity::from_percent(config.default_sensitivity_percent);
        let source = Arc::new(source);
        let params = params_for(&source, sensitivity, &config);
        let (bitmap, stats) = threshold_with_stats(&source, &params)?;
        let session = EditSession::with_config(bitmap, &config);
        info!(%sensitivity, "Signature extractor ready");
        Ok(Self {
            source,
            sensitivity,
            config,
            session,
            stats,
            worker: ThresholdWorker::new(),
        })
    }

    /// Decode an encoded image (PNG, JPEG, ...) and threshold it.
    pub fn from_bytes(data: &[u8], config: ExtractorConfig) -> Result<Self> {
        Self::new(Bitmap::decode(data)?, config)
    }

    pub fn source(&self) -> &Bitmap {
        &self.source
    }

    /// Shared handle to the source, for handing to a `ThresholdWorker`.
    pub fn source_arc(&self) -> Arc<Bitmap> {
        Arc::clone(&self.source)
    }

    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Parameters of the current thresholding pass.
    pub fn params(&self) -> ThresholdParams {
        params_for(&self.source, self.sensitivity, &self.config)
    }

    pub fn stats(&self) -> ThresholdStats {
        self.stats
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditSession {
        &mut self.session
    }

    /// Re-threshold at a new sensitivity. Returns `Ok(false)` when the value is
    /// unchanged and nothing was redone.
    #[instrument(skip_all, fields(sensitivity = %sensitivity))]
    pub fn set_sensitivity(&mut self, sensitivity: Sensitivity) -> Result<bool> {
        if sensitivity == self.sensitivity {
            debug!("sensitivity unchanged");
            return Ok(false);
        }
        let params = params_for(&self.source, sensitivity, &self.config);
        let (bitmap, stats) = threshold_with_stats(&self.source, &params)?;
        self.worker.cancel();
        self.sensitivity = sensitivity;
        self.stats = stats;
        self.session.restart(bitmap);
        Ok(true)
    }

    /// Swap in a new source photo ("upload another") and re-threshold it at
    /// the current sensitivity.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn replace_source(&mut self, source: Bitmap) -> Result<()> {
        let source = Arc::new(source);
        let params = params_for(&source, self.sensitivity, &self.config);
        let (bitmap, stats) = threshold_with_stats(&source, &params)?;
        self.worker.cancel();
        self.source = source;
        self.stats = stats;
        self.session.restart(bitmap);
        Ok(())
    }

    /// Start a background pass at `sensitivity` over the current source.
    ///
    /// Supersedes any earlier request. Must be called from within a tokio
    /// runtime.
    pub fn request_threshold(&self, sensitivity: Sensitivity) -> Result<PendingThreshold> {
        self.worker.submit(
            self.source_arc(),
            params_for(&self.source, sensitivity, &self.config),
        )
    }

    /// Drop every outstanding background pass.
    pub fn cancel_threshold(&self) {
        self.worker.cancel();
    }

    /// Install a finished background pass as the new live bitmap.
    ///
    /// Returns `false` (and changes nothing) unless the outcome belongs to the
    /// most recent request: a later request, `set_sensitivity`,
    /// `replace_source`, or `cancel_threshold` all make it stale.
    pub fn apply_threshold_result(&mut self, outcome: ThresholdOutcome) -> bool {
        let latest = self.worker.latest_ticket();
        if outcome.ticket != latest {
            debug!(ticket = outcome.ticket, latest, "stale threshold result ignored");
            return false;
        }
        self.sensitivity = outcome.params.sensitivity;
        self.stats = outcome.stats;
        self.session.restart(outcome.bitmap);
        true
    }

    pub fn export_png(&self) -> Result<Vec<u8>> {
        self.session.export_png()
    }

    pub fn export_file_name(&self, now: DateTime<Utc>) -> String {
        export_file_name(now)
    }

    /// Write the live bitmap to `dir` under its timestamped export name.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn save_to_dir(&self, dir: impl AsRef<Path>, now: DateTime<Utc>) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.export_file_name(now));
        self.session.bitmap().save_png(&path)?;
        info!(path = %path.display(), "Signature exported");
        Ok(path)
    }
}

fn params_for(source: &Bitmap, sensitivity: Sensitivity, config: &ExtractorConfig) -> ThresholdParams {
    ThresholdParams::for_width(source.width(), sensitivity).with_ink_darken(config.ink_darken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::geometry::DisplayPoint;
    use chrono::TimeZone;
    use sigextract_core::error::SigextractError;
    use sigextract_core::types::EditMode;

    /// Light paper with a dark diagonal stroke.
    fn photo() -> Bitmap {
        Bitmap::from_fn(80, 60, |x, y| {
            if x.abs_diff(y) <= 1 {
                [30, 30, 40, 255]
            } else {
                [200, 200, 190, 255]
            }
        })
    }

    #[test]
    fn new_thresholds_at_default() {
        let extractor = SignatureExtractor::new(photo(), ExtractorConfig::default()).unwrap();
        assert_eq!(extractor.sensitivity().percent(), 15);
        assert_eq!(extractor.session().bitmap().dimensions(), (80, 60));
        assert!(extractor.stats().ink_pixels > 0);
        assert_eq!(extractor.session().history_len(), 0);
        // Paper is transparent, stroke is opaque.
        assert_eq!(extractor.session().bitmap().pixel(70, 5).unwrap()[3], 0);
        assert_eq!(extractor.session().bitmap().pixel(20, 20).unwrap()[3], 255);
    }

    #[test]
    fn empty_source_is_rejected() {
        let result = SignatureExtractor::new(Bitmap::new(0, 10), ExtractorConfig::default());
        assert!(matches!(result, Err(SigextractError::EmptyBitmap { .. })));
    }

    #[test]
    fn sensitivity_change_discards_edits() {
        let mut extractor = SignatureExtractor::new(photo(), ExtractorConfig::default()).unwrap();
        let session = extractor.session_mut();
        session.set_mode(EditMode::Erase);
        session.begin_erase(DisplayPoint::new(20.0, 20.0));
        session.end_erase();
        assert_eq!(extractor.session().history_len(), 1);

        assert!(!extractor.set_sensitivity(Sensitivity::from_percent(15)).unwrap());
        assert_eq!(extractor.session().history_len(), 1);

        assert!(extractor.set_sensitivity(Sensitivity::from_percent(40)).unwrap());
        assert_eq!(extractor.session().history_len(), 0);
        assert_eq!(extractor.session().mode(), EditMode::Erase);
        let (expected, _) = threshold_with_stats(extractor.source(), &extractor.params()).unwrap();
        assert_eq!(extractor.session().bitmap(), &expected);
    }

    #[test]
    fn replace_source_rethresholds() {
        let mut extractor = SignatureExtractor::new(photo(), ExtractorConfig::default()).unwrap();
        extractor
            .replace_source(Bitmap::filled(32, 16, [120, 120, 120, 255]))
            .unwrap();
        assert_eq!(extractor.session().bitmap().dimensions(), (32, 16));
        // Uniform gray never falls below its own window mean.
        assert_eq!(extractor.stats().ink_pixels, 0);
        assert_eq!(extractor.stats().total_pixels, 32 * 16);
    }

    #[test]
    fn config_darkening_is_used() {
        let config = ExtractorConfig {
            ink_darken: 0,
            ..Default::default()
        };
        let extractor = SignatureExtractor::new(photo(), config).unwrap();
        assert_eq!(extractor.session().bitmap().pixel(20, 20), Some([30, 30, 40, 255]));
    }

    #[test]
    fn from_bytes_decodes_png() {
        let png = photo().encode_png().unwrap();
        let extractor = SignatureExtractor::from_bytes(&png, ExtractorConfig::default()).unwrap();
        assert_eq!(extractor.source(), &photo());
        assert!(matches!(
            SignatureExtractor::from_bytes(b"not an image", ExtractorConfig::default()),
            Err(SigextractError::Decode(_))
        ));
    }

    #[test]
    fn save_uses_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = SignatureExtractor::new(photo(), ExtractorConfig::default()).unwrap();
        let now = Utc.timestamp_millis_opt(1_712_345_678_901).unwrap();
        let path = extractor.save_to_dir(dir.path(), now).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "firma-extraida-1712345678901.png"
        );
        let written = Bitmap::open(&path).unwrap();
        assert_eq!(&written, extractor.session().bitmap());
    }

    #[tokio::test]
    async fn background_result_replaces_session() {
        let mut extractor = SignatureExtractor::new(photo(), ExtractorConfig::default()).unwrap();
        let stale = extractor.request_threshold(Sensitivity::from_percent(30)).unwrap();
        let fresh = extractor.request_threshold(Sensitivity::from_percent(50)).unwrap();
        assert!(stale.wait().await.unwrap().is_none());

        let outcome = fresh.wait().await.unwrap().unwrap();
        assert!(extractor.apply_threshold_result(outcome));
        assert_eq!(extractor.sensitivity().percent(), 50);
        assert_eq!(extractor.session().history_len(), 0);
    }

    #[tokio::test]
    async fn same_size_source_swap_supersedes_pass() {
        let gray = Bitmap::filled(80, 60, [120, 120, 120, 255]);
        let mut extractor = SignatureExtractor::new(photo(), ExtractorConfig::default()).unwrap();
        let pending = extractor.request_threshold(Sensitivity::from_percent(30)).unwrap();
        extractor.replace_source(gray.clone()).unwrap();

        assert!(pending.wait().await.unwrap().is_none());
        assert_eq!(extractor.source(), &gray);
        assert_eq!(extractor.stats().ink_pixels, 0);
        assert!(extractor.session().bitmap().as_raw().chunks_exact(4).all(|px| px[3] == 0));
    }

    #[tokio::test]
    async fn outcome_held_across_source_swap_is_rejected() {
        let mut extractor = SignatureExtractor::new(photo(), ExtractorConfig::default()).unwrap();
        let outcome = extractor
            .request_threshold(Sensitivity::from_percent(30))
            .unwrap()
            .wait()
            .await
            .unwrap()
            .unwrap();
        extractor
            .replace_source(Bitmap::filled(80, 60, [120, 120, 120, 255]))
            .unwrap();

        assert!(!extractor.apply_threshold_result(outcome));
        assert_eq!(extractor.stats().ink_pixels, 0);
        assert_eq!(extractor.sensitivity().percent(), 15);
    }

    #[tokio::test]
    async fn synchronous_sensitivity_change_wins() {
        let mut extractor = SignatureExtractor::new(photo(), ExtractorConfig::default()).unwrap();
        let pending = extractor.request_threshold(Sensitivity::from_percent(30)).unwrap();
        assert!(extractor.set_sensitivity(Sensitivity::from_percent(60)).unwrap());
        assert!(pending.wait().await.unwrap().is_none());
        assert_eq!(extractor.sensitivity().percent(), 60);

        // Same ordering when the caller already holds the finished pass.
        let outcome = extractor
            .request_threshold(Sensitivity::from_percent(30))
            .unwrap()
            .wait()
            .await
            .unwrap()
            .unwrap();
        assert!(extractor.set_sensitivity(Sensitivity::from_percent(70)).unwrap());
        assert!(!extractor.apply_threshold_result(outcome));
        assert_eq!(extractor.sensitivity().percent(), 70);
        let (expected, _) = threshold_with_stats(extractor.source(), &extractor.params()).unwrap();
        assert_eq!(extractor.session().bitmap(), &expected);
    }

    #[tokio::test]
    async fn cancel_rejects_finished_pass() {
        let mut extractor = SignatureExtractor::new(photo(), ExtractorConfig::default()).unwrap();
        let outcome = extractor
            .request_threshold(Sensitivity::from_percent(30))
            .unwrap()
            .wait()
            .await
            .unwrap()
            .unwrap();
        extractor.cancel_threshold();
        assert!(!extractor.apply_threshold_result(outcome));
        assert_eq!(extractor.sensitivity().percent(), 15);
    }
}
