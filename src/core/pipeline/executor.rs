//! Pipeline execution implementation.

use super::report::{EntityReport, PipelineResult, RankedFile, ReferenceReport};
use crate::core::annotate::{self, BoxScope};
use crate::core::detector::{run_inference, DetectionResult, InferenceOptions, ObjectDetector};
use crate::core::embedder::{Embedding, EmbeddingCache, ImageEmbedder};
use crate::core::grouping::{BoxIndex, EntityIndex, GroupingMode};
use crate::core::ranking::{rank_candidates, DEFAULT_TOP_K};
use crate::core::scanner::{ImageScanner, ScanConfig, WalkDirScanner};
use crate::error::{AnnotateError, EntityMatchError};
use crate::events::{
    null_sender, Event, EventSender, PipelineEvent, PipelinePhase, PipelineSummary, RankEvent,
    RankProgress,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Folder under the output root that receives detection previews
pub const DETECTIONS_DIR: &str = "detections";

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directories to scan
    pub paths: Vec<PathBuf>,
    /// Where per-image folders go; defaults to each image's own directory
    pub output_dir: Option<PathBuf>,
    /// Matches kept per entity
    pub top_k: usize,
    /// Detections below this confidence are ignored
    pub min_confidence: f32,
    pub grouping: GroupingMode,
    pub box_scope: BoxScope,
    /// Also save every image with all of its detections drawn
    pub save_detections: bool,
    /// Scanner configuration
    pub scan_config: ScanConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            output_dir: None,
            top_k: DEFAULT_TOP_K,
            min_confidence: 0.5,
            grouping: GroupingMode::default(),
            box_scope: BoxScope::default(),
            save_detections: false,
            scan_config: ScanConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), EntityMatchError> {
        if self.paths.is_empty() {
            return Err(EntityMatchError::Config(
                "no input directory given".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(EntityMatchError::Config(
                "top-k must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(EntityMatchError::Config(format!(
                "confidence must be between 0 and 1, got {}",
                self.min_confidence
            )));
        }
        Ok(())
    }

    fn output_root(&self, image: &Path) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(|| image.parent().map(Path::to_path_buf))
            .unwrap_or_default()
    }

    fn preview_dir(&self) -> Option<PathBuf> {
        if !self.save_detections {
            return None;
        }
        self.output_dir
            .as_ref()
            .or_else(|| self.paths.first())
            .map(|root| root.join(DETECTIONS_DIR))
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    detector: Option<Box<dyn ObjectDetector>>,
    embedder: Option<Box<dyn ImageEmbedder>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            detector: None,
            embedder: None,
        }
    }

    /// Add directories to scan
    pub fn paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.paths = paths;
        self
    }

    /// Write per-image folders under `dir` instead of next to the images
    pub fn output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.output_dir = dir;
        self
    }

    pub fn detector(mut self, detector: Box<dyn ObjectDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn embedder(mut self, embedder: Box<dyn ImageEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.top_k = top_k;
        self
    }

    pub fn min_confidence(mut self, min_confidence: f32) -> Self {
        self.config.min_confidence = min_confidence;
        self
    }

    pub fn grouping(mut self, grouping: GroupingMode) -> Self {
        self.config.grouping = grouping;
        self
    }

    pub fn box_scope(mut self, box_scope: BoxScope) -> Self {
        self.config.box_scope = box_scope;
        self
    }

    pub fn save_detections(mut self, save: bool) -> Self {
        self.config.save_detections = save;
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    /// Build the pipeline
    ///
    /// Fails if either model is missing or the configuration is invalid.
    pub fn build(self) -> Result<Pipeline, EntityMatchError> {
        self.config.validate()?;

        let detector = self
            .detector
            .ok_or_else(|| EntityMatchError::Config("no detector configured".to_string()))?;
        let embedder = self
            .embedder
            .ok_or_else(|| EntityMatchError::Config("no encoder configured".to_string()))?;

        Ok(Pipeline {
            config: self.config,
            detector,
            cache: EmbeddingCache::new(embedder),
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters shared across one run
#[derive(Default)]
struct RunState {
    errors: Vec<String>,
    files_written: usize,
}

/// The entity matching pipeline
pub struct Pipeline {
    config: PipelineConfig,
    detector: Box<dyn ObjectDetector>,
    cache: EmbeddingCache,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline without events
    pub fn run(&mut self) -> Result<PipelineResult, EntityMatchError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(
        &mut self,
        events: &EventSender,
    ) -> Result<PipelineResult, EntityMatchError> {
        let result = self.execute(events);
        if let Err(ref e) = result {
            tracing::error!("Pipeline aborted: {}", e);
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
        }
        result
    }

    fn execute(&mut self, events: &EventSender) -> Result<PipelineResult, EntityMatchError> {
        let start_time = Instant::now();
        let mut state = RunState::default();
        self.cache.clear();

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Scanning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));

        let scanner = WalkDirScanner::new(self.config.scan_config.clone());
        let scan_result = scanner.scan_with_events(&self.config.paths, events)?;

        for error in scan_result.errors {
            state.errors.push(error.to_string());
        }

        let images: Vec<PathBuf> = scan_result.images.into_iter().map(|i| i.path).collect();
        let total_images = images.len();
        tracing::info!(total_images, "scan complete");

        // Phase 2: Detecting
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Detecting,
        }));

        let options = InferenceOptions {
            min_confidence: self.config.min_confidence,
            preview_dir: self.config.preview_dir(),
        };
        let batch = run_inference(self.detector.as_mut(), &images, &options, events);

        for (path, error) in &batch.failures {
            state
                .errors
                .push(format!("{}: {}", path.display(), error));
        }
        state.errors.extend(batch.preview_errors);

        let results = batch.results;

        // Phase 3: Grouping
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Grouping,
        }));

        let boxes = BoxIndex::from_results(&results);
        let mut index = match self.config.grouping {
            GroupingMode::Complete => EntityIndex::from_results(&results),
            GroupingMode::Incremental => EntityIndex::new(),
        };
        tracing::info!(
            processed = results.len(),
            entities = index.len(),
            mode = ?self.config.grouping,
            "grouping ready"
        );

        // Phase 4: Ranking
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Ranking,
        }));
        events.send(Event::Rank(RankEvent::Started {
            total_references: results.len(),
        }));

        let mut references = Vec::with_capacity(results.len());
        for (position, result) in results.iter().enumerate() {
            if self.config.grouping == GroupingMode::Incremental && !index.record(result) {
                continue;
            }

            let report = self.process_reference(result, &index, &boxes, &mut state, events)?;
            references.push(report);

            events.send(Event::Rank(RankEvent::Progress(RankProgress {
                completed: position + 1,
                total: results.len(),
                current_path: result.image.clone(),
                cache_hits: self.cache.stats().hits,
            })));
        }

        let mut result = PipelineResult {
            total_images,
            processed_images: results.len(),
            references,
            files_written: state.files_written,
            cache_hits: self.cache.stats().hits,
            errors: state.errors,
            duration_ms: 0,
        };

        events.send(Event::Rank(RankEvent::Completed {
            entity_groups: result.entity_groups(),
            files_written: result.files_written,
        }));

        result.duration_ms = start_time.elapsed().as_millis() as u64;

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_images: result.total_images,
                processed_images: result.processed_images,
                entity_groups: result.entity_groups(),
                files_written: result.files_written,
                duration_ms: result.duration_ms,
            },
        }));

        Ok(result)
    }

    /// Rank and write every qualifying entity of one reference image
    fn process_reference(
        &mut self,
        result: &DetectionResult,
        index: &EntityIndex,
        boxes: &BoxIndex,
        state: &mut RunState,
        events: &EventSender,
    ) -> Result<ReferenceReport, AnnotateError> {
        let reference = &result.image;
        let output_dir = self.config.output_root(reference).join(stem(reference));
        annotate::ensure_dir(&output_dir)?;

        let mut report = ReferenceReport {
            image: reference.clone(),
            output_dir: output_dir.clone(),
            entities: Vec::new(),
        };
        let mut reference_embedding: Option<Embedding> = None;

        for entity in result.labels() {
            let candidates = index.candidates(entity);
            if candidates.len() <= 1 {
                tracing::debug!(entity, reference = %reference.display(), "entity has a single image");
                continue;
            }

            if reference_embedding.is_none() {
                match self.cache.get(reference) {
                    Ok(embedding) => reference_embedding = Some(embedding),
                    Err(e) => {
                        tracing::warn!(
                            "Skipping entities of '{}': reference embedding failed: {}",
                            reference.display(),
                            e
                        );
                        record_skip(state, events, reference, &e.to_string());
                        break;
                    }
                }
            }
            let Some(embedding) = reference_embedding.as_ref() else {
                break;
            };

            let folder = output_dir.join(annotate::entity_folder_name(entity));
            annotate::ensure_dir(&folder)?;

            let ranking = rank_candidates(
                reference,
                embedding,
                candidates,
                &mut self.cache,
                self.config.top_k,
            );
            for (path, e) in &ranking.skipped {
                record_skip(state, events, path, &e.to_string());
            }

            let mut entity_report = EntityReport {
                entity: entity.to_string(),
                folder: folder.clone(),
                candidates: candidates.len(),
                matches: Vec::with_capacity(ranking.matches.len()),
            };

            for (position, matched) in ranking.matches.into_iter().enumerate() {
                let rank = position + 1;
                let destination = folder.join(annotate::output_file_name(rank));
                let enclosing =
                    annotate::enclosing_rect(boxes, entity, &matched.image, self.config.box_scope);

                match annotate::save_annotated(&matched.image, enclosing, &destination) {
                    Ok(()) => {
                        state.files_written += 1;
                        events.send(Event::Rank(RankEvent::FileWritten {
                            path: destination.clone(),
                        }));
                        entity_report.matches.push(RankedFile {
                            rank,
                            image: matched.image,
                            score: matched.score,
                            output: destination,
                            enclosing,
                        });
                    }
                    Err(e) if !e.is_fatal() => {
                        tracing::warn!("Error annotating '{}': {}", matched.image.display(), e);
                        record_skip(state, events, &matched.image, &e.to_string());
                    }
                    Err(e) => return Err(e),
                }
            }

            tracing::debug!(
                reference = %reference.display(),
                entity,
                candidates = candidates.len(),
                kept = entity_report.matches.len(),
                "entity ranked"
            );
            events.send(Event::Rank(RankEvent::EntityRanked {
                reference: reference.clone(),
                entity: entity.to_string(),
                candidates: candidates.len(),
                kept: entity_report.matches.len(),
            }));

            report.entities.push(entity_report);
        }

        Ok(report)
    }
}

fn record_skip(state: &mut RunState, events: &EventSender, path: &Path, message: &str) {
    state.errors.push(format!("{}: {}", path.display(), message));
    events.send(Event::Rank(RankEvent::Skipped {
        path: path.to_path_buf(),
        message: message.to_string(),
    }));
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
