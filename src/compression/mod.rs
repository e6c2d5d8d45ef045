//! Compression Pipeline (C6) — the core algorithm (§4.6): staged
//! candidate-generation across external binaries, a parallel heavy lane,
//! validated selection subject to a savings threshold, and a determinism
//! pass over the chosen output.

pub mod config;
mod image_heavy;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

pub use config::{CompressionConfig, Profile};
pub use image_heavy::ImageMetrics;

use crate::error::{WorkerError, WorkerResult};
use crate::models::{Candidate, CandidateMethod, StepRecord};
use crate::pdf::PdfHandle;
use crate::scratch::ScratchDir;
use crate::tool_runner::{binary_available, run_bounded};

const QPDF: &str = "qpdf";
const MUTOOL: &str = "mutool";
const GHOSTSCRIPT: &str = "gs";
const PDFSIZEOPT: &str = "pdfsizeopt";
const JBIG2: &str = "jbig2";

#[derive(Debug, Clone, Serialize)]
pub struct CompressionReport {
    pub status: &'static str,
    pub method: &'static str,
    pub profile: &'static str,
    pub original_bytes: u64,
    pub output_bytes: u64,
    pub savings_bytes: i64,
    pub savings_percent: f64,
    pub steps: Vec<StepRecord>,
    pub warnings: Vec<String>,
    pub image_metrics: ImageMetrics,
}

struct Pipeline<'a> {
    cfg: &'a CompressionConfig,
    scratch: &'a ScratchDir,
    stem: String,
    timeout: Duration,
    expected_pages: usize,
    steps: Vec<StepRecord>,
    warnings: Vec<String>,
    candidates: Vec<Candidate>,
}

/// Runs the full staged pipeline against `input`, writing the selected
/// output to `output_path`. Never fails unless zero candidates survive
/// validation (§4.6 Failure policy) or the input is rejected up front as
/// encrypted.
pub async fn compress_pdf(
    input: &Path,
    output_path: &Path,
    scratch: &ScratchDir,
    cfg: &CompressionConfig,
) -> WorkerResult<CompressionReport> {
    let original_bytes = std::fs::metadata(input)
        .map_err(|e| WorkerError::transient(format!("cannot stat input: {e}")))?
        .len();
    let size_mb = ((original_bytes as f64) / (1024.0 * 1024.0)).ceil().max(1.0) as u64;

    let mut warnings = Vec::new();
    let handle = match PdfHandle::open(input) {
        Ok(h) => {
            if h.is_encrypted() {
                return Err(WorkerError::user("PDF is encrypted"));
            }
            Some(h)
        }
        Err(err) => {
            warnings.push(format!("preflight read warning: {err}"));
            None
        }
    };

    let expected_pages = handle
        .as_ref()
        .map(|h| h.page_count())
        .filter(|&p| p > 0)
        .unwrap_or(1);

    let image_metrics = handle
        .as_ref()
        .map(|h| image_heavy::classify(h))
        .transpose()?
        .unwrap_or(ImageMetrics {
            image_heavy: false,
            images_per_page: 0.0,
            text_chars_per_page: 0.0,
        });

    let timeout = cfg.timeout_for(size_mb, expected_pages as u64);
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let mut pipeline = Pipeline {
        cfg,
        scratch,
        stem,
        timeout,
        expected_pages,
        steps: Vec::new(),
        warnings,
        candidates: vec![Candidate {
            path: input.to_path_buf(),
            method: CandidateMethod::Original,
            label: "original".to_string(),
            size: original_bytes,
        }],
    };

    info!(
        input = %input.display(),
        size_mb,
        pages = expected_pages,
        image_heavy = image_metrics.image_heavy,
        "starting compression pipeline"
    );

    let base = pipeline.normalize(input).await;
    pipeline.optimize(&base).await;

    let image_heavy_branch_taken =
        cfg.auto_image_heavy && image_metrics.image_heavy && size_mb >= cfg.gs_min_size_mb;
    if image_heavy_branch_taken {
        pipeline.early_ghostscript(&base).await;
    }
    if cfg.parallelism > 1 {
        pipeline
            .parallel_heavy_lane(&base, size_mb, !image_heavy_branch_taken)
            .await;
    }

    if pipeline.candidates.len() <= 1 {
        warn!(input = %input.display(), "no compression candidate survived validation");
        return Err(WorkerError::user(
            "Could not compress this PDF due to malformed structure; try Repair PDF first.",
        ));
    }

    let chosen = pipeline.select();
    let (status, chosen, savings_bytes, savings_fraction) = pipeline.apply_threshold(chosen);
    info!(method = chosen.method.as_str(), status, savings_bytes, "compression pipeline selected candidate");

    pipeline.materialize(&chosen, output_path)?;
    if status == "success" {
        // A `no_change` status means the output is the original file,
        // returned unmodified (passthrough); re-emitting it through qpdf
        // here would make it bit-for-bit different from the input.
        pipeline.determinism_pass(output_path).await;
        if cfg.use_zopfli {
            pipeline.zopfli_pass(output_path).await;
        }
    }
    pipeline.cleanup(input, output_path);

    let output_bytes = std::fs::metadata(output_path)
        .map(|m| m.len())
        .unwrap_or(original_bytes);

    Ok(CompressionReport {
        status,
        method: chosen.method.as_str(),
        profile: profile_label(cfg.profile),
        original_bytes,
        output_bytes,
        savings_bytes,
        savings_percent: (savings_fraction * 100.0 * 100.0).round() / 100.0,
        steps: pipeline.steps,
        warnings: pipeline.warnings,
        image_metrics,
    })
}

fn profile_label(profile: Profile) -> &'static str {
    match profile {
        Profile::Light => "light",
        Profile::Balanced => "balanced",
        Profile::Strong => "strong",
    }
}

impl<'a> Pipeline<'a> {
    fn validate(&self, path: &Path) -> bool {
        validate_candidate(path, self.expected_pages)
    }

    fn push_candidate(&mut self, path: PathBuf, method: CandidateMethod, label: &str) {
        if !self.validate(&path) {
            return;
        }
        let size = match std::fs::metadata(&path) {
            Ok(m) => m.len(),
            Err(_) => return,
        };
        self.candidates.push(Candidate {
            path,
            method,
            label: label.to_string(),
            size,
        });
    }

    async fn run_step(
        &mut self,
        name: &str,
        binary: &str,
        args: &[&str],
        timeout: Duration,
        env_overlay: &HashMap<String, String>,
    ) -> Option<()> {
        if !binary_available(binary) {
            self.warnings.push(format!("{binary} not found on PATH; skipping {name}"));
            return None;
        }
        let outcome = run_bounded(binary, args, None, env_overlay, timeout).await;
        let mut step = StepRecord::new(name, outcome.ok, outcome.elapsed_ms);
        if !outcome.ok {
            let note = if outcome.timeout {
                "timeout".to_string()
            } else {
                outcome.stderr.clone()
            };
            step = step.with_notes(note);
        }
        let ok = outcome.ok;
        self.steps.push(step);
        ok.then_some(())
    }

    /// Stage 1: pick the first normalize strategy that succeeds. Falls
    /// through to a library rewrite if neither external tool is present or
    /// both fail.
    async fn normalize(&mut self, input: &Path) -> PathBuf {
        let out = self.scratch.intermediate_path(&self.stem, "normalize");
        let mut mutool_args = vec!["clean", "-gggg", "-z", "-i", "-f", "-t"];
        if self.cfg.mutool_object_streams {
            mutool_args.push("-Z");
        }
        let in_str = input.to_string_lossy().into_owned();
        let out_str = out.to_string_lossy().into_owned();
        let mut full_args = mutool_args;
        full_args.push(&in_str);
        full_args.push(&out_str);

        if self
            .run_step("normalize_mutool", MUTOOL, &full_args, self.timeout, &HashMap::new())
            .await
            .is_some()
        {
            self.push_candidate(out.clone(), CandidateMethod::Mutool, "normalize");
            if self.validate(&out) {
                return out;
            }
        }

        let out = self.scratch.intermediate_path(&self.stem, "normalize_qpdf");
        let out_str = out.to_string_lossy().into_owned();
        let args = [
            "--object-streams=generate",
            "--compress-streams=y",
            "--recompress-flate",
            &in_str,
            &out_str,
        ];
        if self
            .run_step("normalize_qpdf", QPDF, &args, self.timeout, &HashMap::new())
            .await
            .is_some()
        {
            self.push_candidate(out.clone(), CandidateMethod::Qpdf, "normalize");
            if self.validate(&out) {
                return out;
            }
        }

        let out = self.scratch.intermediate_path(&self.stem, "normalize_lib");
        let start = Instant::now();
        let ok = crate::pdf::rewrite_compressed(input, &out).is_ok();
        self.steps
            .push(StepRecord::new("normalize_library", ok, start.elapsed().as_millis() as u64));
        if ok {
            self.push_candidate(out.clone(), CandidateMethod::Pypdf, "normalize");
            if self.validate(&out) {
                return out;
            }
        }

        input.to_path_buf()
    }

    /// Stage 2: always attempted when the tool is present, on top of the
    /// normalized base.
    async fn optimize(&mut self, base: &Path) {
        let base_str = base.to_string_lossy().into_owned();

        let qpdf_out = self.scratch.intermediate_path(&self.stem, "optimized");
        let qpdf_out_str = qpdf_out.to_string_lossy().into_owned();
        let qpdf_args = [
            "--object-streams=generate",
            "--compress-streams=y",
            "--recompress-flate",
            &base_str,
            &qpdf_out_str,
        ];
        if self
            .run_step("optimize_qpdf", QPDF, &qpdf_args, self.timeout, &HashMap::new())
            .await
            .is_some()
        {
            self.push_candidate(qpdf_out, CandidateMethod::Qpdf, "optimize");
        }

        let mutool_out = self.scratch.intermediate_path(&self.stem, "mutool_opt");
        let mutool_out_str = mutool_out.to_string_lossy().into_owned();
        let mutool_args = ["merge", "-O", "compress", &base_str, &mutool_out_str];
        if self
            .run_step("optimize_mutool", MUTOOL, &mutool_args, self.timeout, &HashMap::new())
            .await
            .is_some()
        {
            self.push_candidate(mutool_out, CandidateMethod::Mutool, "optimize");
        }
    }

    /// Stage 3: run early on the image-heavy branch instead of the
    /// parallel heavy lane's (non-image-heavy) Ghostscript probe.
    async fn early_ghostscript(&mut self, base: &Path) {
        let preset = self
            .cfg
            .gs_preset_override
            .clone()
            .unwrap_or_else(|| self.cfg.profile.gs_preset().to_string());
        let gs_out = self.scratch.intermediate_path(&self.stem, "ghostscript");
        if self.run_ghostscript(base, &gs_out, &preset, self.timeout).await {
            self.push_candidate(gs_out.clone(), CandidateMethod::Ghostscript, "early_gs");

            let after_out = self.scratch.intermediate_path(&self.stem, "qpdf_after_gs");
            let gs_out_str = gs_out.to_string_lossy().into_owned();
            let after_out_str = after_out.to_string_lossy().into_owned();
            let args = [
                "--object-streams=generate",
                "--compress-streams=y",
                "--recompress-flate",
                &gs_out_str,
                &after_out_str,
            ];
            if self
                .run_step("qpdf_after_gs", QPDF, &args, self.timeout, &HashMap::new())
                .await
                .is_some()
            {
                self.push_candidate(after_out, CandidateMethod::QpdfAfterGs, "qpdf_after_gs");
            }
        }
    }

    async fn run_ghostscript(
        &mut self,
        input: &Path,
        output: &Path,
        preset: &str,
        timeout: Duration,
    ) -> bool {
        let input_str = input.to_string_lossy().into_owned();
        let output_flag = format!("-sOutputFile={}", output.to_string_lossy());
        let preset_flag = format!("-dPDFSETTINGS=/{preset}");
        let mut args = vec![
            "-sDEVICE=pdfwrite",
            "-dCompatibilityLevel=1.4",
            preset_flag.as_str(),
            "-dNOPAUSE",
            "-dBATCH",
            "-dQUIET",
        ];
        if self.cfg.gs_extra_flags {
            args.push("-dDetectDuplicateImages=true");
        }
        if self.cfg.gs_passthrough_jpeg {
            args.push("-dPassThroughJPGImages=true");
        }
        args.push(output_flag.as_str());
        args.push(input_str.as_str());

        self.run_step("ghostscript", GHOSTSCRIPT, &args, timeout, &HashMap::new())
            .await
            .is_some()
    }

    /// Stage 4: image-opt, pdfsizeopt, and (non-image-heavy) Ghostscript
    /// lanes, bounded by a semaphore sized to `parallelism` and executed
    /// concurrently, merging their results only after every lane joins.
    async fn parallel_heavy_lane(&mut self, base: &Path, size_mb: u64, include_gs_lane: bool) {
        let semaphore = Arc::new(Semaphore::new(self.cfg.parallelism.max(1) as usize));
        let mut handles = Vec::new();

        if self.cfg.enable_image_opt {
            let permit = semaphore.clone();
            let base = base.to_path_buf();
            let out = self.scratch.intermediate_path(&self.stem, "qpdf_oi");
            let cfg = self.cfg.clone();
            let timeout = self.timeout;
            handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.ok();
                run_image_opt_lane(&base, &out, &cfg, timeout).await
            }));
        }

        let best_so_far = self.candidates.iter().map(|c| c.size).min().unwrap_or(u64::MAX);
        let original_bytes = self.candidates[0].size;
        let threshold_already_met = {
            let savings = original_bytes.saturating_sub(best_so_far);
            savings >= self.cfg.min_savings_bytes
                && (savings as f64 / original_bytes.max(1) as f64) >= self.cfg.savings_threshold_fraction
        };

        if self.cfg.enable_pdfsizeopt && !threshold_already_met {
            let permit = semaphore.clone();
            let base = base.to_path_buf();
            let out = self.scratch.intermediate_path(&self.stem, "pdfsizeopt");
            let cfg = self.cfg.clone();
            let timeout = self.timeout;
            handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.ok();
                run_pdfsizeopt_lane(&base, &out, &cfg, timeout).await
            }));
        }

        if include_gs_lane {
            let permit = semaphore.clone();
            let base = base.to_path_buf();
            let out = self.scratch.intermediate_path(&self.stem, "ghostscript");
            let preset = self
                .cfg
                .gs_preset_override
                .clone()
                .unwrap_or_else(|| self.cfg.profile.gs_preset().to_string());
            let probe_timeout = self.cfg.probe_timeout_for(self.timeout);
            let full_timeout = self.timeout;
            let total_pages = self.expected_pages;
            let probe_pages = self.cfg.timeout_probe_pages.max(1) as usize;
            let gs_extra_flags = self.cfg.gs_extra_flags;
            let gs_passthrough_jpeg = self.cfg.gs_passthrough_jpeg;
            handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.ok();
                run_ghostscript_lane(
                    &base,
                    &out,
                    &preset,
                    probe_timeout,
                    full_timeout,
                    total_pages,
                    probe_pages,
                    gs_extra_flags,
                    gs_passthrough_jpeg,
                )
                .await
            }));
        }

        for handle in handles {
            match handle.await {
                Ok(bundle) => {
                    for step in bundle.steps {
                        self.steps.push(step);
                    }
                    for warning in bundle.warnings {
                        self.warnings.push(warning);
                    }
                    if let Some((path, method, label)) = bundle.candidate {
                        self.push_candidate(path, method, &label);
                    }
                }
                Err(err) => {
                    self.warnings.push(format!("heavy lane task join error: {err}"));
                }
            }
        }
        let _ = size_mb;
    }

    /// Stage 5: pure `argmin` by size over validated candidates.
    fn select(&self) -> Candidate {
        self.candidates
            .iter()
            .min_by_key(|c| c.size)
            .cloned()
            .expect("at least the original candidate is always present")
    }

    /// Stage 6: enforce the joint savings threshold, falling back to the
    /// original file (relabeled `passthrough`) when it isn't met, or when
    /// the smallest candidate already *was* the original.
    fn apply_threshold(&mut self, mut chosen: Candidate) -> (&'static str, Candidate, i64, f64) {
        let original = self.candidates[0].clone();
        let savings_bytes = original.size as i64 - chosen.size as i64;
        let savings_fraction = savings_bytes as f64 / original.size.max(1) as f64;

        if chosen.method == CandidateMethod::Original {
            chosen.method = CandidateMethod::Passthrough;
            self.warnings.push("no stage beat the original; passing through".to_string());
        }

        let meets_threshold = savings_bytes >= self.cfg.min_savings_bytes as i64
            && savings_fraction >= self.cfg.savings_threshold_fraction;

        if !meets_threshold {
            self.warnings.push("savings below threshold; reverting to original".to_string());
            let mut reverted = original.clone();
            reverted.method = CandidateMethod::Passthrough;
            return ("no_change", reverted, 0, 0.0);
        }

        ("success", chosen, savings_bytes, savings_fraction)
    }

    fn materialize(&self, chosen: &Candidate, output_path: &Path) -> WorkerResult<()> {
        if chosen.path == self.candidates[0].path {
            std::fs::copy(&chosen.path, output_path)
                .map_err(|e| WorkerError::transient(format!("cannot copy original to output: {e}")))?;
        } else if std::fs::rename(&chosen.path, output_path).is_err() {
            std::fs::copy(&chosen.path, output_path)
                .map_err(|e| WorkerError::transient(format!("cannot materialize output: {e}")))?;
        }
        Ok(())
    }

    /// Stage 8: a deterministic-id recompression pass, replacing the
    /// output only if it succeeds and still validates.
    async fn determinism_pass(&mut self, output_path: &Path) {
        if !binary_available(QPDF) {
            return;
        }
        let bounded = self.timeout.min(Duration::from_secs(120));
        let candidate_out = self.scratch.intermediate_path(&self.stem, "deterministic");
        let in_str = output_path.to_string_lossy().into_owned();
        let out_str = candidate_out.to_string_lossy().into_owned();
        let args = [
            "--object-streams=generate",
            "--compress-streams=y",
            "--recompress-flate",
            "--compression-level=9",
            "--deterministic-id",
            &in_str,
            &out_str,
        ];
        if self
            .run_step("determinism_pass", QPDF, &args, bounded, &HashMap::new())
            .await
            .is_some()
            && self.validate(&candidate_out)
        {
            let _ = std::fs::copy(&candidate_out, output_path);
        }
    }

    /// Stage 9: an optional zopfli re-deflate, adopted only when its own
    /// savings independently clear the threshold against the current
    /// output.
    async fn zopfli_pass(&mut self, output_path: &Path) {
        if !binary_available(QPDF) {
            return;
        }
        let current_size = std::fs::metadata(output_path).map(|m| m.len()).unwrap_or(0);
        let bounded = self.timeout.min(Duration::from_secs(120));
        let candidate_out = self.scratch.intermediate_path(&self.stem, "zopfli");
        let in_str = output_path.to_string_lossy().into_owned();
        let out_str = candidate_out.to_string_lossy().into_owned();
        let args = [
            "--object-streams=generate",
            "--compress-streams=y",
            "--recompress-flate",
            "--compression-level=9",
            "--deterministic-id",
            &in_str,
            &out_str,
        ];
        let mut env = HashMap::new();
        env.insert("QPDF_ZOPFLI".to_string(), "enabled".to_string());
        if self
            .run_step("zopfli_pass", QPDF, &args, bounded, &env)
            .await
            .is_some()
            && self.validate(&candidate_out)
        {
            let zopfli_size = std::fs::metadata(&candidate_out).map(|m| m.len()).unwrap_or(u64::MAX);
            let savings = current_size.saturating_sub(zopfli_size);
            let meets = savings >= self.cfg.min_savings_bytes
                && (savings as f64 / current_size.max(1) as f64) >= self.cfg.savings_threshold_fraction;
            if meets {
                let _ = std::fs::copy(&candidate_out, output_path);
            }
        }
    }

    /// Stage 10: best-effort unlink of every scratch intermediate except
    /// the input and the final output.
    fn cleanup(&self, input: &Path, output_path: &Path) {
        for candidate in &self.candidates {
            if candidate.path != input && candidate.path != output_path && candidate.path.exists() {
                let _ = std::fs::remove_file(&candidate.path);
            }
        }
    }
}

/// A candidate is valid iff it exists, is non-empty, `qpdf --check` (when
/// present) exits cleanly, its page count matches the input, and its first
/// page renders.
fn validate_candidate(path: &Path, expected_pages: usize) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if meta.len() == 0 {
        return false;
    }
    if binary_available(QPDF) {
        let check = std::process::Command::new(QPDF)
            .arg("--check")
            .arg(path)
            .output();
        if !matches!(check, Ok(o) if o.status.success()) {
            return false;
        }
    }
    let Ok(handle) = PdfHandle::open(path) else {
        return false;
    };
    if handle.page_count() != expected_pages {
        return false;
    }
    PdfHandle::renders_first_page(path)
}

struct LaneBundle {
    steps: Vec<StepRecord>,
    warnings: Vec<String>,
    candidate: Option<(PathBuf, CandidateMethod, String)>,
}

async fn run_image_opt_lane(
    base: &Path,
    out: &Path,
    cfg: &CompressionConfig,
    timeout: Duration,
) -> LaneBundle {
    let mut bundle = LaneBundle {
        steps: Vec::new(),
        warnings: Vec::new(),
        candidate: None,
    };
    if !binary_available(QPDF) {
        bundle.warnings.push("qpdf not found; skipping image-opt lane".to_string());
        return bundle;
    }
    let base_str = base.to_string_lossy().into_owned();
    let out_str = out.to_string_lossy().into_owned();
    let quality = format!("--oi-quality={}", cfg.qpdf_oi_quality);
    let min_width = format!("--oi-min-width={}", cfg.qpdf_oi_min_width);
    let min_height = format!("--oi-min-height={}", cfg.qpdf_oi_min_height);
    let min_area = format!("--oi-min-area={}", cfg.qpdf_oi_min_area);
    let mut args = vec!["--optimize-images", quality.as_str(), min_width.as_str(), min_height.as_str(), min_area.as_str()];
    if cfg.qpdf_oi_keep_inline_images {
        args.push("--oi-keep-inline-images");
    }
    args.push(base_str.as_str());
    args.push(out_str.as_str());

    let outcome = run_bounded(QPDF, &args, None, &HashMap::new(), timeout).await;
    let mut step = StepRecord::new("image_opt_lane", outcome.ok, outcome.elapsed_ms);
    if !outcome.ok {
        step = step.with_notes(if outcome.timeout { "timeout".into() } else { outcome.stderr.clone() });
    }
    let ok = outcome.ok;
    bundle.steps.push(step);
    if ok {
        bundle.candidate = Some((out.to_path_buf(), CandidateMethod::QpdfOptimizeImages, "image_opt".to_string()));
    }
    bundle
}

async fn run_pdfsizeopt_lane(
    base: &Path,
    out: &Path,
    cfg: &CompressionConfig,
    timeout: Duration,
) -> LaneBundle {
    let mut bundle = LaneBundle {
        steps: Vec::new(),
        warnings: Vec::new(),
        candidate: None,
    };
    if !binary_available(PDFSIZEOPT) {
        bundle.warnings.push("pdfsizeopt not found; skipping pdfsizeopt lane".to_string());
        return bundle;
    }
    if cfg.enable_jbig2 && !binary_available(JBIG2) {
        bundle.warnings.push("jbig2 not found; running pdfsizeopt without JBIG2".to_string());
    }
    let base_str = base.to_string_lossy().into_owned();
    let out_str = out.to_string_lossy().into_owned();
    let mut args = vec![];
    let jbig2_flag;
    if cfg.enable_jbig2 && binary_available(JBIG2) {
        jbig2_flag = "--use-image-optimizer=jbig2".to_string();
        args.push(jbig2_flag.as_str());
    }
    args.push(base_str.as_str());
    args.push(out_str.as_str());

    let outcome = run_bounded(PDFSIZEOPT, &args, None, &HashMap::new(), timeout).await;
    let method = if cfg.enable_jbig2 && binary_available(JBIG2) {
        CandidateMethod::PdfsizeoptJbig2
    } else {
        CandidateMethod::Pdfsizeopt
    };
    let mut step = StepRecord::new("pdfsizeopt_lane", outcome.ok, outcome.elapsed_ms);
    if !outcome.ok {
        step = step.with_notes(if outcome.timeout { "timeout".into() } else { outcome.stderr.clone() });
    }
    let ok = outcome.ok;
    bundle.steps.push(step);
    if ok {
        bundle.candidate = Some((out.to_path_buf(), method, "pdfsizeopt".to_string()));
    }
    bundle
}

#[allow(clippy::too_many_arguments)]
async fn run_ghostscript_lane(
    base: &Path,
    out: &Path,
    preset: &str,
    probe_timeout: Duration,
    full_timeout: Duration,
    total_pages: usize,
    probe_pages: usize,
    extra_flags: bool,
    passthrough_jpeg: bool,
) -> LaneBundle {
    let mut bundle = LaneBundle {
        steps: Vec::new(),
        warnings: Vec::new(),
        candidate: None,
    };
    if !binary_available(GHOSTSCRIPT) {
        bundle.warnings.push("gs not found; skipping ghostscript lane".to_string());
        return bundle;
    }

    // Probe on the first `probe_pages` pages to extrapolate full runtime.
    let probe_out = out.with_extension("probe.pdf");
    let base_str = base.to_string_lossy().into_owned();
    let probe_out_str = probe_out.to_string_lossy().into_owned();
    let last_page = probe_pages.min(total_pages.max(1));
    let last_page_flag = format!("-dLastPage={last_page}");
    let preset_flag = format!("-dPDFSETTINGS=/{preset}");
    let probe_output_flag = format!("-sOutputFile={probe_out_str}");
    let mut probe_args = vec![
        "-sDEVICE=pdfwrite",
        "-dCompatibilityLevel=1.4",
        preset_flag.as_str(),
        "-dFirstPage=1",
        last_page_flag.as_str(),
        "-dNOPAUSE",
        "-dBATCH",
        "-dQUIET",
    ];
    if extra_flags {
        probe_args.push("-dDetectDuplicateImages=true");
    }
    if passthrough_jpeg {
        probe_args.push("-dPassThroughJPGImages=true");
    }
    probe_args.push(probe_output_flag.as_str());
    probe_args.push(base_str.as_str());

    let probe_start = Instant::now();
    let probe_outcome = run_bounded(GHOSTSCRIPT, &probe_args, None, &HashMap::new(), probe_timeout).await;
    let probe_ms = probe_start.elapsed().as_millis().max(1) as f64;
    let _ = std::fs::remove_file(&probe_out);
    bundle.steps.push(StepRecord::new("gs_probe", probe_outcome.ok, probe_outcome.elapsed_ms));

    if !probe_outcome.ok {
        bundle.warnings.push("ghostscript probe failed; skipping full run".to_string());
        return bundle;
    }

    let estimated_ms = (probe_ms / last_page as f64) * total_pages.max(1) as f64;
    if estimated_ms > full_timeout.as_millis() as f64 {
        bundle
            .warnings
            .push("ghostscript full run estimated over budget; skipped".to_string());
        return bundle;
    }

    let out_str = out.to_string_lossy().into_owned();
    let full_output_flag = format!("-sOutputFile={out_str}");
    let mut full_args = vec![
        "-sDEVICE=pdfwrite",
        "-dCompatibilityLevel=1.4",
        preset_flag.as_str(),
        "-dNOPAUSE",
        "-dBATCH",
        "-dQUIET",
    ];
    if extra_flags {
        full_args.push("-dDetectDuplicateImages=true");
    }
    if passthrough_jpeg {
        full_args.push("-dPassThroughJPGImages=true");
    }
    full_args.push(full_output_flag.as_str());
    full_args.push(base_str.as_str());

    let outcome = run_bounded(GHOSTSCRIPT, &full_args, None, &HashMap::new(), full_timeout).await;
    if !outcome.ok {
        // One retry with -dNEWPDF=false, per §4.6 step 4.
        let mut retry_args = full_args.clone();
        retry_args.insert(0, "-dNEWPDF=false");
        let retry = run_bounded(GHOSTSCRIPT, &retry_args, None, &HashMap::new(), full_timeout).await;
        bundle.steps.push(StepRecord::new("gs_full_retry", retry.ok, retry.elapsed_ms));
        if retry.ok {
            bundle.candidate = Some((out.to_path_buf(), CandidateMethod::Ghostscript, "heavy_lane".to_string()));
        }
        return bundle;
    }
    bundle.steps.push(StepRecord::new("gs_full", outcome.ok, outcome.elapsed_ms));
    bundle.candidate = Some((out.to_path_buf(), CandidateMethod::Ghostscript, "heavy_lane".to_string()));
    bundle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_rejects_small_savings() {
        let cfg = CompressionConfig {
            min_savings_bytes: 1000,
            savings_threshold_fraction: 0.5,
            ..CompressionConfig::from_env()
        };
        let scratch = ScratchDir::new().unwrap();
        let mut pipeline = Pipeline {
            cfg: &cfg,
            scratch: &scratch,
            stem: "doc".to_string(),
            timeout: Duration::from_secs(10),
            expected_pages: 1,
            steps: Vec::new(),
            warnings: Vec::new(),
            candidates: vec![Candidate {
                path: PathBuf::from("/tmp/original.pdf"),
                method: CandidateMethod::Original,
                label: "original".to_string(),
                size: 1000,
            }],
        };
        let chosen = Candidate {
            path: PathBuf::from("/tmp/smaller.pdf"),
            method: CandidateMethod::Qpdf,
            label: "optimize".to_string(),
            size: 990,
        };
        let (status, final_candidate, savings, _fraction) = pipeline.apply_threshold(chosen);
        assert_eq!(status, "no_change");
        assert_eq!(final_candidate.method, CandidateMethod::Passthrough);
        assert_eq!(savings, 0);
    }

    #[test]
    fn select_picks_smallest_candidate() {
        let scratch = ScratchDir::new().unwrap();
        let cfg = CompressionConfig::from_env();
        let pipeline = Pipeline {
            cfg: &cfg,
            scratch: &scratch,
            stem: "doc".to_string(),
            timeout: Duration::from_secs(10),
            expected_pages: 1,
            steps: Vec::new(),
            warnings: Vec::new(),
            candidates: vec![
                Candidate { path: PathBuf::from("a"), method: CandidateMethod::Original, label: "o".into(), size: 500 },
                Candidate { path: PathBuf::from("b"), method: CandidateMethod::Qpdf, label: "b".into(), size: 300 },
                Candidate { path: PathBuf::from("c"), method: CandidateMethod::Ghostscript, label: "c".into(), size: 700 },
            ],
        };
        assert_eq!(pipeline.select().size, 300);
    }
}
