//! `yt-dlp` backed extractor.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use audiodrop_shared::{ExtractorConfig, QualitySelector};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use super::error::ExtractionError;
use super::types::{ExtractOptions, ExtractedMedia, Extractor};

/// Output template: the provider id names the file, the tool picks the extension.
const OUTPUT_TEMPLATE: &str = "%(id)s.%(ext)s";

/// Printed once the final file is in place (after any transcode).
const REPORT_TEMPLATE: &str = "after_move:%(.{id,ext,filepath})j";

/// Lines of diagnostic output kept in failure messages.
const STDERR_TAIL_LINES: usize = 3;

/// Extractor that drives the `yt-dlp` command line tool.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    program: String,
    program_args: Vec<String>,
    timeout: Option<Duration>,
}

/// The JSON line printed by [`REPORT_TEMPLATE`].
#[derive(Debug, Deserialize)]
struct MediaReport {
    id: String,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    filepath: Option<PathBuf>,
}

impl YtDlpExtractor {
    /// Create an extractor that runs `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            program_args: Vec::new(),
            timeout: None,
        }
    }

    /// Create an extractor from configuration.
    #[must_use]
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            program: config.program.clone(),
            program_args: config.program_args.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Set arguments placed before the generated ones.
    #[must_use]
    pub fn with_program_args(mut self, args: Vec<String>) -> Self {
        self.program_args = args;
        self
    }

    /// Set an upper bound for one run.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the tool's argument list for one request.
    #[must_use]
    pub fn build_args(&self, url: &str, options: &ExtractOptions) -> Vec<OsString> {
        let format = match options.quality {
            QualitySelector::Best => "bestaudio/best",
            QualitySelector::Worst => "worstaudio/worst",
        };

        let mut args: Vec<OsString> = self.program_args.iter().map(OsString::from).collect();
        args.extend(
            [
                "--no-playlist",
                "--no-progress",
                "--no-simulate",
                "--format",
                format,
                "--extract-audio",
                "--audio-format",
                options.codec.as_str(),
            ]
            .map(OsString::from),
        );

        if let Some(kbps) = options.bitrate_kbps {
            args.push("--audio-quality".into());
            args.push(format!("{kbps}K").into());
        }

        if let Some(cookies) = &options.cookie_file {
            args.push("--cookies".into());
            args.push(cookies.clone().into_os_string());
        }

        args.push("--output".into());
        args.push(options.output_dir.join(OUTPUT_TEMPLATE).into_os_string());
        args.push("--print".into());
        args.push(REPORT_TEMPLATE.into());
        // Keep a URL starting with '-' from being read as an option.
        args.push("--".into());
        args.push(url.into());
        args
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn extract(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<ExtractedMedia, ExtractionError> {
        let args = self.build_args(url, options);
        debug!(program = %self.program, ?args, "Starting extraction");

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExtractionError::spawn(&self.program, &e))?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ExtractionError::TimedOut(limit.as_secs()))??,
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::failed(
                output.status.to_string(),
                stderr_tail(&stderr),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let report = parse_report(&stdout).ok_or(ExtractionError::MissingOutput)?;
        let path = match (report.filepath, report.ext) {
            (Some(path), _) => path,
            (None, Some(ext)) => options.output_dir.join(format!("{}.{ext}", report.id)),
            (None, None) => return Err(ExtractionError::MissingOutput),
        };

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ExtractionError::FileMissing(path.display().to_string()));
        }

        let media = ExtractedMedia::new(report.id, path);
        info!(
            media_id = %media.id,
            extension = %media.extension,
            "Extraction complete"
        );
        Ok(media)
    }
}

/// Find the last line of `stdout` that is a media report.
fn parse_report(stdout: &str) -> Option<MediaReport> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| serde_json::from_str(line).ok())
}

/// Last few non-empty lines of diagnostic output.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return "no diagnostic output".to_string();
    }
    lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("; ")
}
