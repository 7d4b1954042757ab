use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::DownloadSettings;
use crate::contract::{
    CommandOutcome, CommandRunner, FailedDownload, ManualDownloadReport, SuccessfulDownload,
};

/// Output naming handed to the downloader, relative to the output directory.
pub const OUTPUT_TEMPLATE: &str = "%(uploader)s - %(title)s [%(id)s].%(ext)s";

/// Runs commands with tokio's process API, discarding stdout and capturing stderr.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutcome> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;
        Ok(CommandOutcome {
            success: output.status.success(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Arguments for one downloader invocation: info sidecar, thumbnail,
/// templated output name, no flat extraction.
pub fn downloader_args(output_dir: &Path, url: &str) -> Vec<String> {
    vec![
        "--no-flat-playlist".to_string(),
        "--write-info-json".to_string(),
        "--write-thumbnail".to_string(),
        "-o".to_string(),
        output_dir.join(OUTPUT_TEMPLATE).to_string_lossy().into_owned(),
        url.to_string(),
    ]
}

/// Fetch each URL with the external downloader, one after another, in input
/// order. A failing URL is recorded and the batch moves on.
pub async fn download_manual_urls<R>(
    runner: &R,
    settings: &DownloadSettings,
    urls: &[String],
) -> ManualDownloadReport
where
    R: CommandRunner + ?Sized,
{
    let span = tracing::info_span!("download_batch", batch_id = %Uuid::new_v4(), urls = urls.len());
    async move {
        let mut report = ManualDownloadReport::default();
        let out_dir = &settings.output_dir;

        if let Err(e) = std::fs::create_dir_all(out_dir) {
            tracing::error!(
                error = ?e,
                path = %out_dir.display(),
                "Failed to create output directory"
            );
            for url in urls.iter().filter(|u| !u.trim().is_empty()) {
                let error = format!("cannot create {}: {e}", out_dir.display());
                record_failure(&mut report, url, error);
            }
            return report;
        }

        for url in urls {
            let url = url.trim();
            if url.is_empty() {
                tracing::warn!("Skipping blank URL");
                continue;
            }

            let args = downloader_args(out_dir, url);
            tracing::debug!(program = %settings.downloader, ?args, "Invoking downloader");

            match runner.run(&settings.downloader, &args).await {
                Ok(outcome) if outcome.success => {
                    tracing::info!(
                        url = url,
                        path = %out_dir.display(),
                        "Downloaded"
                    );
                    report.successful_downloads.push(SuccessfulDownload {
                        url: url.to_string(),
                        output_dir: out_dir.clone(),
                    });
                }
                Ok(outcome) => {
                    tracing::error!(
                        url = url,
                        code = ?outcome.code,
                        stderr = %outcome.stderr,
                        "Downloader exited with non-zero code"
                    );
                    record_failure(&mut report, url, outcome.stderr);
                }
                Err(e) => {
                    tracing::error!(
                        error = ?e,
                        url = url,
                        program = %settings.downloader,
                        "Failed to launch downloader"
                    );
                    record_failure(
                        &mut report,
                        url,
                        format!("failed to launch {}: {e}", settings.downloader),
                    );
                }
            }
        }

        tracing::info!(
            succeeded = report.successful_downloads.len(),
            failed = report.failed_downloads.len(),
            "Batch download finished"
        );
        report
    }
    .instrument(span)
    .await
}

fn record_failure(report: &mut ManualDownloadReport, url: &str, error: String) {
    report.errors.push(format!("{url}: {error}"));
    report.failed_downloads.push(FailedDownload {
        url: url.to_string(),
        error,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn args_carry_fixed_flags_then_url_last() {
        let args = downloader_args(Path::new("/clips"), "https://youtu.be/x");
        assert_eq!(args[0], "--no-flat-playlist");
        assert!(args.contains(&"--write-info-json".to_string()));
        assert!(args.contains(&"--write-thumbnail".to_string()));
        let o = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(
            PathBuf::from(&args[o + 1]),
            PathBuf::from("/clips").join(OUTPUT_TEMPLATE)
        );
        assert_eq!(args.last().unwrap(), "https://youtu.be/x");
    }

    #[test]
    fn report_serializes_with_fixed_keys() {
        let mut report = ManualDownloadReport::default();
        record_failure(&mut report, "u", "boom".to_string());
        let json = serde_json::to_value(&report).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("successful_downloads"));
        assert!(obj.contains_key("failed_downloads"));
        assert_eq!(json["errors"][0], "u: boom");
    }
}
