//! Audio conversion through an external process.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::TranscodeError;
use crate::models::TranscoderConfig;

/// Converts a staged download into the normalized container.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;
}

/// Runs `ffmpeg -i <input> -c:a <codec> -b:a <bitrate> -y <output>`.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
    audio_codec: String,
    bitrate: String,
}

impl FfmpegTranscoder {
    pub fn new(config: &TranscoderConfig) -> Self {
        Self {
            program: config.program.clone(),
            audio_codec: config.audio_codec.clone(),
            bitrate: config.bitrate.clone(),
        }
    }

    /// Check that the program can be started at all.
    pub async fn check_available(&self) -> Result<(), TranscodeError> {
        let status = Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| self.spawn_error(source))?;

        if status.success() {
            Ok(())
        } else {
            Err(TranscodeError::Failed {
                program: self.program.clone(),
                status: status.to_string(),
                stderr: String::new(),
            })
        }
    }

    fn spawn_error(&self, source: std::io::Error) -> TranscodeError {
        TranscodeError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        let result = Command::new(&self.program)
            .arg("-i")
            .arg(input)
            .args(["-c:a", self.audio_codec.as_str(), "-b:a", self.bitrate.as_str(), "-y"])
            .arg(output)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| self.spawn_error(source))?;

        if !result.status.success() {
            return Err(TranscodeError::Failed {
                program: self.program.clone(),
                status: result.status.to_string(),
                stderr: last_lines(&String::from_utf8_lossy(&result.stderr), 5),
            });
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(TranscodeError::MissingOutput(output.display().to_string()));
        }
        Ok(())
    }
}

/// ffmpeg prints its banner first; the cause is at the end.
fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    lines[lines.len().saturating_sub(count)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn transcoder(program: &str) -> FfmpegTranscoder {
        FfmpegTranscoder::new(&TranscoderConfig {
            program: program.to_string(),
            ..TranscoderConfig::default()
        })
    }

    #[test]
    fn test_last_lines() {
        assert_eq!(last_lines("a\nb\nc\n", 2), "b\nc");
        assert_eq!(last_lines("only", 5), "only");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let tmp = TempDir::new().unwrap();
        let err = transcoder("definitely-not-a-transcoder")
            .transcode(&tmp.path().join("in.wav"), &tmp.path().join("out.m4a"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancelled_transcode_kills_the_process() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        // Sleeps, then creates the output file (its last argument).
        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("slow-transcoder");
        std::fs::write(
            &script,
            "#!/bin/sh\nsleep 1\nfor last; do :; done\ntouch \"$last\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let output = tmp.path().join("out.m4a");
        let transcoder = transcoder(script.to_str().unwrap());
        let cancelled = tokio::time::timeout(
            Duration::from_millis(200),
            transcoder.transcode(&tmp.path().join("in.wav"), &output),
        )
        .await;
        assert!(cancelled.is_err());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_failure() {
        let tmp = TempDir::new().unwrap();
        let err = transcoder("false")
            .transcode(&tmp.path().join("in.wav"), &tmp.path().join("out.m4a"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Failed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_without_output_is_failure() {
        let tmp = TempDir::new().unwrap();
        let err = transcoder("true")
            .transcode(&tmp.path().join("in.wav"), &tmp.path().join("out.m4a"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::MissingOutput(_)));
    }
}
