//! Tesseract executable engine
//!
//! Spawns one `tesseract` process per recognition and pipes the PNG through
//! stdin. Requires Tesseract and the language packs to be installed.

use crate::config::Config;
use crate::engine::{EngineFactory, OcrResult, RecognitionEngine};
use crate::error::OcrError;
use crate::language::Language;
use crate::preprocessing::ProcessedImage;
use std::io::Write;
use std::process::{Child, Command, Stdio};

pub const NAME: &str = "cli";

pub struct CliEngineFactory {
    command: String,
    tessdata_path: Option<String>,
}

impl CliEngineFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            tessdata_path: config.tessdata_path.clone(),
        }
    }
}

impl EngineFactory for CliEngineFactory {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "System tesseract executable, one process per recognition"
    }

    fn acquire(&self, language: Language) -> Result<Box<dyn RecognitionEngine>, OcrError> {
        Ok(Box::new(CliEngine {
            command: self.command.clone(),
            tessdata_path: self.tessdata_path.clone(),
            language,
            child: None,
        }))
    }
}

pub struct CliEngine {
    command: String,
    tessdata_path: Option<String>,
    language: Language,
    /// Running process, present only while a recognition is in flight
    child: Option<Child>,
}

impl CliEngine {
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.arg("stdin").arg("stdout").arg("-l").arg(self.language.tag());
        if let Some(dir) = &self.tessdata_path {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl RecognitionEngine for CliEngine {
    fn recognize(&mut self, image: &ProcessedImage) -> Result<OcrResult, OcrError> {
        tracing::debug!(
            "Running {} on {}x{} image ({} bytes PNG)",
            self.command,
            image.width(),
            image.height(),
            image.png().len()
        );

        let mut child = self.build_command().spawn().map_err(|e| {
            OcrError::Recognition(format!("Failed to start '{}': {}", self.command, e))
        })?;
        let stdin = child.stdin.take();
        self.child = Some(child);

        if let Some(mut stdin) = stdin {
            // stdin is closed on drop, which lets tesseract start reading
            stdin.write_all(image.png()).map_err(|e| {
                OcrError::Recognition(format!("Failed to pipe image to tesseract: {}", e))
            })?;
        }

        let child = self
            .child
            .take()
            .ok_or_else(|| OcrError::Internal("tesseract process went missing".to_string()))?;
        let output = child
            .wait_with_output()
            .map_err(|e| OcrError::Recognition(format!("Failed to wait for tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|e| OcrError::Recognition(format!("Invalid UTF-8 output: {}", e)))?;

        Ok(OcrResult {
            text: text.trim().to_string(),
            confidence: None,
        })
    }

    fn terminate(&mut self) {
        if let Some(mut child) = self.child.take() {
            tracing::warn!("Killing unfinished tesseract process {}", child.id());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader;
    use crate::preprocessing::{Filter, Pipeline};
    use image::{Rgba, RgbaImage};

    fn processed() -> ProcessedImage {
        let img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let source = image_loader::load(image_loader::encode_png(&img)).unwrap();
        Pipeline::new(Filter::Binarize).process(&source).unwrap()
    }

    fn factory(command: &str) -> CliEngineFactory {
        CliEngineFactory {
            command: command.to_string(),
            tessdata_path: None,
        }
    }

    #[test]
    fn test_command_arguments() {
        let engine = CliEngine {
            command: "tesseract".to_string(),
            tessdata_path: Some("/opt/tessdata".to_string()),
            language: Language::Japanese,
            child: None,
        };
        let cmd = engine.build_command();
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(
            args,
            ["stdin", "stdout", "-l", "jpn", "--tessdata-dir", "/opt/tessdata"]
        );
    }

    #[test]
    fn test_missing_executable_is_recognition_error() {
        let mut engine = factory("/nonexistent/tesseract-binary")
            .acquire(Language::English)
            .unwrap();

        let result = engine.recognize(&processed());
        engine.terminate();

        assert!(matches!(result, Err(OcrError::Recognition(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_process_reports_status() {
        // `false` ignores its arguments and exits 1; depending on timing the
        // pipe write or the exit status reports the failure
        let mut engine = factory("false").acquire(Language::English).unwrap();
        let result = engine.recognize(&processed());
        engine.terminate();

        assert!(matches!(result, Err(OcrError::Recognition(_))));
    }

    #[test]
    fn test_terminate_without_process_is_noop() {
        let mut engine = factory("tesseract").acquire(Language::German).unwrap();
        engine.terminate();
        engine.terminate();
    }
}
