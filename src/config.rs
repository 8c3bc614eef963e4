use crate::error::OcrError;
use crate::language::Language;
use crate::Args;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub default_language: Language,
    pub max_file_size: usize,
    pub engine: String,
    pub tesseract_cmd: String,
    pub tessdata_path: Option<String>,
    pub max_concurrent_recognitions: usize,
}

impl TryFrom<Args> for Config {
    type Error = OcrError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.max_concurrent_recognitions == 0 {
            return Err(OcrError::InvalidRequest(
                "max-concurrent-recognitions must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            host: args.host,
            port: args.port,
            default_language: args.default_language.parse()?,
            max_file_size: args.max_file_size,
            engine: args.engine,
            tesseract_cmd: args.tesseract_cmd,
            tessdata_path: args.tessdata_path,
            max_concurrent_recognitions: args.max_concurrent_recognitions,
        })
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            default_language: Language::default(),
            max_file_size: 10 * 1024 * 1024,
            engine: "cli".to_string(),
            tesseract_cmd: "tesseract".to_string(),
            tessdata_path: None,
            max_concurrent_recognitions: 1,
        }
    }
}
