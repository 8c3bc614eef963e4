//! Recognition engine implementations
//!
//! Each backend provides an `EngineFactory`; the server holds one factory and
//! acquires a fresh engine instance per request. The statically linked
//! Tesseract backend is compiled only with the `engine-leptess` feature.

pub mod cli;

#[cfg(feature = "engine-leptess")]
pub mod leptess;

#[cfg(test)]
pub mod fake;

use crate::config::Config;
use crate::engine::EngineFactory;
use crate::error::OcrError;
use std::sync::Arc;

/// Engine names this build can serve
pub fn available() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut names = vec![cli::NAME];
    #[cfg(feature = "engine-leptess")]
    names.push(leptess::NAME);
    names
}

/// Build the factory selected by `config.engine`
pub fn build(config: &Config) -> Result<Arc<dyn EngineFactory>, OcrError> {
    match config.engine.as_str() {
        cli::NAME => {
            tracing::info!("Using tesseract executable '{}'", config.tesseract_cmd);
            Ok(Arc::new(cli::CliEngineFactory::new(config)))
        }
        #[cfg(feature = "engine-leptess")]
        leptess::NAME => {
            tracing::info!("Initializing leptess engine...");
            Ok(Arc::new(leptess::LeptessEngineFactory::new(config)?))
        }
        other => Err(OcrError::EngineUnavailable(format!(
            "Unknown engine '{}'. Available: {}",
            other,
            available().join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_cli_engine() {
        let factory = build(&Config::default()).unwrap();
        assert_eq!(factory.name(), "cli");
    }

    #[test]
    fn test_build_unknown_engine_fails() {
        let config = Config {
            engine: "ocrad".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            build(&config),
            Err(OcrError::EngineUnavailable(msg)) if msg.contains("ocrad")
        ));
    }
}
