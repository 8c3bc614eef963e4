use crate::error::OcrError;
use crate::language::Language;
use crate::preprocessing::ProcessedImage;

/// OCR processing result
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    /// Mean confidence in 0.0..=1.0, when the engine reports one
    pub confidence: Option<f32>,
}

/// One recognition engine instance, scoped to a single request
pub trait RecognitionEngine: Send {
    /// Recognize text in an already preprocessed image
    fn recognize(&mut self, image: &ProcessedImage) -> Result<OcrResult, OcrError>;

    /// Release everything the instance holds (processes, loaded models).
    /// Must be safe to call more than once.
    fn terminate(&mut self);
}

/// Creates engine instances on demand
pub trait EngineFactory: Send + Sync {
    /// Returns the engine identifier (e.g., "cli", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Acquire a fresh instance loaded for `language`
    fn acquire(&self, language: Language) -> Result<Box<dyn RecognitionEngine>, OcrError>;
}

/// Holds an acquired engine and terminates it when dropped, so release
/// happens on success, on error and on unwinding alike.
pub struct EngineLease {
    engine: Box<dyn RecognitionEngine>,
}

impl EngineLease {
    pub fn acquire(factory: &dyn EngineFactory, language: Language) -> Result<Self, OcrError> {
        let engine = factory.acquire(language)?;
        tracing::debug!("Acquired {} engine for '{}'", factory.name(), language);
        Ok(Self { engine })
    }

    pub fn recognize(&mut self, image: &ProcessedImage) -> Result<OcrResult, OcrError> {
        self.engine.recognize(image)
    }
}

impl Drop for EngineLease {
    fn drop(&mut self) {
        self.engine.terminate();
        tracing::debug!("Engine instance released");
    }
}
