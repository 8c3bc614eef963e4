//! Per-request orchestration: preprocess, acquire an engine, recognize, release

use crate::engine::{EngineFactory, EngineLease};
use crate::error::OcrError;
use crate::image_loader::SourceImage;
use crate::language::Language;
use crate::preprocessing::{Filter, Pipeline, StepTiming};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Options captured when recognition starts; never changed mid-request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecognitionOptions {
    pub language: Language,
    pub binarize: bool,
}

/// Successful outcome of one recognition attempt
#[derive(Debug, Clone)]
pub struct Recognition {
    pub text: String,
    pub confidence: Option<f32>,
    pub language: Language,
    pub filter: Filter,
    pub width: u32,
    pub height: u32,
    pub preprocessing_time_ms: u64,
    pub preprocessing_steps: Vec<StepTiming>,
    pub processing_time_ms: u64,
}

pub struct Recognizer {
    factory: Arc<dyn EngineFactory>,
    permits: Arc<Semaphore>,
}

impl Recognizer {
    pub fn new(factory: Arc<dyn EngineFactory>, max_concurrent: usize) -> Self {
        Self {
            factory,
            permits: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.factory.name()
    }

    pub fn engine_description(&self) -> &'static str {
        self.factory.description()
    }

    /// Run the full pipeline for one upload.
    ///
    /// Waits for a free recognition slot, then preprocesses and recognizes on
    /// the blocking pool. Exactly one engine instance is acquired and it is
    /// released before this returns, whatever the outcome. Dropping the
    /// returned future does not free the slot until the engine is done.
    pub async fn recognize(
        &self,
        source: Arc<SourceImage>,
        options: RecognitionOptions,
    ) -> Result<Recognition, OcrError> {
        let start = Instant::now();

        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| OcrError::Internal(format!("Recognition queue closed: {}", e)))?;

        // The blocking task owns the slot: it outlives this future if the
        // client goes away, and the slot must stay taken until it finishes.
        let factory = self.factory.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            run(factory.as_ref(), &source, options)
        })
        .await
            .map_err(|e| OcrError::Internal(format!("Recognition task failed: {}", e)))?;

        let processing_time_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(mut recognition) => {
                recognition.processing_time_ms = processing_time_ms;
                tracing::info!(
                    "OCR completed in {}ms (language: {}, filter: {}), text length: {}",
                    processing_time_ms,
                    recognition.language,
                    recognition.filter.as_str(),
                    recognition.text.len()
                );
                Ok(recognition)
            }
            Err(e) => {
                tracing::error!(
                    "OCR failed after {}ms (language: {}): {}",
                    processing_time_ms,
                    options.language,
                    e
                );
                Err(e)
            }
        }
    }
}

fn run(
    factory: &dyn EngineFactory,
    source: &SourceImage,
    options: RecognitionOptions,
) -> Result<Recognition, OcrError> {
    let processed = Pipeline::new(Filter::from_binarize(options.binarize)).process(source)?;

    let mut engine = EngineLease::acquire(factory, options.language)?;
    let result = engine.recognize(&processed);
    drop(engine);
    let result = result?;

    Ok(Recognition {
        text: result.text,
        confidence: result.confidence,
        language: options.language,
        filter: processed.filter(),
        width: processed.width(),
        height: processed.height(),
        preprocessing_time_ms: processed.total_time_ms(),
        preprocessing_steps: processed.steps().to_vec(),
        processing_time_ms: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::fake::{Behavior, Calls, FakeEngineFactory};
    use crate::image_loader;
    use crate::preprocessing::steps;
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;
    use std::time::Duration;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(24, 12, |x, y| {
            Rgba([(x * 10) as u8, (y * 20) as u8, 90, 255])
        })
    }

    fn source() -> Arc<SourceImage> {
        Arc::new(image_loader::load(image_loader::encode_png(&sample())).unwrap())
    }

    fn recognizer(behavior: Behavior) -> (Recognizer, Arc<Mutex<Calls>>) {
        let factory = FakeEngineFactory::new(behavior);
        let calls = factory.calls();
        (Recognizer::new(Arc::new(factory), 1), calls)
    }

    #[tokio::test]
    async fn test_contrast_path_uses_one_engine_instance() {
        let (recognizer, handle) = recognizer(Behavior::Succeed("Hello World".to_string()));
        let options = RecognitionOptions {
            language: Language::French,
            binarize: false,
        };

        let recognition = recognizer.recognize(source(), options).await.unwrap();

        assert_eq!(recognition.text, "Hello World");
        assert_eq!(recognition.filter, Filter::Contrast);
        assert_eq!((recognition.width, recognition.height), (24, 12));

        let calls = handle.lock().unwrap();
        assert_eq!(calls.acquired, vec![Language::French]);
        assert_eq!(calls.recognized.len(), 1);
        assert_eq!(calls.released, 1);

        // The engine saw the contrast-stretched image, never the source
        let expected = steps::contrast::apply(sample()).unwrap();
        assert_eq!(calls.recognized[0], expected);
    }

    #[tokio::test]
    async fn test_binarize_path_sends_binary_image() {
        let (recognizer, handle) = recognizer(Behavior::Succeed(String::new()));
        let options = RecognitionOptions {
            language: Language::English,
            binarize: true,
        };

        recognizer.recognize(source(), options).await.unwrap();

        let calls = handle.lock().unwrap();
        for pixel in calls.recognized[0].pixels() {
            assert!(pixel.0[0] == 0 || pixel.0[0] == 255);
        }
    }

    #[tokio::test]
    async fn test_engine_failure_still_releases() {
        let (recognizer, handle) = recognizer(Behavior::FailRecognize);

        let result = recognizer
            .recognize(source(), RecognitionOptions::default())
            .await;

        assert!(matches!(result, Err(OcrError::Recognition(_))));
        let calls = handle.lock().unwrap();
        assert_eq!(calls.acquired.len(), 1);
        assert_eq!(calls.recognized.len(), 1);
        assert_eq!(calls.released, 1);
    }

    #[tokio::test]
    async fn test_engine_panic_still_releases() {
        let (recognizer, handle) = recognizer(Behavior::Panic);

        let result = recognizer
            .recognize(source(), RecognitionOptions::default())
            .await;

        assert!(matches!(result, Err(OcrError::Internal(_))));
        assert_eq!(handle.lock().unwrap_or_else(|e| e.into_inner()).released, 1);
    }

    #[tokio::test]
    async fn test_acquire_failure_skips_recognize() {
        let (recognizer, handle) = recognizer(Behavior::FailAcquire);

        let result = recognizer
            .recognize(source(), RecognitionOptions::default())
            .await;

        assert!(matches!(result, Err(OcrError::EngineUnavailable(_))));
        let calls = handle.lock().unwrap();
        assert!(calls.recognized.is_empty());
        assert_eq!(calls.released, 0);
    }

    #[tokio::test]
    async fn test_slot_is_returned_after_each_request() {
        let (recognizer, _) = recognizer(Behavior::FailRecognize);

        for _ in 0..3 {
            let _ = recognizer
                .recognize(source(), RecognitionOptions::default())
                .await;
        }

        assert_eq!(recognizer.permits.available_permits(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_abandoned_request_keeps_slot_until_engine_finishes() {
        let factory = FakeEngineFactory::new(Behavior::Slow(Duration::from_millis(500)));
        let handle = factory.calls();
        let recognizer = Arc::new(Recognizer::new(Arc::new(factory), 1));

        let first = {
            let recognizer = recognizer.clone();
            tokio::spawn(async move {
                recognizer
                    .recognize(source(), RecognitionOptions::default())
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        first.abort();
        let _ = first.await;

        // Client gone, engine still busy: the slot stays taken
        assert_eq!(handle.lock().unwrap().active, 1);
        assert_eq!(recognizer.permits.available_permits(), 0);

        recognizer
            .recognize(source(), RecognitionOptions::default())
            .await
            .unwrap();

        let calls = handle.lock().unwrap();
        assert_eq!(calls.peak, 1);
        assert_eq!(calls.recognized.len(), 2);
        assert_eq!(calls.released, 2);
        drop(calls);
        assert_eq!(recognizer.permits.available_permits(), 1);
    }
}
