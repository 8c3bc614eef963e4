//! In-memory engine for tests: records every acquire, recognize and release

use crate::engine::{EngineFactory, OcrResult, RecognitionEngine};
use crate::error::OcrError;
use crate::language::Language;
use crate::preprocessing::ProcessedImage;
use image::RgbaImage;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct Calls {
    pub acquired: Vec<Language>,
    pub recognized: Vec<RgbaImage>,
    pub released: usize,
    /// Recognitions currently inside `recognize`
    pub active: usize,
    /// Highest value `active` ever reached
    pub peak: usize,
}

#[derive(Clone)]
pub enum Behavior {
    Succeed(String),
    /// Succeed with empty text after sleeping for the given time
    Slow(Duration),
    FailRecognize,
    FailAcquire,
    Panic,
}

pub struct FakeEngineFactory {
    behavior: Behavior,
    calls: Arc<Mutex<Calls>>,
}

impl FakeEngineFactory {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Calls>> {
        self.calls.clone()
    }
}

impl EngineFactory for FakeEngineFactory {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn description(&self) -> &'static str {
        "Test double"
    }

    fn acquire(&self, language: Language) -> Result<Box<dyn RecognitionEngine>, OcrError> {
        self.calls.lock().unwrap().acquired.push(language);
        if let Behavior::FailAcquire = self.behavior {
            return Err(OcrError::EngineUnavailable("no language pack".to_string()));
        }
        Ok(Box::new(FakeEngine {
            behavior: self.behavior.clone(),
            calls: self.calls.clone(),
        }))
    }
}

struct FakeEngine {
    behavior: Behavior,
    calls: Arc<Mutex<Calls>>,
}

impl RecognitionEngine for FakeEngine {
    fn recognize(&mut self, image: &ProcessedImage) -> Result<OcrResult, OcrError> {
        {
            let mut calls = self.calls.lock().unwrap();
            calls.recognized.push(image.pixels().clone());
            calls.active += 1;
            calls.peak = calls.peak.max(calls.active);
        }
        if let Behavior::Slow(delay) = self.behavior {
            std::thread::sleep(delay);
        }
        self.calls.lock().unwrap().active -= 1;

        match &self.behavior {
            Behavior::Succeed(text) => Ok(OcrResult {
                text: text.clone(),
                confidence: Some(0.9),
            }),
            Behavior::Slow(_) => Ok(OcrResult {
                text: String::new(),
                confidence: None,
            }),
            Behavior::FailRecognize => Err(OcrError::Recognition(
                "model failed to load: eng.traineddata".to_string(),
            )),
            Behavior::Panic => panic!("engine crashed"),
            Behavior::FailAcquire => unreachable!(),
        }
    }

    fn terminate(&mut self) {
        // Recover from poisoning so a panicking recognize still counts the release
        let mut calls = match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        calls.released += 1;
    }
}
