use crate::error::OcrError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Recognition languages offered in the form, each bound to a Tesseract tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    ChineseSimplified,
    Japanese,
    Korean,
    French,
    German,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::ChineseSimplified,
        Language::Japanese,
        Language::Korean,
        Language::French,
        Language::German,
    ];

    /// Tesseract language tag (traineddata file stem)
    pub fn tag(&self) -> &'static str {
        match self {
            Self::English => "eng",
            Self::ChineseSimplified => "chi_sim",
            Self::Japanese => "jpn",
            Self::Korean => "kor",
            Self::French => "fra",
            Self::German => "deu",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::ChineseSimplified => "Chinese (Simplified)",
            Self::Japanese => "Japanese",
            Self::Korean => "Korean",
            Self::French => "French",
            Self::German => "German",
        }
    }
}

impl FromStr for Language {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.tag() == tag)
            .ok_or_else(|| OcrError::UnsupportedLanguage(tag.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Serialized as its tag, e.g. `"chi_sim"`
impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}
