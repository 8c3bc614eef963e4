//! Server-rendered upload page
//!
//! All page state lives in one [`ViewState`] so a result and an error can
//! never be shown together, and a stale result never survives a new request.

use crate::language::Language;
use crate::recognition::RecognitionOptions;
use std::fmt::Write;

/// Shown for every preprocessing or recognition failure; details go to the log
pub const GENERIC_ERROR: &str = "An error occurred during text recognition.";
pub const UNREADABLE_FILE: &str = "The selected file could not be read as an image.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Success { text: String },
    Failed { message: String },
}

impl ViewState {
    /// Loading -> Success/Failed. Outside Loading there is nothing to
    /// complete and the state is returned unchanged.
    pub fn finish(self, outcome: Result<String, String>) -> Self {
        match self {
            ViewState::Loading => match outcome {
                Ok(text) => ViewState::Success { text },
                Err(message) => ViewState::Failed { message },
            },
            other => other,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ViewState::Success { text } => Some(text),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Everything the page needs to render
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub state: ViewState,
    /// `data:` URI of the submitted image
    pub preview: Option<String>,
    pub options: RecognitionOptions,
}

impl Page {
    pub fn idle(language: Language) -> Self {
        Self {
            options: RecognitionOptions {
                language,
                binarize: false,
            },
            ..Self::default()
        }
    }

    pub fn render(&self) -> String {
        let mut html = String::with_capacity(4096);
        html.push_str(HEAD);

        html.push_str(r#"<main><h1>AI-Powered OCR</h1><p class="tagline">Instantly extract text from your images</p>"#);
        html.push_str(r#"<form id="ocr-form" method="post" action="/" enctype="multipart/form-data"><div class="row">"#);

        html.push_str(r#"<label class="drop" for="file">"#);
        match &self.preview {
            Some(uri) => {
                let _ = write!(
                    html,
                    r#"<img id="preview" src="{}" alt="Preview">"#,
                    escape(uri)
                );
            }
            None => {
                html.push_str(r#"<img id="preview" alt="Preview" hidden>"#);
                html.push_str(r#"<span id="placeholder"><span>Click to upload a file</span><small>PNG, JPG, GIF up to 10MB</small></span>"#);
            }
        }
        html.push_str(r#"<input type="file" id="file" name="file" accept="image/*" hidden></label>"#);
        // Resubmitting with other options reuses the image already shown
        if let Some(uri) = &self.preview {
            let _ = write!(
                html,
                r#"<input type="hidden" id="image_data" name="image_data" value="{}">"#,
                escape(uri)
            );
        }

        html.push_str(r#"<div class="options"><label for="language">Select Language</label><select id="language" name="language">"#);
        for lang in Language::ALL {
            let selected = if lang == self.options.language {
                " selected"
            } else {
                ""
            };
            let _ = write!(
                html,
                r#"<option value="{}"{}>{}</option>"#,
                lang.tag(),
                selected,
                escape(lang.label())
            );
        }
        html.push_str("</select>");

        let checked = if self.options.binarize { " checked" } else { "" };
        let _ = write!(
            html,
            r#"<span class="label">Advanced Options</span><div class="check"><input type="checkbox" id="binarize" name="binarize" value="on"{}><label for="binarize">Binarization</label></div>"#,
            checked
        );

        let (label, disabled) = if self.state.is_loading() {
            ("Analyzing...", " disabled")
        } else if self.preview.is_none() {
            ("Extract Text", " disabled")
        } else {
            ("Extract Text", "")
        };
        let _ = write!(
            html,
            r#"<button id="submit" type="submit"{}>{}</button></div></div></form>"#,
            disabled, label
        );

        if let Some(message) = self.state.error() {
            let _ = write!(html, r#"<div class="error"><p>{}</p></div>"#, escape(message));
        }

        if let Some(text) = self.state.text() {
            let _ = write!(
                html,
                r#"<section class="result"><h2>Extracted Text:</h2><p>{}</p></section>"#,
                escape(text)
            );
        }

        html.push_str("</main>");
        html.push_str(SCRIPT);
        html.push_str("</body></html>");
        html
    }
}

/// Minimal HTML escaping for text and attribute values
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const HEAD: &str = r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>AI-Powered OCR</title><style>
body{margin:0;min-height:100vh;display:flex;align-items:center;justify-content:center;background:linear-gradient(135deg,#111827,#1f2937);color:#fff;font-family:system-ui,sans-serif}
main{width:100%;max-width:56rem;padding:2rem;background:rgba(255,255,255,.1);border-radius:1rem}
h1{text-align:center;font-size:2.5rem;color:#c084fc}.tagline{text-align:center;color:#d1d5db}
.row{display:flex;flex-wrap:wrap;gap:1rem}.drop,.options{flex:1 1 20rem}
.drop{display:flex;align-items:center;justify-content:center;height:18rem;border:2px dashed rgba(156,163,175,.5);border-radius:.75rem;cursor:pointer}
.drop img{max-height:100%;max-width:100%;object-fit:contain}#placeholder{display:flex;flex-direction:column;text-align:center;color:#9ca3af}
.options{display:flex;flex-direction:column;gap:.75rem}select{padding:.6rem;background:#374151;color:#fff;border-radius:.5rem}
button{padding:.75rem;font-size:1.1rem;font-weight:600;color:#fff;background:#9333ea;border:0;border-radius:.5rem;cursor:pointer}button:disabled{background:rgba(192,132,252,.5);cursor:default}
.error{margin-top:1rem;padding:1rem;background:rgba(239,68,68,.2);border-radius:.5rem;color:#f87171}
.result{margin-top:1.5rem;padding:1.5rem;background:rgba(255,255,255,.05);border-radius:.75rem}.result p{white-space:pre-wrap;color:#d1d5db}
</style></head><body>"#;

const SCRIPT: &str = r#"<script>
const form=document.getElementById('ocr-form'),file=document.getElementById('file'),btn=document.getElementById('submit'),img=document.getElementById('preview');
file.addEventListener('change',()=>{const f=file.files[0];if(!f)return;img.src=URL.createObjectURL(f);img.hidden=false;for(const id of['placeholder','image_data']){const n=document.getElementById(id);if(n)n.remove();}btn.disabled=false;});
form.addEventListener('submit',e=>{if(btn.disabled||!(file.files.length||document.getElementById('image_data'))){e.preventDefault();return;}btn.disabled=true;btn.textContent='Analyzing...';});
</script>"#;
