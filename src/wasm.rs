//! WASM bindings for texmark
//!
//! This module provides JavaScript-accessible functions so the web platform
//! can run the normalization pipeline in the browser.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use serde::{Deserialize, Serialize};

/// Pipeline result with additional metadata
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize)]
pub struct PipelineResult {
    /// The processed output
    pub output: String,
    /// Whether the processing was successful
    pub success: bool,
    /// Error message if processing failed
    pub error: Option<String>,
    /// Warnings generated along the way
    pub warnings: Vec<String>,
}

/// Safely serialize a value to JsValue, returning an error object on failure.
///
/// This prevents panics from `unwrap()` when serialization fails.
#[cfg(feature = "wasm")]
fn to_js_value<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or_else(|e| {
        let error_obj = PipelineResult {
            output: String::new(),
            success: false,
            error: Some(format!("Serialization error: {}", e)),
            warnings: vec![],
        };
        // This inner serialization should always succeed for simple structs
        serde_wasm_bindgen::to_value(&error_obj).unwrap_or(JsValue::NULL)
    })
}

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Normalize mixed LaTeX/Markdown content to the canonical Markdown form.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "normalizeContent")]
pub fn normalize_content_wasm(input: &str) -> JsValue {
    let result = crate::normalize_content_with_diagnostics(input);
    to_js_value(&PipelineResult {
        output: result.output.clone(),
        success: true,
        error: None,
        warnings: result.format_warnings(),
    })
}

/// Repair a model-generated JSON payload so it parses.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "repairModelJson")]
pub fn repair_model_json_wasm(input: &str) -> String {
    crate::fix_latex_json_escapes(input)
}

/// Validate content, returning the structured report.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "validateContent")]
pub fn validate_content_wasm(input: &str) -> JsValue {
    to_js_value(&crate::validate_content(input))
}

/// Run the full persistence pipeline: normalize, validate, sanitize.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "processContent")]
pub fn process_content_wasm(input: &str) -> JsValue {
    match crate::process_content(input, &crate::PipelineOptions::default()) {
        Ok(processed) => to_js_value(&PipelineResult {
            output: processed.content.clone(),
            success: true,
            error: None,
            warnings: processed
                .warnings
                .iter()
                .map(|w| w.to_string())
                .collect(),
        }),
        Err(err) => to_js_value(&PipelineResult {
            output: String::new(),
            success: false,
            error: Some(err.to_string()),
            warnings: vec![],
        }),
    }
}

/// Render normalized content as sectioned HTML.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "renderHtml")]
pub fn render_html_wasm(input: &str) -> String {
    crate::render_pipeline::render_html_default(input)
}
