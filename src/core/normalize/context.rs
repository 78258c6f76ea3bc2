//! Core state and options for content normalization

use log::debug;

use super::commands::convert_commands_impl;
use super::delimiters::normalize_delimiters_impl;
use super::{NormalizeResult, NormalizeWarning};

// =============================================================================
// Normalization Options
// =============================================================================

/// Options for content normalization
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Convert legacy document commands (sections, environments, images)
    /// Default: true
    pub convert_commands: bool,

    /// Canonicalize math delimiters to `$...$` / `$$...$$`
    /// Default: true
    pub normalize_delimiters: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            convert_commands: true,
            normalize_delimiters: true,
        }
    }
}

impl NormalizeOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for content that is already Markdown apart from delimiters
    pub fn delimiters_only() -> Self {
        Self {
            convert_commands: false,
            normalize_delimiters: true,
        }
    }
}

// =============================================================================
// Normalizer
// =============================================================================

/// Stateful normalizer accumulating warnings across passes.
#[derive(Debug, Default)]
pub struct ContentNormalizer {
    options: NormalizeOptions,
    warnings: Vec<NormalizeWarning>,
}

impl ContentNormalizer {
    pub fn new() -> Self {
        Self {
            options: NormalizeOptions::default(),
            warnings: Vec::new(),
        }
    }

    pub fn with_options(options: NormalizeOptions) -> Self {
        Self {
            options,
            warnings: Vec::new(),
        }
    }

    /// Run the configured passes over `input`.
    pub fn normalize(&mut self, input: &str) -> String {
        let mut current = input.to_string();
        if self.options.convert_commands {
            debug!("normalize: command conversion pass");
            current = convert_commands_impl(&current, &mut self.warnings);
        }
        if self.options.normalize_delimiters {
            debug!("normalize: delimiter pass");
            current = normalize_delimiters_impl(&current, &mut self.warnings);
        }
        current
    }

    /// Run the configured passes, returning output plus warnings.
    pub fn normalize_with_diagnostics(&mut self, input: &str) -> NormalizeResult {
        let output = self.normalize(input);
        NormalizeResult::with_warnings(output, std::mem::take(&mut self.warnings))
    }

    /// Warnings accumulated so far.
    pub fn warnings(&self) -> &[NormalizeWarning] {
        &self.warnings
    }

    /// Take ownership of the accumulated warnings.
    pub fn take_warnings(&mut self) -> Vec<NormalizeWarning> {
        std::mem::take(&mut self.warnings)
    }
}
