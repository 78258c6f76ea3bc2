//! Static lookup tables for the normalization and validation passes.

use phf::phf_map;

/// Sectioning commands and the Markdown heading prefix they map to.
pub static SECTION_COMMANDS: phf::Map<&'static str, &'static str> = phf_map! {
    "section" => "##",
    "subsection" => "###",
    "subsubsection" => "####",
};

/// Text-style commands and their Markdown/HTML wrappers.
pub static TEXT_STYLE_COMMANDS: phf::Map<&'static str, (&'static str, &'static str)> = phf_map! {
    "textbf" => ("**", "**"),
    "textit" => ("*", "*"),
    "emph" => ("*", "*"),
    "underline" => ("<u>", "</u>"),
};

/// Unicode math symbols the typesetter chokes on, mapped to their LaTeX
/// commands. Applied by the sanitizer inside math spans and out.
pub static UNICODE_MATH_REPLACEMENTS: phf::Map<char, &'static str> = phf_map! {
    '\u{2192}' => "\\to",      // →
    '\u{2260}' => "\\neq",     // ≠
    '\u{27E8}' => "\\langle",  // ⟨
    '\u{27E9}' => "\\rangle",  // ⟩
    '\u{03F5}' => "\\epsilon", // ϵ
    '\u{03D5}' => "\\phi",     // ϕ
    '\u{2297}' => "\\otimes",  // ⊗
};

/// Zero-width characters that sneak into copied math identifiers.
pub const ZERO_WIDTH_CHARS: &[char] = &[
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}',
];

/// Stand-in phrases that signal the model returned no real content.
/// Matching is done on the lowercased text.
pub const PLACEHOLDER_MARKERS: &[&str] = &[
    "contenu à venir",
    "contenu a venir",
    "lorem ipsum",
    "[placeholder]",
    "à compléter",
    "a completer",
    "votre contenu ici",
];

/// Markers of injected directives that must never be persisted.
/// Matching is done on the lowercased text.
pub const INJECTION_MARKERS: &[&str] = &[
    "<script",
    "ignore previous instructions",
    "ignore les instructions précédentes",
    "javascript:",
];
