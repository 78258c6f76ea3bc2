//! Integration tests for the texmark normalization pipeline

use pretty_assertions::assert_eq;
use texmark::{
    convert_commands, normalize_content, normalize_delimiters, process_content, sanitize_content,
    validate_content, ContentError, PipelineOptions,
};

// ============================================================================
// Delimiter Normalization
// ============================================================================

mod delimiters {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_paren_and_bracket_delimiters() {
        assert_eq!(
            normalize_delimiters(r"La somme \( a+b \) vaut \[ c \]"),
            "La somme $ a+b $ vaut $$ c $$"
        );
    }

    #[test]
    fn test_idempotence_over_corpus() {
        let corpus = [
            r"La somme \( a+b \) vaut \[ c \]",
            "Texte sans math.",
            "$x$ et $$y$$ déjà propres",
            r"\(\frac{a}{b}\) puis \[\sqrt{2}\]",
            "prix $5 $10 et $x_1$",
            "un $ orphelin\n\nparagraphe suivant",
            "```\ncode \\( brut \\)\n```\naprès \\(ok\\)",
            r"\(\text{avec } \{ \text{accolades} \}\)",
            "$$\n\\begin{pmatrix} 1 & 0 \\\\ 0 & 1 \\end{pmatrix}\n$$",
            r"mélange \(a\) et $b$ et \[c\] et $$d$$",
        ];
        for input in corpus {
            let once = normalize_delimiters(input);
            let twice = normalize_delimiters(&once);
            assert_eq!(once, twice, "normalization not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_full_normalization_idempotent() {
        let corpus = [
            r"\section{Limites} \(x \to 0\)",
            r"\begin{array}{cc} a & b \end{array} et \(y\)",
            r"\textbf{gras} \includegraphics[width=0.5\linewidth]{f.png}",
        ];
        for input in corpus {
            let once = normalize_content(input);
            let twice = normalize_content(&once);
            assert_eq!(once, twice, "pipeline not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_currency_heuristic() {
        assert_eq!(normalize_delimiters("$5 $10"), "$5 $10");
        assert_eq!(normalize_delimiters("coût: $20 $"), "coût: $20 $");
    }
}

// ============================================================================
// Document Command Conversion
// ============================================================================

mod commands {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_tabular_invariant() {
        let corpus = [
            r"\begin{tabular}{cc} a & b \end{tabular}",
            r"$$\begin{tabular}{c} x \end{tabular}$$",
            r"\begin{tabular}{c} ouvert",
            r"texte \begin{tabular}{ll} p & q \\ r & s \end{tabular} suite",
            r"\begin{array}{c} \begin{tabular}{c} interne \end{tabular} \end{array}",
            "pas de tableau du tout",
        ];
        for input in corpus {
            let output = convert_commands(input);
            assert!(
                !output.contains(r"\begin{tabular}"),
                "tabular survives for {:?}: {}",
                input,
                output
            );
        }
    }

    #[test]
    fn test_array_example_from_content() {
        let input = r"\begin{array}{|c|c|}\hline x & 1 \\ \hline y & 2 \\ \hline\end{array}";
        let html = convert_commands(input);
        assert_eq!(html.matches("<tr>").count(), 2);
        assert_eq!(html.matches("<td>").count(), 4);
        for cell in ["<td>$x$</td>", "<td>$1$</td>", "<td>$y$</td>", "<td>$2$</td>"] {
            assert!(html.contains(cell), "missing {} in {}", cell, html);
        }
    }

    #[test]
    fn test_image_width_proportions() {
        let half = convert_commands(r"\includegraphics[width=0.5\linewidth]{foo.png}");
        assert!(half.contains("width: 50%"));

        let full = convert_commands(r"\includegraphics{foo.png}");
        assert!(full.contains("width: 100%"));
    }

    #[test]
    fn test_double_wrapped_table_unwrapped() {
        let input = r"$$\begin{array}{cc} 1 & 2 \end{array}$$";
        let html = convert_commands(input);
        assert!(!html.contains("$$"));
        assert!(html.contains("<table>"));
        // Delimiter normalization afterwards leaves the table alone
        let normalized = normalize_delimiters(&html);
        assert!(normalized.contains("<table>"));
    }
}

// ============================================================================
// Validation and Sanitization
// ============================================================================

mod validation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_placeholder_rejected() {
        let report = validate_content("Contenu à venir...");
        assert!(report.should_reject);
        assert!(!report.is_valid);
    }

    #[test]
    fn test_fixable_defect_sanitized() {
        let input = "Première ligne.\\nSeconde ligne.";
        let report = validate_content(input);
        assert!(!report.is_valid);
        assert!(!report.should_reject);

        let sanitized = sanitize_content(input);
        assert!(sanitized.was_modified);
        assert_eq!(sanitized.content, "Première ligne.\nSeconde ligne.");
    }

    #[test]
    fn test_sanitize_idempotent_on_clean_content() {
        let clean = "## Exercice\n\nCalculer $\\frac{1}{2} + \\frac{1}{3}$.";
        let sanitized = sanitize_content(clean);
        assert!(!sanitized.was_modified);
        assert_eq!(sanitized.content, clean);
    }
}

// ============================================================================
// Full Pipeline
// ============================================================================

mod pipeline {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_authored_lesson_flow() {
        let raw = r"\section{Théorème} Soit \(f\) continue sur \([a,b]\).";
        let processed = process_content(raw, &PipelineOptions::default()).unwrap();
        assert!(processed.content.contains("## Théorème"));
        assert!(processed.content.contains("$f$"));
    }

    #[test]
    fn test_rejected_content_is_typed() {
        let err = process_content("   ", &PipelineOptions::default()).unwrap_err();
        match err {
            ContentError::Rejected { errors } => {
                assert!(errors.iter().any(|e| e.contains("empty")));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_document_normalizes_stably() {
        let raw = "\\section{Suites}\nLa suite \\(u_n\\) vérifie \\[ u_{n+1} = 2u_n \\]\n\
                   \\begin{array}{|c|c|}\\hline n & u_n \\\\ \\hline 0 & 1 \\\\ \\hline\\end{array}";
        let once = process_content(raw, &PipelineOptions::default()).unwrap();
        let twice = process_content(&once.content, &PipelineOptions::default()).unwrap();
        assert_eq!(once.content, twice.content);
        assert!(once.content.contains("$u_n$"));
        assert!(once.content.contains("$$ u_{n+1} = 2u_n $$"));
        assert!(once.content.contains("<table>"));
    }
}
