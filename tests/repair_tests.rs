//! Tests for model payload repair and strategy-chained parsing

use pretty_assertions::assert_eq;
use serde_json::Value;
use texmark::{fix_latex_json_escapes, parse_model_payload, process_model_field, PipelineOptions};

/// Valid JSON must come through the repair untouched.
#[test]
fn test_repair_safety_on_valid_corpus() {
    let corpus = [
        r#"{}"#,
        r#"{"a": 1}"#,
        r#"{"nested": {"list": [1, 2, 3], "flag": false}}"#,
        r#"{"text": "avec \"guillemets\" et \\ backslash"}"#,
        r#"{"escapes": "tab\t retour\n slash\/ fin"}"#,
        r#"{"unicode": "école β"}"#,
        r#"["tableau", 1, null, {"x": 2.5}]"#,
        r#"{"vide": ""}"#,
    ];
    for fixture in corpus {
        let repaired = fix_latex_json_escapes(fixture);
        assert_eq!(repaired, fixture, "valid JSON was altered");
        let original: Value = serde_json::from_str(fixture).unwrap();
        let reparsed: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(original, reparsed);
    }
}

/// The documented failure mode: LaTeX commands colliding with JSON escapes.
#[test]
fn test_repair_effectiveness_on_latex_payload() {
    let raw = r#"{"proof": "Donc $\beta \vec{GM} = \vec{0}$ et \frac{a}{b}"}"#;
    assert!(serde_json::from_str::<Value>(raw).is_err());

    let repaired = fix_latex_json_escapes(raw);
    let value: Value = serde_json::from_str(&repaired).expect("repaired payload must parse");
    let proof = value["proof"].as_str().unwrap();
    assert!(proof.contains(r"\beta"));
    assert!(proof.contains(r"\vec{GM}"));
    assert!(proof.contains(r"\frac{a}{b}"));
    // Backslashes are single again after parsing
    assert!(!proof.contains(r"\\beta"));
}

#[test]
fn test_repair_handles_literal_newlines_in_strings() {
    let raw = "{\"enonce\": \"Premiere partie.\nSeconde partie avec $\\alpha$.\"}";
    let value: Value = serde_json::from_str(&fix_latex_json_escapes(raw)).unwrap();
    let enonce = value["enonce"].as_str().unwrap();
    assert!(enonce.contains("Premiere partie.\nSeconde partie"));
    assert!(enonce.contains(r"\alpha"));
}

#[test]
fn test_strategy_chain_code_fence() {
    let raw = "```json\n{\"titre\": \"Probabilit\u{e9}s\", \"corps\": \"Soit $\\\\Omega$ fini.\"}\n```";
    let value = parse_model_payload(raw).unwrap();
    assert_eq!(value["titre"].as_str().unwrap(), "Probabilités");
}

#[test]
fn test_strategy_chain_embedded_object() {
    let raw = "Bien sûr ! Voici l'exercice :\n\n{\"corps\": \"Montrer que $\\sqrt{2}$ est irrationnel.\"}\n\nBon courage !";
    let value = parse_model_payload(raw).unwrap();
    assert!(value["corps"].as_str().unwrap().contains("irrationnel"));
}

#[test]
fn test_all_strategies_fail_returns_typed_error() {
    let err = parse_model_payload("rien d'exploitable ici").unwrap_err();
    assert_eq!(err.attempts.len(), 3);
    assert!(err.to_string().contains("3 strategies"));
}

#[test]
fn test_model_field_through_pipeline() {
    let raw = r#"{"corps": "\section{Limites} On note \(\ell\) la limite."}"#;
    let processed = process_model_field(raw, "corps", &PipelineOptions::default()).unwrap();
    assert!(processed.content.contains("## Limites"));
    assert!(processed.content.contains("$\\ell$"));
}
