//! Persona store loading, saving and sampling.

use rand::rngs::StdRng;
use rand::SeedableRng;

use persona_sim::persona::{
    load_personas, sample_personas, save_personas, PersonaProfile, PersonaStoreError,
};

const DATASET: &str = r#"[
  {"uuid": "a", "age": 21, "sex": "女", "occupation": "学生", "prefecture": "京都府", "persona": "curious"},
  {"uuid": "b", "age": 55, "occupation": "farmer", "skills_and_expertise": "rice"},
  {"uuid": "c"},
  {"uuid": "d", "age": 38, "occupation": "nurse"}
]"#;

fn write_dataset(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("personas.json");
    std::fs::write(&path, DATASET).expect("write dataset");
    path
}

#[test]
fn load_reads_every_record() {
    let dir = tempfile::tempdir().expect("temp dir");
    let personas = load_personas(&write_dataset(&dir)).expect("should load");

    assert_eq!(personas.len(), 4);
    assert_eq!(personas[0].prefecture, "京都府");
    assert_eq!(personas[0].personality, "curious");
    assert_eq!(personas[2].age_text(), "");
}

#[test]
fn load_missing_file_is_not_found() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = load_personas(&dir.path().join("absent.json")).expect_err("should fail");
    assert!(matches!(err, PersonaStoreError::NotFound { .. }));
}

#[test]
fn load_rejects_non_array_json() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"uuid": "a"}"#).expect("write");
    let err = load_personas(&path).expect_err("should fail");
    assert!(matches!(err, PersonaStoreError::Parse { .. }));
}

#[test]
fn seeded_sample_is_reproducible_and_distinct() {
    let dir = tempfile::tempdir().expect("temp dir");
    let personas = load_personas(&write_dataset(&dir)).expect("should load");

    let first = sample_personas(&personas, 3, &mut StdRng::seed_from_u64(42)).expect("sample");
    let second = sample_personas(&personas, 3, &mut StdRng::seed_from_u64(42)).expect("sample");
    assert_eq!(first, second);

    let mut ids: Vec<&str> = first.iter().map(|p| p.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn oversized_sample_is_rejected() {
    let personas = vec![PersonaProfile::default(); 2];
    let err = sample_personas(&personas, 3, &mut StdRng::seed_from_u64(1)).expect_err("should fail");
    assert!(matches!(
        err,
        PersonaStoreError::SampleTooLarge {
            requested: 3,
            available: 2
        }
    ));
}

#[test]
fn saved_sample_keeps_untyped_fields() {
    let dir = tempfile::tempdir().expect("temp dir");
    let personas = load_personas(&write_dataset(&dir)).expect("should load");

    let out = dir.path().join("data/sample.json");
    save_personas(&out, &personas[1..2]).expect("should save");

    let reloaded = load_personas(&out).expect("should reload");
    assert_eq!(reloaded, &personas[1..2]);
    let raw = std::fs::read_to_string(&out).expect("read");
    assert!(raw.contains("skills_and_expertise"));
}

#[test]
fn null_fields_and_string_ages_load() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("messy.json");
    std::fs::write(
        &path,
        r#"[
  {"uuid": "e", "age": "30", "occupation": "clerk", "cultural_background": null},
  {"uuid": "f", "age": null, "sex": null, "hobbies_and_interests": ["hiking"]}
]"#,
    )
    .expect("write");

    let personas = load_personas(&path).expect("should load");
    assert_eq!(personas.len(), 2);
    assert_eq!(personas[0].age, Some(30));
    assert_eq!(personas[0].cultural_background, "");
    assert_eq!(personas[1].age_text(), "");
    assert_eq!(personas[1].sex, "");
    assert_eq!(personas[1].hobbies_and_interests, "");
}
