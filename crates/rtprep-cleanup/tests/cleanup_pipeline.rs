//! End-to-end cleanup over on-disk record fixtures.

use std::path::Path;

use pretty_assertions::assert_eq;
use rtprep_cleanup::CleanupPipeline;
use rtprep_core::CleanupManifest;
use rtprep_core::enums::UnitOutcome;
use rtprep_records::{
    Element, JsonRecordStore, Record, RecordPatterns, RecordStore, Tag, Vr, tags,
};

const STRUCTURE_SET_ROI_SEQUENCE: Tag = Tag::new(0x3006, 0x0020);
const BEAM_SEQUENCE: Tag = Tag::new(0x300A, 0x00B0);
const REFERENCED_RT_PLAN_SEQUENCE: Tag = Tag::new(0x300C, 0x0002);

fn patterns() -> RecordPatterns {
    RecordPatterns::new("*RP*.dcm", "*RD*.dcm", "*RS*.dcm", "*CT*.dcm")
        .expect("default patterns compile")
}

fn plan(label: &str, uid: &str, fractions: i64) -> Record {
    Record::new(vec![
        Element::text(tags::SOP_INSTANCE_UID, Vr::UI, uid),
        Element::text(tags::RT_PLAN_LABEL, Vr::SH, label),
        Element::int(tags::NUMBER_OF_FRACTIONS_PLANNED, fractions),
        Element::sequence(
            BEAM_SEQUENCE,
            vec![Record::new(vec![Element::text(
                tags::SETUP_TECHNIQUE_DESCRIPTION,
                Vr::ST,
                "tattoo left of sternum",
            )])],
        ),
    ])
}

fn dose(plan_uid: &str, scale: f64) -> Record {
    Record::new(vec![
        Element::decimal(tags::DOSE_GRID_SCALING, scale),
        Element::sequence(
            REFERENCED_RT_PLAN_SEQUENCE,
            vec![Record::new(vec![Element::text(
                tags::REFERENCED_SOP_INSTANCE_UID,
                Vr::UI,
                plan_uid,
            )])],
        ),
    ])
}

fn structure_set(names: &[&str]) -> Record {
    let items = names
        .iter()
        .map(|name| Record::new(vec![Element::text(tags::ROI_NAME, Vr::LO, *name)]))
        .collect();
    Record::new(vec![Element::sequence(STRUCTURE_SET_ROI_SEQUENCE, items)])
}

fn write(dir: &Path, name: &str, record: &Record) {
    std::fs::create_dir_all(dir).expect("create patient dir");
    JsonRecordStore
        .write(record, &dir.join(name))
        .expect("write fixture");
}

fn read(dir: &Path, name: &str) -> Record {
    JsonRecordStore.read(&dir.join(name)).expect("read back")
}

/// S1: two plans on distinct dates. S2: two plans sharing a date.
fn two_patients(root: &Path) {
    let s1 = root.join("S1");
    write(&s1, "RP.a.dcm", &plan("planB", "1.1.2", 30));
    write(&s1, "RP.b.dcm", &plan("planA", "1.1.1", 25));
    write(&s1, "RD.a.dcm", &dose("1.1.1", 2.0e-5));
    write(&s1, "RD.b.dcm", &dose("1.1.2", 4.0e-5));
    write(&s1, "RS.1.dcm", &structure_set(&["BODY", "hjarta", "Eosophagus"]));

    let s2 = root.join("S2");
    write(&s2, "RP.x.dcm", &plan("planX", "2.1", 10));
    write(&s2, "RP.y.dcm", &plan("planY", "2.2", 10));
    write(&s2, "RD.x.dcm", &dose("2.1", 1.0e-5));
    write(&s2, "RD.y.dcm", &dose("2.2", 1.0e-5));
}

const MANIFEST: &str = "S1\tC1\tplanA\t20\t2021-01-01\n\
                        S1\tC1\tplanB\t15\t2021-02-01\n\
                        S2\tC1\tplanX\t5\t2021-03-03\n\
                        S2\tC1\tplanY\t10\t2021-03-03\n";

#[test]
fn normalizes_every_entry_and_persists_the_result() {
    let temp = tempfile::tempdir().expect("tempdir should create");
    two_patients(temp.path());
    let manifest = CleanupManifest::parse(MANIFEST);
    let patterns = patterns();
    let pipeline = CleanupPipeline::new(&JsonRecordStore, &patterns, temp.path());

    let rows = pipeline.run(&manifest, |_| {});

    assert!(rows.iter().all(|row| row.outcome == UnitOutcome::Ok));
    let labels = rows
        .iter()
        .map(|row| (row.plan_key.as_str(), row.new_label.as_deref()))
        .collect::<Vec<_>>();
    assert_eq!(
        labels,
        vec![
            ("planA", Some("P1")),
            ("planB", Some("P2")),
            ("planX", Some("P1")),
            ("planY", Some("P2")),
        ]
    );

    let s1 = temp.path().join("S1");
    let plan_a = read(&s1, "RP.b.dcm");
    assert_eq!(plan_a.text(tags::RT_PLAN_LABEL).as_deref(), Some("P1"));
    assert_eq!(plan_a.text(tags::RT_PLAN_NAME).as_deref(), Some("planA"));
    assert_eq!(
        plan_a
            .find_first(tags::NUMBER_OF_FRACTIONS_PLANNED)
            .and_then(Element::as_i64),
        Some(20)
    );
    assert!(plan_a.find_first(tags::SETUP_TECHNIQUE_DESCRIPTION).is_none());

    let dose_a = read(&s1, "RD.a.dcm");
    let scale = dose_a
        .find_first(tags::DOSE_GRID_SCALING)
        .and_then(Element::as_f64)
        .expect("scale");
    assert!((scale / 2.0e-5 - 20.0 / 25.0).abs() < 1e-12);

    let plan_b = read(&s1, "RP.a.dcm");
    assert_eq!(plan_b.text(tags::RT_PLAN_LABEL).as_deref(), Some("P2"));
}

#[test]
fn anatomy_runs_once_per_patient_on_the_first_plan() {
    let temp = tempfile::tempdir().expect("tempdir should create");
    two_patients(temp.path());
    let manifest = CleanupManifest::parse(MANIFEST);
    let patterns = patterns();
    let pipeline = CleanupPipeline::new(&JsonRecordStore, &patterns, temp.path());

    let rows = pipeline.run(&manifest, |_| {});

    assert!(rows[0].anatomy_normalized);
    assert_eq!(
        rows[0].renamed_structures,
        vec!["hjarta -> Heart", "Eosophagus -> Esophagus"]
    );
    assert!(!rows[1].anatomy_normalized);
    assert!(rows[1].renamed_structures.is_empty());

    let names = read(&temp.path().join("S1"), "RS.1.dcm")
        .find_all(tags::ROI_NAME)
        .into_iter()
        .filter_map(|element| element.as_text().map(|name| name.into_owned()))
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["BODY", "Heart", "Esophagus"]);
}

#[test]
fn failing_entries_do_not_abort_the_batch() {
    let temp = tempfile::tempdir().expect("tempdir should create");
    two_patients(temp.path());
    write(&temp.path().join("S3"), "RP.z.dcm", &plan("planZ", "3.1", 0));
    write(&temp.path().join("S3"), "RD.z.dcm", &dose("3.1", 1.0e-5));

    let manifest = CleanupManifest::parse(
        "S1\tC1\tplanA\t20\t2021-01-01\n\
         S1\tC1\tplanQ\t20\t2021-01-05\n\
         S3\tC1\tplanZ\t4\t2021-01-01\n\
         S2\tC1\tplanX\tfive\t2021-03-03\n\
         S9\tC1\tplanA\t3\t2021-01-01\n\
         S2\tC1\tplanY\t10\t2021-03-03\n",
    );
    let patterns = patterns();
    let pipeline = CleanupPipeline::new(&JsonRecordStore, &patterns, temp.path());

    let mut seen = 0;
    let rows = pipeline.run(&manifest, |_| seen += 1);

    let outcomes = rows
        .iter()
        .map(|row| (row.line, row.outcome))
        .collect::<Vec<_>>();
    assert_eq!(seen, 6);
    assert_eq!(
        outcomes,
        vec![
            (1, UnitOutcome::Ok),
            (2, UnitOutcome::ResolutionFailure),
            (3, UnitOutcome::ParseFailure),
            (4, UnitOutcome::ParseFailure),
            (5, UnitOutcome::ExternalFailure),
            (6, UnitOutcome::Ok),
        ]
    );
    assert!(rows[1].message.as_deref().is_some_and(|m| m.contains("planQ")));

    // The zero-fraction plan is left exactly as exported.
    let untouched = read(&temp.path().join("S3"), "RP.z.dcm");
    assert_eq!(untouched, plan("planZ", "3.1", 0));

    // The rejected planX line keeps its report keys and its place in S2's numbering.
    assert_eq!(rows[3].study_id, "S2");
    assert_eq!(rows[3].plan_key, "planX");
    assert_eq!(rows[3].new_label, None);
    assert_eq!(rows[5].new_label.as_deref(), Some("P2"));
    assert!(!rows[5].anatomy_normalized);
}

#[test]
fn plan_without_dose_is_a_resolution_failure_and_nothing_is_written() {
    let temp = tempfile::tempdir().expect("tempdir should create");
    let dir = temp.path().join("S1");
    write(&dir, "RP.1.dcm", &plan("planA", "1.1", 30));
    write(&dir, "RD.1.dcm", &dose("9.9", 1.0e-5));

    let manifest = CleanupManifest::parse("S1\tplanA\t10\t2021-01-01\n");
    let patterns = patterns();
    let rows = CleanupPipeline::new(&JsonRecordStore, &patterns, temp.path())
        .run(&manifest, |_| {});

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].outcome, UnitOutcome::ResolutionFailure);
    assert_eq!(read(&dir, "RP.1.dcm"), plan("planA", "1.1", 30));
}
