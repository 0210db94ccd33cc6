//! Dose metric collection against JSON research snapshots.

use std::collections::BTreeMap;
use std::path::Path;

use rtprep_core::ExtractionManifest;
use rtprep_core::Point3;
use rtprep_validate::{
    Collector, Course, Dvh, DvhPoint, JsonResearchStore, Patient, PlanSetup, PlanSum,
    ResearchStore, Structure, StructureSet,
};

fn heart_dvh(mean_dose: f64) -> BTreeMap<String, Dvh> {
    let mut dvh = BTreeMap::new();
    dvh.insert(
        "Heart".to_string(),
        Dvh {
            mean_dose,
            curve: Vec::new(),
        },
    );
    dvh
}

fn plan(id: &str, structure_set: &str, dose_valid: bool, heart_mean: f64) -> PlanSetup {
    PlanSetup {
        id: id.into(),
        is_dose_valid: dose_valid,
        structure_set_id: Some(structure_set.into()),
        dvh: heart_dvh(heart_mean),
    }
}

fn structure_set(id: &str, image: &str, names: &[&str]) -> StructureSet {
    StructureSet {
        id: id.into(),
        image_id: image.into(),
        structures: names
            .iter()
            .map(|name| Structure {
                id: (*name).to_string(),
                center_point: Point3::default(),
            })
            .collect(),
    }
}

fn summed_curve() -> BTreeMap<String, Dvh> {
    let mut dvh = BTreeMap::new();
    dvh.insert(
        "Heart".to_string(),
        Dvh {
            mean_dose: 0.0,
            curve: vec![
                DvhPoint {
                    dose: 19.9,
                    volume: 31.0,
                },
                DvhPoint {
                    dose: 20.000_4,
                    volume: 30.5,
                },
                DvhPoint {
                    dose: 20.1,
                    volume: 29.0,
                },
            ],
        },
    );
    dvh
}

fn write_snapshot(dir: &Path, patient: &Patient) {
    let json = serde_json::to_vec(patient).expect("serialize snapshot");
    std::fs::write(dir.join(format!("{}.json", patient.id)), json).expect("write snapshot");
}

fn fixtures(dir: &Path) {
    // S1: two dosed plans on one image, a third plan without dose.
    write_snapshot(
        dir,
        &Patient {
            id: "S1".into(),
            courses: vec![Course {
                id: "C1".into(),
                plans: vec![
                    plan("P1", "SS1", true, 2.504),
                    plan("P2", "SS1", true, 1.0),
                    plan("P3", "SS1", false, 0.0),
                ],
            }],
            structure_sets: vec![structure_set("SS1", "CT1", &["Heart", "Lung_L"])],
            images: Vec::new(),
            plan_sums: vec![PlanSum {
                plan_ids: vec!["P1".into(), "P2".into()],
                image_id: "CT1".into(),
                dvh: summed_curve(),
            }],
        },
    );
    // S2: plans on two images; the second structure set has no heart.
    write_snapshot(
        dir,
        &Patient {
            id: "S2".into(),
            courses: vec![Course {
                id: "C1".into(),
                plans: vec![plan("P1", "SS1", true, 5.0), plan("P2", "SS2", true, 7.0)],
            }],
            structure_sets: vec![
                structure_set("SS1", "CT1", &["Heart"]),
                structure_set("SS2", "CT2", &["BODY"]),
            ],
            images: Vec::new(),
            plan_sums: Vec::new(),
        },
    );
}

#[test]
fn collects_mean_dose_and_volume_at_dose() {
    let temp = tempfile::tempdir().expect("tempdir should create");
    fixtures(temp.path());
    let manifest = ExtractionManifest::parse(
        "p1\tS1\tC1\tplanA\np1\tS1\tC1\tplanB\np2\tS2\tC1\tplanX\np9\tS9\tC1\tplanZ\n",
    );
    let mut store = JsonResearchStore::new(temp.path());

    let rows = Collector::new(&mut store, "Heart", 20.0).run(&manifest, |_| {});
    assert!(store.patient().is_none());
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].study_id, "S1");
    assert_eq!(rows[0].mean_dose, Some(3.5));
    assert_eq!(rows[0].volume_at_dose, Some(30.5));

    // Only the plan whose structure set holds the heart counts; two images give 0.
    assert_eq!(rows[1].mean_dose, Some(5.0));
    assert_eq!(rows[1].volume_at_dose, Some(0.0));

    assert_eq!(rows[2].study_id, "S9");
    assert_eq!(rows[2].mean_dose, None);
    assert_eq!(rows[2].volume_at_dose, None);
    assert_eq!(rows[2].structure, "Heart");
}

#[test]
fn missing_curve_point_gives_zero_volume() {
    let temp = tempfile::tempdir().expect("tempdir should create");
    fixtures(temp.path());
    let manifest = ExtractionManifest::parse("p1\tS1\tC1\tplanA\n");
    let mut store = JsonResearchStore::new(temp.path());

    let rows = Collector::new(&mut store, "Heart", 35.0).run(&manifest, |_| {});
    assert_eq!(rows[0].volume_at_dose, Some(0.0));

    let rows = Collector::new(&mut store, "Lung_L", 20.0).run(&manifest, |_| {});
    assert_eq!(rows[0].mean_dose, Some(0.0));
    assert_eq!(rows[0].volume_at_dose, Some(0.0));
}
