use std::path::Path;

use pavemap_core::properties::{find_property_set, get_property};
use pavemap_core::{
    run_mapping, CancelToken, EntityId, IfcModel, ModelAccess, PropertyValue, RunRequest, RunState,
    TARGET_PSET,
};
use pavemap_step::StepFile;

/// Road → baseline → two zones. Z1 holds two courses below a pavement, Z2 one
/// contained course whose key collides with a Z1 course.
const ROAD: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [ReferenceView]'),'2;1');
FILE_NAME('road.ifc','2025-03-01T10:00:00',(''),(''),'corridor export','civil','');
FILE_SCHEMA(('IFC4X3_ADD2'));
ENDSEC;
DATA;
#1=IFCOWNERHISTORY($,$,$,.NOCHANGE.,$,$,$,0);
#10=IFCROAD('1hqIFTRjfV6AWq_bMtnZwI',#1,'Road',$,$,$,$,$,.ELEMENT.,.NOTDEFINED.);
#11=IFCROADPART('2Lq1zSxr50ZOpGfBQ4vUvd',#1,'Baseline - Axis 1',$,'Baseline',$,$,$,.ELEMENT.,.LONGITUDINAL.,.NOTDEFINED.);
#12=IFCROADPART('3vB2YO$MX4xv5uCqZZG05x',#1,'Z1',$,'BaselineRegion',$,$,$,.ELEMENT.,.LONGITUDINAL.,.ROADSEGMENT.);
#13=IFCROADPART('0DWgwt6o1FOx7466fPk$jl',#1,'Z2',$,'BaselineRegion',$,$,$,.ELEMENT.,.LONGITUDINAL.,.ROADSEGMENT.);
#20=IFCPAVEMENT('1kTvXnbbzCWw8lcMd1dR4o',#1,'Pavement',$,$,$,$,$,.NOTDEFINED.);
#21=IFCCOURSE('2t0ohfQPj7lOaxoQwbhvq0',#1,'Wearing',$,$,$,$,$,.PAVEMENT.);
#22=IFCCOURSE('0M2UtiAmf2rhSpvNDqbiCg',#1,'Base',$,$,$,$,$,.PAVEMENT.);
#23=IFCCOURSE('3Ax9aQnB5CxgJR0QZ8pIzK',#1,'Other wearing',$,$,$,$,$,.PAVEMENT.);
#30=IFCRELAGGREGATES('0aVvd2Ihz7cPhH5wgxUqXl',#1,$,$,#10,(#11));
#31=IFCRELAGGREGATES('1f8Y3ckmf8RQ7wjdzG8fG2',#1,$,$,#11,(#12,#13));
#32=IFCRELAGGREGATES('2jQ8y0Z7H0FOhhvzP9s0Zz',#1,$,$,#12,(#20));
#33=IFCRELAGGREGATES('3qqHvFdrr1wQ2DY9m4M7Vd',#1,$,$,#20,(#21,#22));
#34=IFCRELCONTAINEDINSPATIALSTRUCTURE('1cX6p1tJz9pf3Pl$1W7tbq',#1,$,$,(#23),#13);
#40=IFCPROPERTYSINGLEVALUE('CodeName',$,IFCLABEL('Enrob\X2\00E9\X0\ - 10'),$);
#41=IFCPROPERTYSET('0sK5UE8_X6RRtvE0dJFBZJ',#1,'Corridor Shape Information',$,(#40));
#42=IFCRELDEFINESBYPROPERTIES('2vTLb8QB98ewy$gHQ1rF0f',#1,$,$,(#21),#41);
#43=IFCPROPERTYSINGLEVALUE('CodeName',$,IFCLABEL('Grave - 0/20'),$);
#44=IFCPROPERTYSET('1Xhbn5wYj3Y8$Ys3IQ2_kH',#1,'Corridor Shape Information',$,(#43));
#45=IFCRELDEFINESBYPROPERTIES('3c2TP9ocr3aRv9vWGr1xw1',#1,$,$,(#22),#44);
#46=IFCPROPERTYSINGLEVALUE('CodeName',$,IFCLABEL('Enrob\X2\00E9\X0\ - 10'),$);
#47=IFCPROPERTYSET('3wDSZtkRz9HO3aKR_9a0$o',#1,'Corridor Shape Information',$,(#46));
#48=IFCRELDEFINESBYPROPERTIES('0Pl1E9lBjESuVIxmB5LPNg',#1,$,$,(#23),#47);
ENDSEC;
END-ISO-10303-21;
"#;

const WEARING: EntityId = EntityId(21);
const BASE: EntityId = EntityId(22);
const OTHER_WEARING: EntityId = EntityId(23);

fn write_model(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("road.ifc");
    std::fs::write(&path, ROAD).unwrap();
    path
}

fn write_sheet(dir: &Path, csv: &str) -> std::path::PathBuf {
    let path = dir.join("layers.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

fn property_names(model: &IfcModel, course: EntityId) -> Vec<(String, String)> {
    let Some(pset) = find_property_set(model, course, TARGET_PSET) else {
        return Vec::new();
    };
    model
        .properties(pset)
        .into_iter()
        .map(|p| {
            (
                model.property_name(p).unwrap_or_default().to_string(),
                model.property_value(p).unwrap_or_default(),
            )
        })
        .collect()
}

#[test]
fn rows_match_their_own_courses_only() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = write_model(dir.path());
    let sheet = write_sheet(
        dir.path(),
        "ZONE,TECHNIQUE_,SURFACE,PR_1,PR_2,CHANTIER,N°_ORDRE\n\
         Z1,ENROBÉ,10.0,a,,Site 4,12/b\n\
         Z1,grave,0 / 20,b,x,,\n",
    );
    let output = dir.path().join("road_mapped.ifc");

    let summary = run_mapping(
        &RunRequest::new(&model_path, &sheet, &output),
        &pavemap_core::events::NullSink,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(summary.state, RunState::Completed);
    assert_eq!(summary.updated_courses, 2);
    assert_eq!(summary.zones.len(), 1);
    assert!(summary.zones[0].verification().is_complete());

    let model = IfcModel::open(&output).unwrap();
    assert_eq!(
        property_names(&model, WEARING),
        vec![
            ("PR_1".to_string(), "a".to_string()),
            ("SURFACE".to_string(), "10.0".to_string()),
            ("CHANTIER".to_string(), "Site 4".to_string()),
            ("N°_ORDRE".to_string(), "12/b".to_string()),
        ]
    );
    assert_eq!(
        property_names(&model, BASE),
        vec![
            ("PR_1".to_string(), "b".to_string()),
            ("PR_2".to_string(), "x".to_string()),
            ("SURFACE".to_string(), "0 / 20".to_string()),
        ]
    );
    // Same key, different zone: untouched.
    assert!(property_names(&model, OTHER_WEARING).is_empty());
}

#[test]
fn unmatched_row_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = write_model(dir.path());
    let sheet = write_sheet(dir.path(), "ZONE,TECHNIQUE_,SURFACE,PR_1\nZ2,Grave,0/20,nope\n");
    let output = dir.path().join("out.ifc");

    let summary = run_mapping(
        &RunRequest::new(&model_path, &sheet, &output),
        &pavemap_core::events::NullSink,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(summary.updated_courses, 0);
    assert_eq!(summary.zones[0].valid_courses, 1);

    let model = IfcModel::open(&output).unwrap();
    for course in [WEARING, BASE, OTHER_WEARING] {
        assert!(property_names(&model, course).is_empty());
    }
    let original: StepFile = ROAD.parse().unwrap();
    assert_eq!(model.step().len(), original.len());
}

#[test]
fn code_name_survives_save_with_escapes() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = write_model(dir.path());
    let model = IfcModel::open(&model_path).unwrap();
    let out = dir.path().join("copy.ifc");
    model.save(&out).unwrap();

    let copy = IfcModel::open(&out).unwrap();
    assert_eq!(
        get_property(&copy, WEARING, "Corridor Shape Information", "CodeName"),
        Some(PropertyValue::Scalar("Enrobé - 10".to_string()))
    );
    assert!(std::fs::read_to_string(&out).unwrap().contains(r"Enrob\X2\00E9\X0\ - 10"));
}
