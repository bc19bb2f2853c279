// Integration tests for ShapefileImporter and ModelImporter:
//   ring splitting, header extraction, zone round-trip through the store,
//   all-or-nothing import and pack persistence.

use std::fs;
use std::path::Path;

use muland::*;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, PolygonRing};

fn ring(points: &[(f64, f64)]) -> Vec<Point> {
    points.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

fn square(x0: f64, y0: f64, size: f64) -> Vec<Point> {
    ring(&[(x0, y0), (x0, y0 + size), (x0 + size, y0 + size), (x0 + size, y0), (x0, y0)])
}

fn id_record(id: f64) -> Record {
    let mut record = Record::default();
    record.insert("ID".to_string(), FieldValue::Numeric(Some(id)));
    record
}

fn id_table() -> TableWriterBuilder {
    TableWriterBuilder::new().add_numeric_field(FieldName::try_from("ID").unwrap(), 10, 0)
}

/// Zone 1 is a 10x10 square with a 2x2 hole, zone 2 a plain square next to it.
fn write_shapefile(path: &Path) {
    let mut writer = shapefile::Writer::from_path(path, id_table()).unwrap();
    let holed = shapefile::Polygon::with_rings(vec![
        PolygonRing::Outer(square(0.0, 0.0, 10.0)),
        PolygonRing::Inner(ring(&[(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0), (4.0, 4.0)])),
    ]);
    writer.write_shape_and_record(&holed, &id_record(1.0)).unwrap();
    let plain = shapefile::Polygon::new(PolygonRing::Outer(square(10.0, 0.0, 10.0)));
    writer.write_shape_and_record(&plain, &id_record(2.0)).unwrap();
    drop(writer);
}

fn write_model(dir: &Path, name: &str, zones: &str) {
    fs::write(dir.join("zones.csv"), zones).unwrap();
    fs::write(dir.join("agents.csv"),
        "\"IDAGENT\";\"IDMARKET\";\"IDAGGRA\";\"UPPERBB\";\"HHINC\"\n1.00;1.00;1.00;50000.00;674.8841398\n").unwrap();
    fs::write(dir.join("agents_zones.csv"),
        "\"H_IDX\";\"I_IDX\";\"ACC\";\"P_LN_ATT\";\"DIST\"\n1.00;1.00;0.7308194;0.0000000;3.5\n1.00;2.00;0.5;0.1;1.5\n").unwrap();
    fs::write(dir.join("real_estates_zones.csv"),
        "\"V_IDX\";\"I_IDX\";\"M_IDX\";\"LOTSIZE\";\"BUILT\"\n1.00;2.00;1.00;3.4800000;0.027670\n").unwrap();
    fs::write(dir.join("rent_adjustments.csv"),
        "\"V_IDX\";\"I_IDX\";\"RENTADJ\"\n1.00;1.00;0.00\n1.00;2.00;0.25\n").unwrap();
    fs::write(dir.join("demand.csv"), "\"H_IDX\";\"DEMAND\"\n1.00;10562.7974402\n").unwrap();
    fs::write(dir.join("rent_functions.csv"),
        "\"IDMARKET\";\"IDATTRIB\";\"SCALEPAR\";\"LINEAPAR\";\"CREST_X\";\"CZONES_X\";\"EXPPAR_X\";\"CREST_Y\";\"CZONES_Y\";\"EXPPAR_Y\"\n\
         1.00;1.00;0.4000000000;0.323614000;5.00;0.00;1.00;0.00;0.00;0.00\n").unwrap();
    write_shapefile(&dir.join(format!("{name}.shp")));
}

const ZONES: &str = "\"I_IDX\";\"INDAREA\";\"COMAREA\"\n1.00;2.7441056;0.4679935\n2.00;1.5;0\n";

#[test]
fn shapefile_rings_are_split_into_exterior_and_holes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zones.shp");
    write_shapefile(&path);

    let shapes = ShapefileImporter::new(&path).zone_shapes().unwrap();
    assert_eq!(shapes.keys().copied().collect::<Vec<_>>(), vec![ZoneId(1), ZoneId(2)]);
    assert_eq!(shapes[&ZoneId(1)].interiors().len(), 1);
    assert_eq!(shapes[&ZoneId(1)].exterior().0.len(), 5);
    assert!(shapes[&ZoneId(2)].interiors().is_empty());

    let wkt = ShapefileImporter::new(&path).zone_wkt().unwrap();
    assert!(wkt[&ZoneId(1)].starts_with("POLYGON (("));
    assert_eq!(wkt[&ZoneId(1)].matches('(').count(), 3);
}

#[test]
fn non_polygon_shapefile_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.shp");
    let mut writer = shapefile::Writer::from_path(&path, id_table()).unwrap();
    writer.write_shape_and_record(&Point::new(1.0, 2.0), &id_record(1.0)).unwrap();
    drop(writer);

    let err = ShapefileImporter::new(&path).zone_shapes().unwrap_err();
    assert!(matches!(err, Error::UnsupportedShape { record: 0, .. }));
}

#[test]
fn imported_zones_resolve_back_to_their_ids() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "m1", ZONES);

    let db = Database::new();
    let id = ModelImporter::new(dir.path(), "m1").import(&db).unwrap();
    assert_eq!(id, ModelId(1));

    let conn = db.connect().unwrap();
    let model = conn.model("m1").unwrap();
    assert_eq!(model.headers.zones, vec!["INDAREA", "COMAREA"]);
    assert_eq!(model.headers.agents, vec!["HHINC"]);
    assert_eq!(model.headers.agents_zones, vec!["DIST"]);
    assert_eq!(model.headers.real_estates_zones, vec!["LOTSIZE", "BUILT"]);

    let resolver = ZoneResolver::new(conn.geometry()).unwrap();
    let positions = [
        Position::new(2.0, 2.0),
        Position::new(15.0, 5.0),
        Position::new(5.0, 5.0),
        Position::new(25.0, 5.0),
    ];
    assert_eq!(resolver.resolve(id, &positions), vec![(0, ZoneId(1)), (1, ZoneId(2))]);
    assert_eq!(conn.facts().rent_adjustments.model(id).count(), 2);
    assert_eq!(conn.facts().rent_functions.model(id).count(), 1);
    assert!(conn.facts().supply.is_empty());
}

#[test]
fn imported_model_assembles() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "m1", ZONES);
    let db = Database::new();
    ModelImporter::new(dir.path(), "m1").import(&db).unwrap();

    let dataset = AssemblyEngine::new(&db)
        .get("m1", &[Location::new(15.0, 5.0, [RealEstateTypeId(1)])])
        .unwrap();
    assert_eq!(
        dataset[&Category::Zones].records(),
        [vec![Value::Int(1), Value::Float(1.5), Value::Float(0.0)]]
    );
    assert_eq!(
        dataset[&Category::RentAdjustments].records(),
        [vec![Value::Int(1), Value::Int(1), Value::Float(0.25)]]
    );
    assert_eq!(dataset[&Category::AgentsZones].records()[0][..2], [Value::Int(1), Value::Int(1)]);
    assert_eq!(dataset[&Category::Demand].len(), 1);
}

#[test]
fn zone_without_geometry_aborts_whole_import() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "m1", "\"I_IDX\";\"INDAREA\";\"COMAREA\"\n1.00;2.0;0.5\n3.00;1.0;0\n");

    let db = Database::new();
    let err = ModelImporter::new(dir.path(), "m1").import(&db).unwrap_err();
    assert!(matches!(err, Error::MissingZoneGeometry { zone: ZoneId(3), .. }));

    let conn = db.connect().unwrap();
    assert_eq!(conn.catalog().models().count(), 0);
    assert!(conn.facts().rent_adjustments.is_empty());
}

#[test]
fn fact_row_for_unknown_zone_aborts_whole_import() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "m1", ZONES);
    fs::write(dir.path().join("supply.csv"), "\"V_IDX\";\"I_IDX\";\"NREST\"\n1.00;9.00;4.0\n").unwrap();

    let db = Database::new();
    let err = ModelImporter::new(dir.path(), "m1").import(&db).unwrap_err();
    assert!(matches!(err, Error::Integrity { table: "supply", .. }));
    assert_eq!(db.connect().unwrap().catalog().models().count(), 0);
}

#[test]
fn importing_twice_under_one_name_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "m1", ZONES);

    let db = Database::new();
    let importer = ModelImporter::new(dir.path(), "m1");
    importer.import(&db).unwrap();
    assert!(matches!(importer.import(&db), Err(Error::ModelExists(_))));
}

#[test]
fn saved_store_reopens_with_same_answers() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "m1", ZONES);
    let store = tempfile::tempdir().unwrap();

    let db = Database::new();
    ModelImporter::new(dir.path(), "m1").import(&db).unwrap();
    db.save(store.path()).unwrap();

    let reopened = Database::open(store.path()).unwrap();
    let locations = [Location::new(2.0, 2.0, [RealEstateTypeId(1)]), Location::new(15.0, 5.0, [RealEstateTypeId(1)])];
    assert_eq!(
        AssemblyEngine::new(&db).get("m1", &locations).unwrap(),
        AssemblyEngine::new(&reopened).get("m1", &locations).unwrap()
    );
}
