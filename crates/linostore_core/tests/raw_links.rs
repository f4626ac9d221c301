use linostore_core::{
    open_db_in_memory, ExportService, ImportService, Link, Links, RawLinksError, ServiceError,
    SqliteLinks, StorageMode,
};

fn fresh() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

#[test]
fn raw_dumps_round_trip_verbatim() {
    for notation in [
        "(1: 1 1)",
        "(1: 1 1)\n(2: 2 2)",
        "(1: 2 2)",
        "(1: 2 2)\n(2: 1 1)",
    ] {
        let conn = fresh();
        let links = SqliteLinks::try_new(&conn).unwrap();

        let report = ImportService::new(&links).import_text(notation, "").unwrap();
        assert_eq!(report.mode, StorageMode::Raw);
        assert_eq!(report.nodes, notation.lines().count());

        assert_eq!(ExportService::new(&links).export_text("").unwrap(), notation);
    }
}

#[test]
fn raw_import_stores_exact_indices_and_endpoints() {
    let conn = fresh();
    let links = SqliteLinks::try_new(&conn).unwrap();

    ImportService::new(&links)
        .import_text("(1: 2 2)\n(2: 1 1)", "")
        .unwrap();

    assert_eq!(links.count().unwrap(), 2);
    assert_eq!(links.get(1).unwrap(), Link::new(1, 2, 2));
    assert_eq!(links.get(2).unwrap(), Link::new(2, 1, 1));
}

#[test]
fn raw_and_document_storage_do_not_mix() {
    let conn = fresh();
    let links = SqliteLinks::try_new(&conn).unwrap();
    let import = ImportService::new(&links);
    import.import_text("(1: 1 1)", "").unwrap();

    assert!(matches!(
        import.import_text("(1: 1 1)", "d1"),
        Err(ServiceError::Documents(_))
    ));
    assert!(matches!(
        import.import_text("(2: 2 2)", ""),
        Err(ServiceError::Raw(RawLinksError::IncompatibleFormat { .. }))
    ));
    assert_eq!(
        ExportService::new(&links).export_text("").unwrap(),
        "(1: 1 1)"
    );
}

#[test]
fn non_numeric_raw_dump_is_rejected_before_writing() {
    let conn = fresh();
    let links = SqliteLinks::try_new(&conn).unwrap();

    let err = ImportService::new(&links)
        .import_text("(papa: mama son)", "")
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Raw(RawLinksError::InvalidLink { position: 1, .. })
    ));
    assert_eq!(links.count().unwrap(), 0);
    assert_eq!(links.format_tag().unwrap(), None);
}
