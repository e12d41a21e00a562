//! End-to-end runs over real xlsx containers written with umya.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tempfile::TempDir;

use traffic_counts_lib::commands;
use traffic_counts_lib::config::Profile;
use traffic_counts_lib::excel::{Cell, XlsxDocument};
use traffic_counts_lib::random::FixedRandom;
use traffic_counts_lib::scaler::{Operation, ScaleOptions};
use traffic_counts_lib::totals::DirectionTotals;

fn hourly_book() -> umya_spreadsheet::Spreadsheet {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();

    for name in ["7-8AM", "8-9AM"] {
        let sheet = book.new_sheet(name).unwrap();
        sheet.get_cell_mut((1, 1)).set_value("Direction");
        sheet.get_cell_mut((2, 1)).set_value("Cars");

        sheet.get_cell_mut((1, 2)).set_value("Northbound");
        sheet.get_cell_mut((2, 2)).set_value_number(100.0);
        sheet.get_cell_mut((3, 2)).set_value_number(200.0);
        sheet.get_cell_mut((14, 2)).set_formula("SUM(B2:M2)");

        sheet.get_cell_mut((1, 3)).set_value("Southbound");
        sheet.get_cell_mut((2, 3)).set_value_number(50.0);
    }

    let day = book.new_sheet("DAY").unwrap();
    day.get_cell_mut((1, 1)).set_value("Total");
    day.get_cell_mut((2, 1)).set_value_number(500.0);

    book
}

fn write_book(dir: &Path, name: &str, book: &umya_spreadsheet::Spreadsheet) -> PathBuf {
    let path = dir.join(name);
    umya_spreadsheet::writer::xlsx::write(book, &path).unwrap();
    path
}

#[test]
fn scale_file_preserves_formulas_and_other_sheets() {
    let dir = TempDir::new().unwrap();
    let input = write_book(dir.path(), "counts.xlsx", &hourly_book());
    let output = dir.path().join("counts_modified.xlsx");

    let options = ScaleOptions::new(10.0, Operation::Increase);
    let (report, saved) = commands::scale_file(
        input.to_str().unwrap(),
        output.to_str().unwrap(),
        &options,
        &mut FixedRandom::midpoint(),
    )
    .unwrap();

    assert_eq!(report.modified_in("7-8AM"), Some(3));
    assert_eq!(report.modified_in("8-9AM"), Some(3));
    assert_eq!(report.total_modified, 6);
    assert!(saved.backup.is_none());
    assert_eq!(saved.checksum.len(), 64);

    let document = XlsxDocument::open(output.to_str().unwrap()).unwrap();
    let sheet = document.workbook().sheet("7-8AM").unwrap();
    assert_eq!(sheet.cell(2, 2), &Cell::Number(110.0));
    assert_eq!(sheet.cell(2, 3), &Cell::Number(220.0));
    assert_eq!(sheet.cell(3, 2), &Cell::Number(55.0));
    assert!(sheet.cell(2, 14).is_formula());
    assert_eq!(sheet.cell(1, 2), &Cell::Text("Cars".to_string()));

    let day = document.workbook().sheet("DAY").unwrap();
    assert_eq!(day.cell(1, 2), &Cell::Number(500.0));

    let book = umya_spreadsheet::reader::xlsx::read(&output).unwrap();
    let cell = book.get_sheet_by_name("8-9AM").unwrap().get_cell((14, 2)).unwrap();
    assert_eq!(cell.get_formula(), "SUM(B2:M2)");
}

#[test]
fn scale_file_in_place_makes_a_backup() {
    let dir = TempDir::new().unwrap();
    let input = write_book(dir.path(), "counts.xlsx", &hourly_book());
    let path = input.to_str().unwrap();

    let options = ScaleOptions::new(50.0, Operation::Decrease);
    let (_, saved) = commands::scale_file(path, path, &options, &mut FixedRandom::midpoint()).unwrap();

    let backup = saved.backup.unwrap();
    let original = XlsxDocument::open(&backup).unwrap();
    assert_eq!(original.workbook().sheet("7-8AM").unwrap().cell(2, 2), &Cell::Number(100.0));

    let scaled = XlsxDocument::open(path).unwrap();
    assert_eq!(scaled.workbook().sheet("7-8AM").unwrap().cell(2, 2), &Cell::Number(50.0));
}

#[test]
fn scale_file_rejects_bad_percentage_before_reading() {
    let options = ScaleOptions::new(f64::NAN, Operation::Increase);
    let result = commands::scale_file(
        "/nonexistent/in.xlsx",
        "/nonexistent/out.xlsx",
        &options,
        &mut FixedRandom::midpoint(),
    );
    assert!(matches!(
        result,
        Err(traffic_counts_lib::ProcessError::InvalidPercentage(_))
    ));
}

fn two_direction_profile() -> Profile {
    Profile {
        rewrite_summary: true,
        directions: vec![
            DirectionTotals::new("Northbound", vec![40, 30, 20, 10, 0, 0, 0, 0, 0, 0, 0, 5]),
            DirectionTotals::new("Southbound", vec![7, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0]),
        ],
        ..Profile::sixteen_hour()
    }
}

#[test]
fn force_totals_file_matches_targets_after_reload() {
    let dir = TempDir::new().unwrap();
    let mut book = hourly_book();
    // A formula in a zero-target class cell must survive
    book.get_sheet_by_name_mut("8-9AM")
        .unwrap()
        .get_cell_mut((13, 3))
        .set_formula("B3*0");
    let input = write_book(dir.path(), "day.xlsx", &book);
    let output = dir.path().join("day_forced.xlsx");

    let profile = two_direction_profile();
    let (report, _) = commands::force_totals_file(
        input.to_str().unwrap(),
        output.to_str().unwrap(),
        &profile,
        &mut FixedRandom::midpoint(),
    )
    .unwrap();

    assert_eq!(report.hourly_sheets, vec!["7-8AM".to_string(), "8-9AM".to_string()]);
    assert_eq!(report.direction_rows.get("Northbound"), Some(&[2][..]));
    assert_eq!(report.direction_rows.get("Southbound"), Some(&[3][..]));
    assert_eq!(report.formula_cells_skipped, 1);
    assert!(report.verification.is_exact());

    let reloaded = commands::verify_file(output.to_str().unwrap(), &profile).unwrap();
    assert!(reloaded.is_exact());

    let document = XlsxDocument::open(output.to_str().unwrap()).unwrap();
    let workbook = document.workbook();
    assert!(workbook.sheet("8-9AM").unwrap().cell(3, 13).is_formula());
    assert!(workbook.sheet("7-8AM").unwrap().cell(2, 14).is_formula());

    let day = workbook.sheet("DAY").unwrap();
    assert_eq!(day.cell(50, 1), &Cell::Text("DAILY TOTALS SUMMARY".to_string()));
    assert_eq!(day.cell(52, 1), &Cell::Text("Northbound".to_string()));
    assert_eq!(day.cell(52, 14), &Cell::Number(105.0));
    assert_eq!(day.cell(53, 14), &Cell::Number(8.0));
    assert_eq!(day.cell(1, 2), &Cell::Number(500.0));
}

#[test]
fn verify_file_reports_untouched_workbook_as_different() {
    let dir = TempDir::new().unwrap();
    let input = write_book(dir.path(), "day.xlsx", &hourly_book());

    let report = commands::verify_file(input.to_str().unwrap(), &two_direction_profile()).unwrap();
    assert!(!report.is_exact());
}

#[test]
fn request_handler_round_trips_a_workbook() {
    let mut buffer = std::io::Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&hourly_book(), &mut buffer).unwrap();

    let payload = serde_json::json!({
        "file": STANDARD.encode(buffer.into_inner()),
        "percentage": 50,
        "operation": "decrease",
    });
    let response = commands::handle_scale_request(&payload.to_string(), &mut FixedRandom::midpoint());
    assert_eq!(response.status, 200);

    let log = response.body["log"].as_str().unwrap();
    assert!(log.contains("Modified 3 cells in 7-8AM"));
    assert!(log.ends_with("Total: 6 cells modified"));

    let bytes = STANDARD.decode(response.body["file"].as_str().unwrap()).unwrap();
    let document = XlsxDocument::from_bytes(bytes).unwrap();
    let sheet = document.workbook().sheet("8-9AM").unwrap();
    assert_eq!(sheet.cell(2, 3), &Cell::Number(100.0));
    assert_eq!(sheet.cell(3, 2), &Cell::Number(25.0));
}
