use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};

use crate::config::Profile;
use crate::error::ProcessError;
use crate::excel::{self, ExcelErrorType, XlsxDocument};
use crate::random::RandomSource;
use crate::scaler::{self, LabelRule, ScaleOptions, ScaleReport};
use crate::totals::{self, ForceReport, VerificationReport};

// ==================== Request Interface ====================

const DEFAULT_PERCENTAGE: f64 = 13.0;
const DEFAULT_OPERATION: &str = "increase";

/// Percentages arrive either as JSON numbers or as form strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Percentage {
    Number(f64),
    Text(String),
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::Number(DEFAULT_PERCENTAGE)
    }
}

impl Percentage {
    fn value(&self) -> Result<f64, CommandError> {
        match self {
            Percentage::Number(n) => Ok(*n),
            Percentage::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| CommandError::bad_request(format!("Invalid percentage: {}", s))),
        }
    }
}

/// Scale request: a base64 workbook plus the adjustment to apply
#[derive(Debug, Clone, Deserialize)]
pub struct ScaleRequest {
    pub file: String,
    #[serde(default)]
    pub percentage: Percentage,
    #[serde(default = "default_operation")]
    pub operation: String,
}

fn default_operation() -> String {
    DEFAULT_OPERATION.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleResponse {
    pub file: String,
    pub log: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandError {
    #[serde(skip)]
    pub status: u16,
    pub error: String,
}

impl CommandError {
    fn bad_request(message: impl Into<String>) -> Self {
        CommandError {
            status: 400,
            error: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        CommandError {
            status: 500,
            error: message.into(),
        }
    }
}

impl From<ProcessError> for CommandError {
    fn from(e: ProcessError) -> Self {
        match e {
            ProcessError::InvalidOperation(_) | ProcessError::InvalidPercentage(_) => {
                CommandError::bad_request(e.to_string())
            }
            ProcessError::Excel(ref excel) if excel.error_type == ExcelErrorType::InvalidFormat => {
                CommandError::bad_request(e.to_string())
            }
            _ => CommandError::internal(e.to_string()),
        }
    }
}

impl From<excel::ExcelError> for CommandError {
    fn from(e: excel::ExcelError) -> Self {
        CommandError::from(ProcessError::from(e))
    }
}

/// Status code plus JSON body, ready for any transport
#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl CommandResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Handle a JSON scale request. Never fails: errors become `{ "error": ... }`
/// with a non-200 status.
pub fn handle_scale_request(payload: &str, rng: &mut dyn RandomSource) -> CommandResponse {
    match process_scale_request(payload, rng) {
        Ok(response) => CommandResponse {
            status: 200,
            body: serde_json::json!(response),
        },
        Err(e) => {
            error!(status = e.status, "scale request failed: {}", e.error);
            CommandResponse {
                status: e.status,
                body: serde_json::json!(e),
            }
        }
    }
}

fn process_scale_request(payload: &str, rng: &mut dyn RandomSource) -> Result<ScaleResponse, CommandError> {
    let request: ScaleRequest = serde_json::from_str(payload)
        .map_err(|e| CommandError::bad_request(format!("Invalid request: {}", e)))?;

    // Validate everything before touching the workbook
    let options = ScaleOptions::parse(request.percentage.value()?, &request.operation)?
        .with_label_rule(LabelRule::Strict);

    let bytes = STANDARD
        .decode(request.file.trim())
        .map_err(|e| CommandError::bad_request(format!("Invalid base64 file: {}", e)))?;

    let mut document = XlsxDocument::from_bytes(bytes)?;
    let report = scaler::scale(document.workbook_mut(), &options, rng)?;
    let modified = document.to_bytes()?;

    Ok(ScaleResponse {
        file: STANDARD.encode(modified),
        log: report.log_lines().join("\n"),
    })
}

// ==================== Batch Interface ====================

/// What a batch run wrote
#[derive(Debug, Clone)]
pub struct SavedOutput {
    pub path: String,
    pub edits_applied: u32,
    pub checksum: String,
    pub backup: Option<String>,
}

fn save_document(document: &XlsxDocument, input: &str, output: &str) -> Result<SavedOutput, ProcessError> {
    let backup = if same_file(input, output) {
        let backup = excel::create_backup(input)?;
        info!("Backed up {} to {}", input, backup);
        Some(backup)
    } else {
        None
    };

    let edits_applied = document.save(output)?;
    let checksum = excel::compute_checksum(output)?;
    info!("Saved to: {} ({} edits, sha256 {})", output, edits_applied, checksum);

    Ok(SavedOutput {
        path: output.to_string(),
        edits_applied,
        checksum,
        backup,
    })
}

fn same_file(a: &str, b: &str) -> bool {
    match (Path::new(a).canonicalize(), Path::new(b).canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Scale `input` and write the result to `output`
pub fn scale_file(
    input: &str,
    output: &str,
    options: &ScaleOptions,
    rng: &mut dyn RandomSource,
) -> Result<(ScaleReport, SavedOutput), ProcessError> {
    options.validate()?;

    let mut document = XlsxDocument::open(input)?;
    let report = scaler::scale(document.workbook_mut(), options, rng)?;
    let saved = save_document(&document, input, output)?;

    Ok((report, saved))
}

/// Force the profile's totals onto `input` and write the result to `output`
pub fn force_totals_file(
    input: &str,
    output: &str,
    profile: &Profile,
    rng: &mut dyn RandomSource,
) -> Result<(ForceReport, SavedOutput), ProcessError> {
    profile.validate()?;

    let mut document = XlsxDocument::open(input)?;
    let report = totals::force_exact_totals(document.workbook_mut(), profile, rng)?;
    let saved = save_document(&document, input, output)?;

    Ok((report, saved))
}

/// Check `input` against the profile's totals without modifying it
pub fn verify_file(input: &str, profile: &Profile) -> Result<VerificationReport, ProcessError> {
    let document = XlsxDocument::open(input)?;
    let workbook = document.workbook();

    let reference = workbook
        .sheet(&profile.reference_sheet)
        .ok_or_else(|| excel::ExcelError::sheet_not_found(&profile.reference_sheet))?;
    let names: Vec<String> = profile.directions.iter().map(|d| d.name.clone()).collect();
    let rows = totals::locate_direction_rows(reference, &names, profile.direction_scan_limit);

    let hourly: Vec<String> = workbook
        .sheet_names()
        .into_iter()
        .filter(|name| *name != profile.summary_sheet)
        .collect();

    Ok(totals::verify_totals(workbook, &profile.directions, &hourly, &rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FixedRandom;

    #[test]
    fn test_malformed_json_is_bad_request() {
        let response = handle_scale_request("{not json", &mut FixedRandom::midpoint());
        assert_eq!(response.status, 400);
        assert!(response.body["error"].as_str().unwrap().starts_with("Invalid request"));
    }

    #[test]
    fn test_invalid_operation_is_bad_request() {
        let payload = serde_json::json!({
            "file": STANDARD.encode(b"irrelevant"),
            "percentage": 10,
            "operation": "triple",
        });
        let response = handle_scale_request(&payload.to_string(), &mut FixedRandom::midpoint());
        assert_eq!(response.status, 400);
        assert!(response.body["error"].as_str().unwrap().contains("triple"));
    }

    #[test]
    fn test_decrease_over_one_hundred_is_bad_request() {
        let payload = serde_json::json!({ "file": "@@@", "percentage": 150, "operation": "decrease" });
        let response = handle_scale_request(&payload.to_string(), &mut FixedRandom::midpoint());
        assert_eq!(response.status, 400);
        assert!(response.body["error"].as_str().unwrap().contains("150"));
    }

    #[test]
    fn test_bad_base64_is_bad_request() {
        let payload = serde_json::json!({ "file": "@@@", "percentage": "13", "operation": "decrease" });
        let response = handle_scale_request(&payload.to_string(), &mut FixedRandom::midpoint());
        assert_eq!(response.status, 400);
        assert!(!response.is_success());
        assert!(response.body["error"].as_str().unwrap().contains("base64"));
    }

    #[test]
    fn test_non_workbook_payload_reports_error() {
        let payload = serde_json::json!({ "file": STANDARD.encode(b"plain text"), "percentage": 13 });
        let response = handle_scale_request(&payload.to_string(), &mut FixedRandom::midpoint());
        assert!(!response.is_success());
        assert!(response.body.get("error").is_some());
        assert!(response.body.get("file").is_none());
    }

    #[test]
    fn test_percentage_text_must_parse() {
        assert_eq!(Percentage::Text(" 7.5 ".to_string()).value().unwrap(), 7.5);
        assert!(Percentage::Text("lots".to_string()).value().is_err());
    }

    #[test]
    fn test_same_file_falls_back_to_string_compare() {
        assert!(same_file("/nonexistent/a.xlsx", "/nonexistent/a.xlsx"));
        assert!(!same_file("/nonexistent/a.xlsx", "/nonexistent/b.xlsx"));
    }
}
