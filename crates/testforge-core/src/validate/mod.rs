use crate::errors::PipelineError;
use crate::model::Row;

/// Closed required-column contract, checked before any row is processed.
pub const REQUIRED_COLUMNS: [&str; 4] = ["requirement_id", "title", "description", "priority"];

#[derive(Debug, Clone, Default)]
pub struct CsvValidation {
    pub valid: bool,
    /// Column names absent from the header; non-empty means no row was parsed.
    pub missing_columns: Vec<String>,
    pub errors: Vec<String>,
    pub rows: Vec<Row>,
}

/// Validates raw bytes as a delimited requirements document.
///
/// Rows are returned even when the document is marked invalid: downstream
/// callers may accept partial data or surface row-level errors. Only an
/// undecodable payload is a hard error; everything else is reported through
/// the returned structure.
pub fn validate_requirements_csv(bytes: &[u8]) -> Result<CsvValidation, PipelineError> {
    let text = decode_utf8(bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|s| s.trim().to_string()).collect(),
        Err(e) => {
            return Ok(CsvValidation {
                valid: false,
                missing_columns: Vec::new(),
                errors: vec![format!("CSV parse error: {e}")],
                rows: Vec::new(),
            })
        }
    };

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Ok(CsvValidation {
            valid: false,
            errors: vec![format!("missing required columns: {}", missing.join(", "))],
            missing_columns: missing,
            rows: Vec::new(),
        });
    }

    let mut errors = Vec::new();
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // header is line 1
        let line = idx + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                errors.push(format!("row {line}: {e}"));
                continue;
            }
        };
        let mut row = Row::new();
        for (key, value) in headers.iter().zip(record.iter()) {
            row.insert(key.clone(), value.trim().to_string());
        }
        for col in REQUIRED_COLUMNS {
            if row.get(col).map(|v| v.is_empty()).unwrap_or(true) {
                errors.push(format!("row {line}: '{col}' is empty"));
            }
        }
        rows.push(row);
    }

    Ok(CsvValidation {
        valid: errors.is_empty(),
        missing_columns: Vec::new(),
        errors,
        rows,
    })
}

fn decode_utf8(bytes: &[u8]) -> Result<&str, PipelineError> {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|_| PipelineError::Encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "requirement_id,title,description,priority\n\
                        REQ-1,Login,\"User can log in\",High\n\
                        REQ-2,Logout,\"User can log out\",Low\n";

    #[test]
    fn accepts_well_formed_document() {
        let v = validate_requirements_csv(GOOD.as_bytes()).unwrap();
        assert!(v.valid);
        assert!(v.errors.is_empty());
        assert_eq!(v.rows.len(), 2);
        assert_eq!(v.rows[0]["requirement_id"], "REQ-1");
        assert_eq!(v.rows[1]["description"], "User can log out");
    }

    #[test]
    fn tolerates_byte_order_mark() {
        let mut bytes = b"\xef\xbb\xbf".to_vec();
        bytes.extend_from_slice(GOOD.as_bytes());
        let v = validate_requirements_csv(&bytes).unwrap();
        assert!(v.valid);
        assert_eq!(v.rows.len(), 2);
    }

    #[test]
    fn missing_columns_fail_naming_them_with_zero_rows() {
        let csv = "requirement_id,description\nREQ-1,desc\n";
        let v = validate_requirements_csv(csv.as_bytes()).unwrap();
        assert!(!v.valid);
        assert_eq!(v.missing_columns, vec!["title", "priority"]);
        assert!(v.rows.is_empty());
        assert!(v.errors[0].contains("title"));
        assert!(v.errors[0].contains("priority"));
    }

    #[test]
    fn empty_required_cells_flag_rows_but_parse_all() {
        let csv = "requirement_id,title,description,priority\n\
                   REQ-1,,desc,High\n\
                   REQ-2,Logout,desc2,Low\n";
        let v = validate_requirements_csv(csv.as_bytes()).unwrap();
        assert!(!v.valid);
        assert_eq!(v.rows.len(), 2);
        assert_eq!(v.errors, vec!["row 2: 'title' is empty"]);
    }

    #[test]
    fn non_utf8_is_a_distinct_error() {
        let err = validate_requirements_csv(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, PipelineError::Encoding));
    }

    #[test]
    fn keys_and_values_are_trimmed() {
        let csv = "requirement_id , title ,description,priority\n REQ-1 , Login ,d,High\n";
        let v = validate_requirements_csv(csv.as_bytes()).unwrap();
        assert!(v.valid);
        assert_eq!(v.rows[0]["requirement_id"], "REQ-1");
        assert_eq!(v.rows[0]["title"], "Login");
    }
}
