use polars::prelude::*;
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, trace};

use crate::domain::SearchError;

#[derive(Debug)]
enum FileType {
    JSON,
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// One user entry. Field names follow the camelCase keys of the data files.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: i64,
    pub first_name: String,
    pub maiden_name: String,
    pub last_name: String,
    pub age: u32,
    pub gender: String,
    pub email: String,
}

const TEXT_COLUMNS: [&str; 5] = ["firstName", "maidenName", "lastName", "gender", "email"];

#[derive(Debug)]
pub struct Dataset {
    pub name: String,
    pub records: Vec<Record>,
}

impl Dataset {
    /// Load and validate a user list. `path` may contain `~` and environment variables.
    pub fn load(path: &str) -> Result<Self, SearchError> {
        let expanded = shellexpand::full(path)
            .map_err(|e| SearchError::PathExpansion(path.to_string(), e.to_string()))?;
        let file_info = Dataset::get_file_info(PathBuf::from(expanded.as_ref()))?;
        debug!("Loading {:?}", file_info);

        let start_time = Instant::now();
        let records = match file_info.file_type {
            FileType::JSON => Dataset::load_json(&file_info.path)?,
            FileType::CSV => Dataset::from_frame(Dataset::load_csv(&file_info.path)?.collect()?)?,
            FileType::PARQUET => {
                Dataset::from_frame(Dataset::load_parquet(&file_info.path)?.collect()?)?
            }
            FileType::ARROW => {
                Dataset::from_frame(Dataset::load_arrow(&file_info.path)?.collect()?)?
            }
        };
        Dataset::validate(&records)?;

        info!(
            "Loaded {} users ({} bytes) in {}ms ...",
            records.len(),
            file_info.file_size,
            start_time.elapsed().as_millis()
        );

        let name = file_info
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();

        Ok(Dataset { name, records })
    }

    fn validate(records: &[Record]) -> Result<(), SearchError> {
        let mut ids = HashSet::with_capacity(records.len());
        for record in records {
            if !ids.insert(record.id) {
                return Err(SearchError::DuplicateId(record.id));
            }
        }
        Ok(())
    }

    fn detect_file_type(path: &Path) -> Result<FileType, SearchError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("JSON") => Ok(FileType::JSON),
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(SearchError::UnknownFileType(path.to_path_buf())),
        }
    }

    fn get_file_info(path: PathBuf) -> Result<FileInfo, SearchError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SearchError::FileNotFound(path.clone()),
            ErrorKind::PermissionDenied => SearchError::PermissionDenied(path.clone()),
            _ => SearchError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(SearchError::LoadingFailed("Not a file!".into()));
        }

        let file_size = metadata.len();
        let file_type = Dataset::detect_file_type(&path)?;

        Ok(FileInfo {
            path,
            file_size,
            file_type,
        })
    }

    fn load_json(path: &Path) -> Result<Vec<Record>, SearchError> {
        let reader = BufReader::new(File::open(path)?);
        let records: Vec<Record> = serde_json::from_reader(reader)?;
        Ok(records)
    }

    fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
        // Empty cells are empty strings, as in the JSON files
        LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .with_missing_is_null(false)
            .finish()
    }

    fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
    }

    fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }

    // Turns a column oriented frame into records. Text columns are converted in parallel.
    fn from_frame(df: DataFrame) -> Result<Vec<Record>, SearchError> {
        let ids = Dataset::integer_column(&df, "id")?;
        let ages = Dataset::integer_column(&df, "age")?;

        let text: Result<Vec<Vec<String>>, SearchError> = TEXT_COLUMNS
            .par_iter()
            .map(|name| Dataset::text_column(&df, name))
            .collect();
        let mut text = text?;
        trace!("Converted {} columns of {} rows", text.len() + 2, df.height());

        // Columns come back in TEXT_COLUMNS order
        let emails = text.pop().unwrap_or_default();
        let genders = text.pop().unwrap_or_default();
        let last_names = text.pop().unwrap_or_default();
        let maiden_names = text.pop().unwrap_or_default();
        let first_names = text.pop().unwrap_or_default();

        let mut records = Vec::with_capacity(ids.len());
        for (row, (id, age)) in ids.into_iter().zip(ages).enumerate() {
            let age = u32::try_from(age).map_err(|_| SearchError::InvalidValue {
                column: "age".to_string(),
                row,
                value: age.to_string(),
            })?;
            records.push(Record {
                id,
                first_name: first_names[row].clone(),
                maiden_name: maiden_names[row].clone(),
                last_name: last_names[row].clone(),
                age,
                gender: genders[row].clone(),
                email: emails[row].clone(),
            });
        }
        Ok(records)
    }

    fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, SearchError> {
        df.column(name)
            .map_err(|_| SearchError::MissingColumn(name.to_string()))
    }

    fn text_column(df: &DataFrame, name: &str) -> Result<Vec<String>, SearchError> {
        let col = Dataset::column(df, name)?.cast(&DataType::String)?;
        let series = col.str()?;
        series
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.map(|s| s.to_string()).ok_or_else(|| SearchError::NullValue {
                    column: name.to_string(),
                    row,
                })
            })
            .collect()
    }

    fn integer_column(df: &DataFrame, name: &str) -> Result<Vec<i64>, SearchError> {
        let series = Dataset::column(df, name)?.as_materialized_series();
        if series.dtype().is_integer()
            && let Ok(values) = series.strict_cast(&DataType::Int64)
        {
            return values
                .i64()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    value.ok_or_else(|| SearchError::NullValue {
                        column: name.to_string(),
                        row,
                    })
                })
                .collect();
        }

        if series.dtype().is_float() {
            let values = series.cast(&DataType::Float64)?;
            return values
                .f64()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    let value = value.ok_or_else(|| SearchError::NullValue {
                        column: name.to_string(),
                        row,
                    })?;
                    // Whole numbers only, a cast would truncate
                    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                        Ok(value as i64)
                    } else {
                        Err(SearchError::InvalidValue {
                            column: name.to_string(),
                            row,
                            value: value.to_string(),
                        })
                    }
                })
                .collect();
        }

        // Text and out of range integers must parse exactly
        let text = series.cast(&DataType::String)?;
        text.str()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                let value = value.ok_or_else(|| SearchError::NullValue {
                    column: name.to_string(),
                    row,
                })?;
                value.parse::<i64>().map_err(|_| SearchError::InvalidValue {
                    column: name.to_string(),
                    row,
                    value: value.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture(name: &str) -> String {
        format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn sample_frame() -> DataFrame {
        df!(
            "id" => [1i64, 2],
            "firstName" => ["John", "Jane"],
            "maidenName" => ["Doe", "Air"],
            "lastName" => ["Smith", "Doe"],
            "age" => [30i64, 25],
            "gender" => ["M", "F"],
            "email" => ["john.smith@example.com", "jane.doe@example.com"],
        )
        .unwrap()
    }

    fn write_parquet(dir: &TempDir, mut df: DataFrame) -> String {
        let path = dir.path().join("users.parquet");
        let mut file = File::create(&path).unwrap();
        ParquetWriter::new(&mut file).finish(&mut df).unwrap();
        path.to_string_lossy().to_string()
    }

    fn write_arrow(dir: &TempDir, mut df: DataFrame) -> String {
        let path = dir.path().join("users.arrow");
        let mut file = File::create(&path).unwrap();
        IpcWriter::new(&mut file).finish(&mut df).unwrap();
        path.to_string_lossy().to_string()
    }

    fn json_sample() -> Vec<Record> {
        Dataset::load(&fixture("users_sample.json")).unwrap().records
    }

    #[test]
    fn load_json_sample() {
        let dataset = Dataset::load(&fixture("users_sample.json")).unwrap();
        assert_eq!(dataset.name, "users_sample.json");
        assert_eq!(dataset.records.len(), 2);
        assert_eq!(
            dataset.records[0],
            Record {
                id: 1,
                first_name: "John".into(),
                maiden_name: "Doe".into(),
                last_name: "Smith".into(),
                age: 30,
                gender: "M".into(),
                email: "john.smith@example.com".into(),
            }
        );
        assert_eq!(dataset.records[1].first_name, "Jane");
    }

    #[test]
    fn load_csv_sample() {
        let dataset = Dataset::load(&fixture("users_sample.csv")).unwrap();
        let json = Dataset::load(&fixture("users_sample.json")).unwrap();
        assert_eq!(dataset.records, json.records);
    }

    #[test]
    fn missing_field_is_rejected() {
        let err = Dataset::load(&fixture("users_missing_field.json")).unwrap_err();
        assert!(matches!(err, SearchError::JsonError(_)));
    }

    #[test]
    fn null_field_is_rejected() {
        let err = Dataset::load(&fixture("users_null_field.json")).unwrap_err();
        assert!(matches!(err, SearchError::JsonError(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Dataset::load(&fixture("users_duplicate_id.json")).unwrap_err();
        assert!(matches!(err, SearchError::DuplicateId(1)));
    }

    #[test]
    fn unknown_extension() {
        let err = Dataset::load(&fixture("README.txt")).unwrap_err();
        assert!(matches!(err, SearchError::UnknownFileType(_)));
    }

    #[test]
    fn missing_file() {
        let err = Dataset::load(&fixture("does_not_exist.json")).unwrap_err();
        assert!(matches!(err, SearchError::FileNotFound(_)));
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = format!("{}/tests/fixtures", env!("CARGO_MANIFEST_DIR"));
        let err = Dataset::load(&dir).unwrap_err();
        assert!(matches!(err, SearchError::LoadingFailed(_)));
    }

    #[test]
    fn bundled_data_loads() {
        let path = format!("{}/data/users.json", env!("CARGO_MANIFEST_DIR"));
        let dataset = Dataset::load(&path).unwrap();
        assert!(!dataset.records.is_empty());
    }

    #[test]
    fn empty_csv_cell_is_an_empty_string() {
        let csv = Dataset::load(&fixture("users_empty_maiden.csv")).unwrap();
        let json = Dataset::load(&fixture("users_empty_maiden.json")).unwrap();
        assert_eq!(csv.records[0].maiden_name, "");
        assert_eq!(csv.records, json.records);
    }

    #[test]
    fn fractional_csv_age_is_rejected() {
        let err = Dataset::load(&fixture("users_fractional_age.csv")).unwrap_err();
        match err {
            SearchError::InvalidValue { column, row, value } => {
                assert_eq!(column, "age");
                assert_eq!(row, 1);
                assert_eq!(value, "25.5");
            }
            e => panic!("unexpected error {e:?}"),
        }
    }

    #[test]
    fn load_parquet_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_parquet(&dir, sample_frame());
        let dataset = Dataset::load(&path).unwrap();
        assert_eq!(dataset.name, "users.parquet");
        assert_eq!(dataset.records, json_sample());
    }

    #[test]
    fn load_arrow_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_arrow(&dir, sample_frame());
        let dataset = Dataset::load(&path).unwrap();
        assert_eq!(dataset.records, json_sample());
    }

    #[test]
    fn columnar_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let df = sample_frame().drop("email").unwrap();
        let err = Dataset::load(&write_parquet(&dir, df)).unwrap_err();
        assert!(matches!(err, SearchError::MissingColumn(c) if c == "email"));
    }

    #[test]
    fn columnar_null_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut df = sample_frame();
        df.with_column(Series::new("maidenName".into(), [Some("Doe"), None::<&str>]))
            .unwrap();
        let err = Dataset::load(&write_arrow(&dir, df)).unwrap_err();
        assert!(matches!(
            err,
            SearchError::NullValue { column, row: 1 } if column == "maidenName"
        ));
    }

    #[test]
    fn columnar_negative_age() {
        let dir = tempfile::tempdir().unwrap();
        let mut df = sample_frame();
        df.with_column(Series::new("age".into(), [30i64, -1])).unwrap();
        let err = Dataset::load(&write_parquet(&dir, df)).unwrap_err();
        assert!(matches!(
            err,
            SearchError::InvalidValue { column, row: 1, value }
                if column == "age" && value == "-1"
        ));
    }

    #[test]
    fn columnar_fractional_age() {
        let dir = tempfile::tempdir().unwrap();
        let mut df = sample_frame();
        df.with_column(Series::new("age".into(), [30.0f64, 30.7])).unwrap();
        let err = Dataset::load(&write_parquet(&dir, df)).unwrap_err();
        assert!(matches!(
            err,
            SearchError::InvalidValue { column, row: 1, value }
                if column == "age" && value == "30.7"
        ));
    }
}
