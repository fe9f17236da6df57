//! CSV import for football-data.co.uk season files
//!
//! Columns are located by header name, so files from seasons with extra or
//! missing columns import the same way.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;

use crate::data::teams::TeamNameNormalizer;
use crate::data::Database;
use crate::{FootballError, MatchRecord, MatchResult, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub errors: u32,
}

/// Column positions resolved from the header row
struct Columns {
    date: usize,
    home_team: usize,
    away_team: usize,
    home_goals: Option<usize>,
    away_goals: Option<usize>,
    result: Option<usize>,
    home_shots_on_target: Option<usize>,
    away_shots_on_target: Option<usize>,
    home_corners: Option<usize>,
    away_corners: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                FootballError::Parse(format!("Missing required column '{}'", name))
            })
        };

        Ok(Columns {
            date: require("Date")?,
            home_team: require("HomeTeam")?,
            away_team: require("AwayTeam")?,
            home_goals: find("FTHG"),
            away_goals: find("FTAG"),
            result: find("FTR"),
            home_shots_on_target: find("HST"),
            away_shots_on_target: find("AST"),
            home_corners: find("HC"),
            away_corners: find("AC"),
        })
    }
}

/// Parse `dd/mm/yy`, `dd/mm/yyyy` or ISO `yyyy-mm-dd`
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    let parts: Vec<&str> = raw.split('/').collect();
    let parsed = if parts.len() == 3 {
        let format = if parts[2].len() == 2 { "%d/%m/%y" } else { "%d/%m/%Y" };
        NaiveDate::parse_from_str(raw, format)
    } else {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    };
    parsed.map_err(|_| FootballError::Parse(format!("Invalid date format: '{}'", raw)))
}

fn field<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> Option<&'r str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Goals are required to be numeric when present
fn parse_goals(record: &csv::StringRecord, idx: Option<usize>, column: &str) -> Result<Option<u8>> {
    match field(record, idx) {
        Some(s) => s
            .parse::<u8>()
            .map(Some)
            .map_err(|_| FootballError::Parse(format!("Invalid {} '{}'", column, s))),
        None => Ok(None),
    }
}

/// Optional stats degrade to None when unparseable
fn parse_stat(record: &csv::StringRecord, idx: Option<usize>, column: &str) -> Option<u8> {
    let raw = field(record, idx)?;
    match raw.parse::<u8>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::debug!("Ignoring unparseable {} value '{}'", column, raw);
            None
        }
    }
}

/// Season codes look like `2425`, `2024-25` or `2024_2025`
fn looks_like_season(name: &str) -> bool {
    let digits = name.chars().filter(char::is_ascii_digit).count();
    digits >= 4 && name.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '_')
}

/// Season tag from the file path: the stem (`2425.csv`) or, for
/// football-data.co.uk's `<season>/E0.csv` layout, the parent directory
pub fn infer_season(path: &Path) -> Option<String> {
    let stem = path.file_stem().and_then(|s| s.to_str());
    let parent = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str());
    [stem, parent]
        .into_iter()
        .flatten()
        .find(|name| looks_like_season(name))
        .map(str::to_string)
}

fn parse_record(
    record: &csv::StringRecord,
    columns: &Columns,
    normalizer: &TeamNameNormalizer,
    season: Option<&str>,
) -> Result<MatchRecord> {
    let date_raw = field(record, Some(columns.date))
        .ok_or_else(|| FootballError::Parse("Missing date".to_string()))?;
    let date = parse_date(date_raw)?;

    let home_raw = field(record, Some(columns.home_team))
        .ok_or_else(|| FootballError::Parse("Missing home team".to_string()))?;
    let away_raw = field(record, Some(columns.away_team))
        .ok_or_else(|| FootballError::Parse("Missing away team".to_string()))?;

    let result = match field(record, columns.result) {
        Some(code) => Some(
            MatchResult::from_code(code)
                .ok_or_else(|| FootballError::Parse(format!("Invalid result '{}'", code)))?,
        ),
        None => None,
    };

    Ok(MatchRecord {
        date,
        season: season.map(str::to_string),
        home_team: normalizer.normalize(home_raw),
        away_team: normalizer.normalize(away_raw),
        home_goals: parse_goals(record, columns.home_goals, "FTHG")?,
        away_goals: parse_goals(record, columns.away_goals, "FTAG")?,
        result,
        home_shots_on_target: parse_stat(record, columns.home_shots_on_target, "HST"),
        away_shots_on_target: parse_stat(record, columns.away_shots_on_target, "AST"),
        home_corners: parse_stat(record, columns.home_corners, "HC"),
        away_corners: parse_stat(record, columns.away_corners, "AC"),
    })
}

/// Read match records from CSV. Rows that fail to parse are counted and
/// skipped; fully blank rows are ignored.
pub fn read_matches<R: Read>(
    reader: R,
    normalizer: &TeamNameNormalizer,
    season: Option<&str>,
) -> Result<(Vec<MatchRecord>, ImportResult)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = Columns::from_headers(&headers)?;

    let mut records = Vec::new();
    let mut result = ImportResult::default();

    for (line, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Failed to read row {}: {}", line + 2, e);
                result.total_records += 1;
                result.errors += 1;
                continue;
            }
        };
        if row.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        result.total_records += 1;
        match parse_record(&row, &columns, normalizer, season) {
            Ok(record) => records.push(record),
            Err(e) => {
                log::warn!("Skipping row {}: {}", line + 2, e);
                result.errors += 1;
            }
        }
    }

    Ok((records, result))
}

/// Import one season file into the database
pub fn import_csv(
    db: &Database,
    path: &Path,
    normalizer: &TeamNameNormalizer,
    season: Option<&str>,
) -> Result<ImportResult> {
    let file = std::fs::File::open(path)?;
    let inferred = infer_season(path);
    let season = season.or(inferred.as_deref());
    if season.is_none() {
        log::warn!("No season tag for {}; pass --season to set one", path.display());
    }

    let (records, mut result) = read_matches(file, normalizer, season)?;
    result.inserted = db.upsert_matches(&records)? as u32;

    log::info!(
        "Imported {}: {} rows, {} stored, {} errors",
        path.display(),
        result.total_records,
        result.inserted,
        result.errors
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Div,Date,Time,HomeTeam,AwayTeam,FTHG,FTAG,FTR,HST,AST,HC,AC
E0,16/08/2024,20:00,Man United,Fulham,1,0,H,5,2,7,8
E0,17/08/2024,12:30,Ipswich,Liverpool,0,2,A,2,5,3,10
E0,17/08/24,15:00,Nottingham Forest,Bournemouth,1,1,D,,,,
E0,not a date,15:00,Arsenal,Wolves,2,0,H,6,1,9,2
,,,,,,,,,,,
E0,24/08/2024,15:00,Brighton,Man Utd,,,,,,,
";

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 8, 17);
        assert_eq!(parse_date("17/08/2024").ok(), expected);
        assert_eq!(parse_date("17/08/24").ok(), expected);
        assert_eq!(parse_date("2024-08-17").ok(), expected);
        assert!(parse_date("17.08.2024").is_err());
    }

    #[test]
    fn test_read_sample() {
        let normalizer = TeamNameNormalizer::new();
        let (records, result) = read_matches(SAMPLE.as_bytes(), &normalizer, Some("2425")).unwrap();

        assert_eq!(result.total_records, 5);
        assert_eq!(result.errors, 1);
        assert_eq!(records.len(), 4);

        let first = &records[0];
        assert_eq!(first.result, Some(MatchResult::HomeWin));
        assert_eq!(first.home_shots_on_target, Some(5));
        assert_eq!(first.away_corners, Some(8));
        assert_eq!(first.season.as_deref(), Some("2425"));

        let forest = &records[2];
        assert_eq!(forest.home_team, "Nott'm Forest");
        assert_eq!(forest.result, Some(MatchResult::Draw));
        assert_eq!(forest.home_corners, None);

        let fixture = &records[3];
        assert_eq!(fixture.away_team, "Man United");
        assert!(fixture.result.is_none());
        assert!(fixture.home_goals.is_none());
    }

    #[test]
    fn test_older_files_without_stats() {
        let csv = "Date,HomeTeam,AwayTeam,FTHG,FTAG,FTR\n08/08/15,Bournemouth,Aston Villa,0,1,A\n";
        let normalizer = TeamNameNormalizer::new();
        let (records, result) = read_matches(csv.as_bytes(), &normalizer, None).unwrap();
        assert_eq!(result.errors, 0);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2015, 8, 8).unwrap());
        assert_eq!(records[0].result, Some(MatchResult::AwayWin));
        assert!(records[0].home_shots_on_target.is_none());
    }

    #[test]
    fn test_unparseable_stat_is_dropped() {
        let csv = "Date,HomeTeam,AwayTeam,FTHG,FTAG,FTR,HST,AST\n\
                   01/09/2024,Arsenal,Wolves,1,0,H,n/a,3\n";
        let normalizer = TeamNameNormalizer::new();
        let (records, result) = read_matches(csv.as_bytes(), &normalizer, None).unwrap();
        assert_eq!(result.errors, 0);
        assert_eq!(records[0].home_shots_on_target, None);
        assert_eq!(records[0].away_shots_on_target, Some(3));
    }

    #[test]
    fn test_infer_season() {
        assert_eq!(infer_season(Path::new("2425.csv")).as_deref(), Some("2425"));
        assert_eq!(infer_season(Path::new("data/2425/E0.csv")).as_deref(), Some("2425"));
        assert_eq!(infer_season(Path::new("seasons/2024-25.csv")).as_deref(), Some("2024-25"));
        assert_eq!(infer_season(Path::new("downloads/E0.csv")), None);
        assert_eq!(infer_season(Path::new("E0.csv")), None);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "Date,Home,Away\n01/01/2024,A,B\n";
        let normalizer = TeamNameNormalizer::new();
        assert!(matches!(
            read_matches(csv.as_bytes(), &normalizer, None),
            Err(FootballError::Parse(_))
        ));
    }

    #[test]
    fn test_import_into_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2425.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let db = Database::in_memory().unwrap();
        let normalizer = TeamNameNormalizer::new();
        let result = import_csv(&db, &path, &normalizer, None).unwrap();
        assert_eq!(result.inserted, 4);

        let all = db.get_all_matches().unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|m| m.season.as_deref() == Some("2425")));
    }

    #[test]
    fn test_import_division_file_in_season_directory() {
        let dir = tempfile::tempdir().unwrap();
        let season_dir = dir.path().join("2324");
        std::fs::create_dir_all(&season_dir).unwrap();
        let path = season_dir.join("E0.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let db = Database::in_memory().unwrap();
        import_csv(&db, &path, &TeamNameNormalizer::new(), None).unwrap();
        let all = db.get_all_matches().unwrap();
        assert!(all.iter().all(|m| m.season.as_deref() == Some("2324")));
    }
}
