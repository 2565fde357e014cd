use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use std::io;
use std::path::Path;

use powerpick_data::models::{DrawRecord, GameConfig, MAIN_PICKS, validate_record};

const DATE_COLUMN: &str = "Draw Date";
const BONUS_COLUMN: &str = "Powerball";
const WINNING_COLUMN: &str = "Winning Numbers";
const DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d"];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub total_rows: u32,
    pub kept: u32,
    /// Date ou numéro absent ou illisible.
    pub dropped_missing: u32,
    /// Hors domaine ou numéros en double.
    pub dropped_invalid: u32,
}

/// Positions des colonnes utiles dans l'en-tête.
#[derive(Debug, PartialEq, Eq)]
struct Columns {
    date: usize,
    main: [usize; MAIN_PICKS],
    bonus: usize,
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<Columns> {
    let find = |name: &str| headers.iter().position(|h| h.trim() == name);

    let date = find(DATE_COLUMN).with_context(|| format!("Colonne '{}' absente", DATE_COLUMN))?;
    let bonus = find(BONUS_COLUMN).with_context(|| format!("Colonne '{}' absente", BONUS_COLUMN))?;

    let named: Option<Vec<usize>> = (1..=MAIN_PICKS).map(|i| find(format!("Num{}", i).as_str())).collect();
    let main_positions: Vec<usize> = match named {
        Some(positions) => positions,
        None => {
            // "Winning Numbers" suivie de quatre colonnes sans nom
            let start = find(WINNING_COLUMN).with_context(|| {
                format!("Colonnes 'Num1'..'Num5' ou '{}' absentes", WINNING_COLUMN)
            })?;
            if start + MAIN_PICKS > headers.len() {
                bail!("'{}' doit être suivie de {} colonnes", WINNING_COLUMN, MAIN_PICKS - 1);
            }
            (start..start + MAIN_PICKS).collect()
        }
    };

    let mut main = [0usize; MAIN_PICKS];
    main.copy_from_slice(&main_positions);
    Ok(Columns { date, main, bonus })
}

/// Entier positif ; accepte "07" et "7.0". `None` si la valeur est illisible.
pub fn parse_number(raw: &str) -> Option<u8> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<u8>() {
        return Some(n);
    }
    let f = s.parse::<f64>().ok()?;
    if f.fract() == 0.0 && (0.0..=u8::MAX as f64).contains(&f) {
        Some(f as u8)
    } else {
        None
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn coerce_record(row: &csv::StringRecord, columns: &Columns) -> Option<DrawRecord> {
    let date = parse_date(row.get(columns.date)?)?;
    let mut main = [0u8; MAIN_PICKS];
    for (slot, &idx) in main.iter_mut().zip(columns.main.iter()) {
        *slot = parse_number(row.get(idx)?)?;
    }
    let bonus = parse_number(row.get(columns.bonus)?)?;
    Some(DrawRecord { date, main, bonus })
}

pub fn import_from_reader<R: io::Read>(
    source: R,
    config: &GameConfig,
) -> Result<(Vec<DrawRecord>, ImportReport)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(source);

    let headers = reader.headers().context("En-tête illisible")?.clone();
    let columns = resolve_columns(&headers)?;

    let mut report = ImportReport::default();
    let mut records = Vec::new();

    for row_result in reader.records() {
        report.total_rows += 1;
        let row = match row_result {
            Ok(row) => row,
            Err(e) => {
                log::debug!("ligne {} illisible : {}", report.total_rows, e);
                report.dropped_missing += 1;
                continue;
            }
        };

        let Some(record) = coerce_record(&row, &columns) else {
            log::debug!("ligne {} incomplète, ignorée", report.total_rows);
            report.dropped_missing += 1;
            continue;
        };

        if let Err(e) = validate_record(&record, config) {
            log::debug!("ligne {} invalide : {}", report.total_rows, e);
            report.dropped_invalid += 1;
            continue;
        }

        records.push(record);
    }

    // Tri stable, du plus ancien au plus récent
    records.sort_by_key(|r| r.date);
    report.kept = records.len() as u32;

    log::info!(
        "import : {} lignes, {} conservées, {} incomplètes, {} invalides",
        report.total_rows,
        report.kept,
        report.dropped_missing,
        report.dropped_invalid
    );

    Ok((records, report))
}

pub fn import_csv(path: &Path, config: &GameConfig) -> Result<(Vec<DrawRecord>, ImportReport)> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    import_from_reader(file, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(csv: &str) -> Result<(Vec<DrawRecord>, ImportReport)> {
        import_from_reader(csv.as_bytes(), &GameConfig::default())
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("07"), Some(7));
        assert_eq!(parse_number(" 69 "), Some(69));
        assert_eq!(parse_number("12.0"), Some(12));
        assert_eq!(parse_number("12.5"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("-3"), None);
        assert_eq!(parse_number("300"), None);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("02/03/2010"), NaiveDate::from_ymd_opt(2010, 2, 3));
        assert_eq!(parse_date("2024-11-30"), NaiveDate::from_ymd_opt(2024, 11, 30));
        assert_eq!(parse_date("2024/11/30"), NaiveDate::from_ymd_opt(2024, 11, 30));
        assert_eq!(parse_date("pas une date"), None);
        assert_eq!(parse_date("13/45/2020"), None);
    }

    #[test]
    fn test_winning_numbers_layout() {
        let csv = "\
Draw Date,Winning Numbers,,,,,Powerball,Multiplier
01/04/2023,5,11,22,23,69,7,2
01/02/2023,1,12,23,34,45,6,3
";
        let (records, report) = import(csv).unwrap();
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.kept, 2);
        // Trié du plus ancien au plus récent
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
        assert_eq!(records[0].main, [1, 12, 23, 34, 45]);
        assert_eq!(records[0].bonus, 6);
        assert_eq!(records[1].main, [5, 11, 22, 23, 69]);
    }

    #[test]
    fn test_named_columns_layout() {
        let csv = "\
Powerball,Num5,Num4,Num3,Num2,Num1,Draw Date
9,5,4,3,2,1,2022-06-01
";
        let (records, _) = import(csv).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].main, [1, 2, 3, 4, 5]);
        assert_eq!(records[0].bonus, 9);
    }

    #[test]
    fn test_malformed_rows_dropped() {
        let csv = "\
Draw Date,Num1,Num2,Num3,Num4,Num5,Powerball
2022-06-01,1,2,3,4,5,9
not-a-date,1,2,3,4,5,9
2022-06-04,1,2,,4,5,9
2022-06-06,1,2,x,4,5,9
2022-06-08,1,2,3
2022-06-11,1,1,3,4,5,9
2022-06-13,1,2,3,4,70,9
2022-06-15,1,2,3,4,5,27
";
        let (records, report) = import(csv).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            report,
            ImportReport {
                total_rows: 8,
                kept: 1,
                dropped_missing: 4,
                dropped_invalid: 3,
            }
        );
    }

    #[test]
    fn test_missing_column_is_error() {
        let csv = "Draw Date,Num1,Num2,Num3,Num4,Num5\n2022-06-01,1,2,3,4,5\n";
        assert!(import(csv).is_err());

        let csv = "Num1,Num2,Num3,Num4,Num5,Powerball\n1,2,3,4,5,6\n";
        assert!(import(csv).is_err());

        let csv = "Draw Date,Powerball,Winning Numbers,,\n2022-06-01,6,1,2,3\n";
        assert!(import(csv).is_err());
    }

    #[test]
    fn test_stable_sort_on_equal_dates() {
        let csv = "\
Draw Date,Num1,Num2,Num3,Num4,Num5,Powerball
2022-06-02,6,7,8,9,10,2
2022-06-01,1,2,3,4,5,1
2022-06-02,11,12,13,14,15,3
";
        let (records, _) = import(csv).unwrap();
        let bonuses: Vec<u8> = records.iter().map(|r| r.bonus).collect();
        assert_eq!(bonuses, vec![1, 2, 3]);
    }
}
