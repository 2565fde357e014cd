use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::models::{DrawRecord, FrequencyTable, GameConfig, MAIN_PICKS, validate_record};

pub const CLEAN_FILE: &str = "powerball_clean.csv";
pub const FREQ_MAIN_FILE: &str = "freq_main_full.csv";
pub const FREQ_BONUS_FILE: &str = "freq_powerball_full.csv";

const CLEAN_HEADER: [&str; 7] = ["Draw Date", "Num1", "Num2", "Num3", "Num4", "Num5", "Powerball"];
const FREQ_HEADER: [&str; 2] = ["number", "count"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Chemins des trois instantanés écrits dans `dir`.
#[derive(Debug, Clone)]
pub struct SnapshotPaths {
    pub clean: PathBuf,
    pub freq_main: PathBuf,
    pub freq_bonus: PathBuf,
}

impl SnapshotPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            clean: dir.join(CLEAN_FILE),
            freq_main: dir.join(FREQ_MAIN_FILE),
            freq_bonus: dir.join(FREQ_BONUS_FILE),
        }
    }
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Impossible de créer le répertoire {:?}", dir))
}

pub fn write_clean_snapshot(path: &Path, records: &[DrawRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Impossible de créer {:?}", path))?;
    writer.write_record(CLEAN_HEADER)?;

    for record in records {
        let mut row = Vec::with_capacity(CLEAN_HEADER.len());
        row.push(record.date.format(DATE_FORMAT).to_string());
        row.extend(record.main.iter().map(|n| n.to_string()));
        row.push(record.bonus.to_string());
        writer.write_record(&row)?;
    }

    writer.flush().with_context(|| format!("Échec de l'écriture de {:?}", path))?;
    log::info!("{} tirages écrits dans {:?}", records.len(), path);
    Ok(())
}

/// Relecture stricte : la première ligne invalide interrompt la lecture.
pub fn read_clean_snapshot(path: &Path, config: &GameConfig) -> Result<Vec<DrawRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Erreur lecture ligne {}", line + 1))?;
        if row.len() < CLEAN_HEADER.len() {
            bail!("Ligne {} incomplète : {} champs", line + 1, row.len());
        }

        let date = NaiveDate::parse_from_str(row[0].trim(), DATE_FORMAT)
            .with_context(|| format!("Date invalide '{}' (ligne {})", &row[0], line + 1))?;

        let get_u8 = |idx: usize| -> Result<u8> {
            row[idx]
                .trim()
                .parse::<u8>()
                .with_context(|| format!("Impossible de parser '{}' (ligne {})", &row[idx], line + 1))
        };

        let mut main = [0u8; MAIN_PICKS];
        for (i, slot) in main.iter_mut().enumerate() {
            *slot = get_u8(i + 1)?;
        }
        let bonus = get_u8(MAIN_PICKS + 1)?;

        let record = DrawRecord { date, main, bonus };
        validate_record(&record, config).with_context(|| format!("Ligne {} invalide", line + 1))?;
        records.push(record);
    }

    Ok(records)
}

pub fn write_frequency_table(path: &Path, table: &FrequencyTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Impossible de créer {:?}", path))?;
    writer.write_record(FREQ_HEADER)?;
    for (number, count) in table.entries() {
        writer.write_record([number.to_string(), count.to_string()])?;
    }
    writer.flush().with_context(|| format!("Échec de l'écriture de {:?}", path))?;
    log::info!("table de fréquences écrite dans {:?}", path);
    Ok(())
}

/// Relit une table `numéro,compte`. Les numéros absents du fichier valent 0.
pub fn read_frequency_table(path: &Path, max: u8) -> Result<FrequencyTable> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let mut counts = vec![0u32; max as usize];
    let mut seen = vec![false; max as usize];
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Erreur lecture ligne {}", line + 1))?;
        if row.len() < 2 {
            bail!("Ligne {} incomplète", line + 1);
        }
        let number: u8 = row[0]
            .trim()
            .parse()
            .with_context(|| format!("Numéro invalide '{}' (ligne {})", &row[0], line + 1))?;
        let count: u32 = row[1]
            .trim()
            .parse()
            .with_context(|| format!("Compte invalide '{}' (ligne {})", &row[1], line + 1))?;
        if number < 1 || number > max {
            bail!("Numéro {} hors limites (1-{})", number, max);
        }
        let idx = (number - 1) as usize;
        if seen[idx] {
            bail!("Numéro {} en double (ligne {})", number, line + 1);
        }
        seen[idx] = true;
        counts[idx] = count;
    }

    FrequencyTable::from_counts(counts)
}
