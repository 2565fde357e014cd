pub mod sampler;

use powerpick_data::models::{DrawRecord, FrequencyTable, GameConfig, Pool};

pub fn frequency_table(records: &[DrawRecord], pool: Pool, max: u8) -> FrequencyTable {
    FrequencyTable::tally(
        max,
        records
            .iter()
            .flat_map(|r| pool.numbers_from(r).iter().copied()),
    )
}

/// Tables (principaux, bonus) sur les `last_n` derniers tirages, ou sur tout
/// l'historique si `last_n` est absent ou nul.
///
/// `records` doit être trié du plus ancien au plus récent.
pub fn windowed_frequency(
    records: &[DrawRecord],
    last_n: Option<usize>,
    config: &GameConfig,
) -> (FrequencyTable, FrequencyTable) {
    let window = match last_n {
        Some(n) if n > 0 => &records[records.len().saturating_sub(n)..],
        _ => records,
    };

    (
        frequency_table(window, Pool::Main, config.max(Pool::Main)),
        frequency_table(window, Pool::Bonus, config.max(Pool::Bonus)),
    )
}

#[cfg(test)]
pub(crate) fn make_test_records(n: usize) -> Vec<DrawRecord> {
    let start = chrono::NaiveDate::from_ymd_opt(2015, 10, 7).unwrap();
    (0..n)
        .map(|i| {
            let base = (i % 60) as u8;
            DrawRecord {
                date: start + chrono::Duration::days(3 * i as i64),
                main: [base + 1, base + 3, base + 5, base + 7, base + 9],
                bonus: (i % 26) as u8 + 1,
            }
        })
        .collect()
}
