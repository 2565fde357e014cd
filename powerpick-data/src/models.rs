use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Nombre de numéros principaux par tirage.
pub const MAIN_PICKS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub date: NaiveDate,
    pub main: [u8; MAIN_PICKS],
    pub bonus: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Main,
    Bonus,
}

impl Pool {
    pub fn pick_count(&self) -> usize {
        match self {
            Pool::Main => MAIN_PICKS,
            Pool::Bonus => 1,
        }
    }

    pub fn numbers_from<'a>(&self, record: &'a DrawRecord) -> &'a [u8] {
        match self {
            Pool::Main => &record.main,
            Pool::Bonus => std::slice::from_ref(&record.bonus),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Pool::Main => "Numéros principaux",
            Pool::Bonus => "Powerball",
        }
    }
}

/// Domaines de valeurs du jeu. Le défaut correspond au Powerball actuel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub name: String,
    pub main_max: u8,
    pub bonus_max: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            name: "Powerball".to_string(),
            main_max: 69,
            bonus_max: 26,
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire la configuration {:?}", path))?;
        let config: GameConfig = serde_json::from_str(&json)
            .with_context(|| format!("Configuration invalide {:?}", path))?;
        config.validate()?;
        log::info!("configuration chargée : {} ({:?})", config.name, path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if (self.main_max as usize) < MAIN_PICKS {
            bail!(
                "Domaine principal trop petit : 1-{} pour {} numéros distincts",
                self.main_max,
                MAIN_PICKS
            );
        }
        if self.bonus_max == 0 {
            bail!("Domaine bonus vide");
        }
        Ok(())
    }

    pub fn max(&self, pool: Pool) -> u8 {
        match pool {
            Pool::Main => self.main_max,
            Pool::Bonus => self.bonus_max,
        }
    }
}

/// Nombre d'occurrences par numéro sur tout le domaine `1..=max`, zéros compris.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: Vec<u32>,
}

impl FrequencyTable {
    pub fn empty(max: u8) -> Self {
        Self {
            counts: vec![0; max as usize],
        }
    }

    /// Compte les numéros fournis ; ceux hors domaine sont ignorés.
    pub fn tally<I>(max: u8, numbers: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let mut counts = vec![0u32; max as usize];
        for n in numbers {
            if n == 0 {
                continue;
            }
            let idx = (n - 1) as usize;
            if idx < counts.len() {
                counts[idx] += 1;
            }
        }
        Self { counts }
    }

    /// `counts[i]` est le compte du numéro `i + 1` ; au plus 255 numéros.
    pub fn from_counts(counts: Vec<u32>) -> Result<Self> {
        if counts.len() > u8::MAX as usize {
            bail!("Domaine de {} numéros trop grand (max {})", counts.len(), u8::MAX);
        }
        Ok(Self { counts })
    }

    pub fn max(&self) -> u8 {
        self.counts.len() as u8
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, number: u8) -> u32 {
        if number == 0 {
            return 0;
        }
        self.counts.get((number - 1) as usize).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Nombre de numéros ayant un poids strictement positif.
    pub fn positive_count(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn entries(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &c)| ((i + 1) as u8, c))
    }

    /// count / total, indexé par `numéro - 1`. Tout à zéro si la table est vide.
    pub fn probabilities(&self) -> Vec<f64> {
        let total = self.total();
        if total == 0 {
            return vec![0.0; self.counts.len()];
        }
        self.counts
            .iter()
            .map(|&c| c as f64 / total as f64)
            .collect()
    }

    pub fn hottest(&self, n: usize) -> Vec<(u8, u32)> {
        let mut sorted: Vec<(u8, u32)> = self.entries().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        sorted.truncate(n);
        sorted
    }

    pub fn coldest(&self, n: usize) -> Vec<(u8, u32)> {
        let mut sorted: Vec<(u8, u32)> = self.entries().collect();
        sorted.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        sorted.truncate(n);
        sorted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingStatus {
    Weighted,
    /// Pas assez de numéros à poids positif : tirage uniforme sur le domaine.
    UniformFallback,
}

impl std::fmt::Display for SamplingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplingStatus::Weighted => write!(f, "pondéré"),
            SamplingStatus::UniformFallback => write!(f, "UNIFORME"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub main: [u8; MAIN_PICKS],
    pub bonus: u8,
    pub main_status: SamplingStatus,
    pub bonus_status: SamplingStatus,
}

impl Ticket {
    pub fn is_fallback(&self) -> bool {
        self.main_status == SamplingStatus::UniformFallback
            || self.bonus_status == SamplingStatus::UniformFallback
    }
}

pub fn validate_record(record: &DrawRecord, config: &GameConfig) -> Result<()> {
    for &n in &record.main {
        if n < 1 || n > config.main_max {
            bail!("Numéro {} hors limites (1-{})", n, config.main_max);
        }
    }
    if record.bonus < 1 || record.bonus > config.bonus_max {
        bail!("Powerball {} hors limites (1-{})", record.bonus, config.bonus_max);
    }
    for i in 0..record.main.len() {
        for j in (i + 1)..record.main.len() {
            if record.main[i] == record.main[j] {
                bail!("Numéro en double : {}", record.main[i]);
            }
        }
    }
    Ok(())
}
