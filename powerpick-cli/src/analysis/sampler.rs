use anyhow::{Result, bail};
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, RngExt, SeedableRng};

use powerpick_data::models::{FrequencyTable, MAIN_PICKS, SamplingStatus, Ticket};

/// Valeurs tirées, dans l'ordre du tirage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub values: Vec<u8>,
    pub status: SamplingStatus,
}

/// Tirage pondéré sans remise de `k` numéros distincts.
///
/// Les poids sont les fréquences normalisées. S'il y a moins de `k` numéros à
/// poids positif, le tirage se fait uniformément sur tout le domaine.
pub fn sample_main_numbers<R: Rng + ?Sized>(
    table: &FrequencyTable,
    k: usize,
    rng: &mut R,
) -> Result<Sample> {
    let domain = table.len();
    if k > domain {
        bail!("Impossible de tirer {} numéros distincts sur un domaine de {}", k, domain);
    }

    let (weights, status) = if table.positive_count() < k {
        log::warn!(
            "seulement {} numéros à poids positif pour {} tirages : repli uniforme",
            table.positive_count(),
            k
        );
        (vec![1.0 / domain as f64; domain], SamplingStatus::UniformFallback)
    } else {
        (table.probabilities(), SamplingStatus::Weighted)
    };

    let mut available: Vec<(u8, f64)> = (1..=table.max()).zip(weights).collect();
    let mut values = Vec::with_capacity(k);

    for _ in 0..k {
        let dist: WeightedIndex<f64> = WeightedIndex::new(available.iter().map(|(_, w)| *w))?;
        let idx = dist.sample(rng);
        let (number, _) = available.remove(idx);
        values.push(number);
    }

    Ok(Sample { values, status })
}

/// Un seul tirage pondéré ; repli uniforme si la table est entièrement nulle.
pub fn sample_bonus_number<R: Rng + ?Sized>(
    table: &FrequencyTable,
    rng: &mut R,
) -> Result<(u8, SamplingStatus)> {
    if table.is_empty() {
        bail!("Table de fréquences bonus vide");
    }

    if table.total() == 0 {
        log::warn!("table bonus sans occurrence : repli uniforme");
        let n = rng.random_range(1..=table.max());
        return Ok((n, SamplingStatus::UniformFallback));
    }

    let dist: WeightedIndex<f64> = WeightedIndex::new(table.probabilities())?;
    let idx = dist.sample(rng);
    Ok(((idx + 1) as u8, SamplingStatus::Weighted))
}

/// Générateur de grilles pondérées. L'état aléatoire est porté par l'instance.
pub struct WeightedPicker {
    rng: StdRng,
}

impl WeightedPicker {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self { rng }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn sample_main_numbers(&mut self, table: &FrequencyTable, k: usize) -> Result<Sample> {
        sample_main_numbers(table, k, &mut self.rng)
    }

    pub fn sample_bonus_number(&mut self, table: &FrequencyTable) -> Result<(u8, SamplingStatus)> {
        sample_bonus_number(table, &mut self.rng)
    }

    /// Avec un seed, le générateur est réinitialisé avant le tirage : seul ce
    /// premier tirage est reproductible, les suivants continuent le flux.
    pub fn build_ticket(
        &mut self,
        main_table: &FrequencyTable,
        bonus_table: &FrequencyTable,
        seed: Option<u64>,
    ) -> Result<Ticket> {
        if let Some(s) = seed {
            self.reseed(s);
        }

        let main_sample = self.sample_main_numbers(main_table, MAIN_PICKS)?;
        let (bonus, bonus_status) = self.sample_bonus_number(bonus_table)?;

        let mut main = [0u8; MAIN_PICKS];
        for (i, &n) in main_sample.values.iter().enumerate() {
            main[i] = n;
        }
        main.sort();

        Ok(Ticket {
            main,
            bonus,
            main_status: main_sample.status,
            bonus_status,
        })
    }

    /// Réinitialise une fois (si seed) puis enchaîne `n` grilles sur le même flux.
    pub fn generate_tickets(
        &mut self,
        main_table: &FrequencyTable,
        bonus_table: &FrequencyTable,
        n: usize,
        seed: Option<u64>,
    ) -> Result<Vec<Ticket>> {
        if let Some(s) = seed {
            self.reseed(s);
        }
        (0..n)
            .map(|_| self.build_ticket(main_table, bonus_table, None))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn skewed_main() -> FrequencyTable {
        let counts: Vec<u32> = (1..=69).map(|n| 10 + n).collect();
        FrequencyTable::from_counts(counts).unwrap()
    }

    fn uniform_bonus() -> FrequencyTable {
        FrequencyTable::from_counts(vec![4; 26]).unwrap()
    }

    fn sparse(max: u8, positives: &[(u8, u32)]) -> FrequencyTable {
        let mut counts = vec![0u32; max as usize];
        for &(n, c) in positives {
            counts[(n - 1) as usize] = c;
        }
        FrequencyTable::from_counts(counts).unwrap()
    }

    #[test]
    fn test_main_numbers_distinct_and_in_domain() {
        let table = skewed_main();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sample = sample_main_numbers(&table, 5, &mut rng).unwrap();
            assert_eq!(sample.values.len(), 5);
            assert_eq!(sample.status, SamplingStatus::Weighted);
            let unique: HashSet<u8> = sample.values.iter().copied().collect();
            assert_eq!(unique.len(), 5, "doublon : {:?}", sample.values);
            assert!(sample.values.iter().all(|&n| (1..=69).contains(&n)));
        }
    }

    #[test]
    fn test_zero_weight_never_drawn() {
        // Exactement 5 numéros à poids positif : ce sont toujours eux.
        let table = sparse(69, &[(3, 1), (17, 5), (29, 2), (44, 9), (60, 1)]);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut values = sample_main_numbers(&table, 5, &mut rng).unwrap().values;
            values.sort();
            assert_eq!(values, vec![3, 17, 29, 44, 60]);
        }
    }

    #[test]
    fn test_uniform_fallback_on_sparse_table() {
        let table = sparse(69, &[(1, 100), (2, 50), (3, 10)]);
        let mut seen_outside = false;
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sample = sample_main_numbers(&table, 5, &mut rng).unwrap();
            assert_eq!(sample.status, SamplingStatus::UniformFallback);
            let unique: HashSet<u8> = sample.values.iter().copied().collect();
            assert_eq!(unique.len(), 5);
            seen_outside |= sample.values.iter().any(|&n| n > 3);
        }
        assert!(seen_outside);
    }

    #[test]
    fn test_uniform_fallback_on_zero_table() {
        let table = FrequencyTable::empty(69);
        let mut rng = StdRng::seed_from_u64(1);
        let sample = sample_main_numbers(&table, 5, &mut rng).unwrap();
        assert_eq!(sample.status, SamplingStatus::UniformFallback);
        assert_eq!(sample.values.iter().collect::<HashSet<_>>().len(), 5);
    }

    #[test]
    fn test_k_larger_than_domain() {
        let table = FrequencyTable::from_counts(vec![1; 4]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_main_numbers(&table, 5, &mut rng).is_err());
    }

    #[test]
    fn test_weighting_favors_frequent_numbers() {
        let mut counts = vec![1u32; 69];
        counts[0] = 1000;
        let table = FrequencyTable::from_counts(counts).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let hits = (0..100)
            .filter(|_| sample_main_numbers(&table, 5, &mut rng).unwrap().values.contains(&1))
            .count();
        assert!(hits >= 95, "le numéro 1 devrait sortir presque toujours : {hits}/100");
    }

    #[test]
    fn test_bonus_in_domain() {
        let table = uniform_bonus();
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (n, status) = sample_bonus_number(&table, &mut rng).unwrap();
            assert!((1..=26).contains(&n));
            assert_eq!(status, SamplingStatus::Weighted);
        }
    }

    #[test]
    fn test_bonus_single_positive() {
        let table = sparse(26, &[(10, 3)]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(sample_bonus_number(&table, &mut rng).unwrap().0, 10);
        }
    }

    #[test]
    fn test_bonus_zero_table_falls_back() {
        let table = FrequencyTable::empty(26);
        let mut rng = StdRng::seed_from_u64(7);
        let (n, status) = sample_bonus_number(&table, &mut rng).unwrap();
        assert!((1..=26).contains(&n));
        assert_eq!(status, SamplingStatus::UniformFallback);
    }

    #[test]
    fn test_ticket_sorted() {
        let mut picker = WeightedPicker::new(Some(3));
        let ticket = picker.build_ticket(&skewed_main(), &uniform_bonus(), None).unwrap();
        assert!(ticket.main.windows(2).all(|w| w[0] < w[1]));
        assert!(!ticket.is_fallback());
    }

    #[test]
    fn test_seeded_ticket_reproducible() {
        let main = skewed_main();
        let bonus = uniform_bonus();

        let mut picker = WeightedPicker::new(None);
        let a = picker.build_ticket(&main, &bonus, Some(42)).unwrap();
        let b = picker.build_ticket(&main, &bonus, Some(42)).unwrap();
        assert_eq!(a, b);

        let mut other = WeightedPicker::new(None);
        assert_eq!(other.build_ticket(&main, &bonus, Some(42)).unwrap(), a);
    }

    #[test]
    fn test_generate_tickets_deterministic() {
        let main = skewed_main();
        let bonus = uniform_bonus();

        let s1 = WeightedPicker::new(None).generate_tickets(&main, &bonus, 5, Some(7)).unwrap();
        let s2 = WeightedPicker::new(Some(999)).generate_tickets(&main, &bonus, 5, Some(7)).unwrap();
        assert_eq!(s1.len(), 5);
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_generate_tickets_continues_stream() {
        let main = skewed_main();
        let bonus = uniform_bonus();

        let tickets = WeightedPicker::new(None).generate_tickets(&main, &bonus, 3, Some(7)).unwrap();

        // Premier ticket = tirage réinitialisé isolé ; les suivants suivent le flux.
        let mut picker = WeightedPicker::new(None);
        assert_eq!(picker.build_ticket(&main, &bonus, Some(7)).unwrap(), tickets[0]);
        assert_eq!(picker.build_ticket(&main, &bonus, None).unwrap(), tickets[1]);
        assert_eq!(picker.build_ticket(&main, &bonus, None).unwrap(), tickets[2]);
    }

    #[test]
    fn test_picker_seed_matches_free_functions() {
        let main = skewed_main();
        let mut picker = WeightedPicker::new(Some(11));
        let mut rng = StdRng::seed_from_u64(11);
        assert_eq!(
            picker.sample_main_numbers(&main, 5).unwrap(),
            sample_main_numbers(&main, 5, &mut rng).unwrap()
        );
    }
}
