mod analysis;
mod display;
mod import;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::analysis::sampler::WeightedPicker;
use crate::analysis::windowed_frequency;
use crate::display::{
    display_frequency_chart, display_frequency_table, display_hot, display_hot_cold,
    display_import_summary, display_records, display_saved, display_ticket, display_tickets,
};
use crate::import::import_csv;
use powerpick_data::models::{DrawRecord, GameConfig, Pool};
use powerpick_data::snapshot::{
    SnapshotPaths, ensure_dir, write_clean_snapshot, write_frequency_table,
};

#[derive(Parser)]
#[command(name = "powerpick", about = "Statistiques et grilles pondérées Powerball")]
struct Cli {
    /// Fichier JSON de configuration du jeu (domaines des numéros)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse complète : nettoyage, fréquences, graphiques, grilles, export
    Analyze {
        /// Fichier CSV des tirages (demandé au lancement si absent)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Fenêtre récente (nombre de tirages)
        #[arg(short, long, default_value = "200")]
        window: usize,

        /// Nombre de grilles à générer
        #[arg(short, long, default_value = "5")]
        tickets: usize,

        /// Seed des grilles historique complet / fenêtre récente
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Seed de la série de grilles
        #[arg(long, default_value = "7")]
        tickets_seed: u64,

        /// Répertoire de sortie des fichiers CSV
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Ne pas afficher les graphiques
        #[arg(long)]
        no_charts: bool,
    },

    /// Nettoyer un fichier de tirages et l'enregistrer
    Clean {
        #[arg(short, long)]
        file: Option<PathBuf>,

        #[arg(short, long, default_value = "powerball_clean.csv")]
        output: PathBuf,
    },

    /// Afficher les fréquences (historique complet ou fenêtre)
    Stats {
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Fenêtre d'analyse (nombre de tirages, tout l'historique si absent)
        #[arg(short, long)]
        window: Option<usize>,

        #[arg(long)]
        no_charts: bool,
    },

    /// Générer des grilles pondérées
    Pick {
        #[arg(short, long)]
        file: Option<PathBuf>,

        #[arg(short, long)]
        window: Option<usize>,

        /// Nombre de grilles
        #[arg(short, long, default_value = "5")]
        count: usize,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    match cli.command {
        Command::Analyze {
            file,
            window,
            tickets,
            seed,
            tickets_seed,
            out_dir,
            no_charts,
        } => cmd_analyze(&config, file, window, tickets, seed, tickets_seed, &out_dir, !no_charts),
        Command::Clean { file, output } => cmd_clean(&config, file, &output),
        Command::Stats { file, window, no_charts } => cmd_stats(&config, file, window, !no_charts),
        Command::Pick { file, window, count, seed } => cmd_pick(&config, file, window, count, seed),
    }
}

fn load_records(config: &GameConfig, file: Option<PathBuf>) -> Result<Vec<DrawRecord>> {
    let path = match file {
        Some(path) => path,
        None => PathBuf::from(prompt("Fichier CSV des tirages : ")?),
    };
    if path.as_os_str().is_empty() {
        bail!("Aucun fichier fourni");
    }

    let (records, report) = import_csv(&path, config)?;
    display_import_summary(&report);

    if records.is_empty() {
        bail!("Aucun tirage exploitable dans {:?}", path);
    }
    Ok(records)
}

#[allow(clippy::too_many_arguments)]
fn cmd_analyze(
    config: &GameConfig,
    file: Option<PathBuf>,
    window: usize,
    n_tickets: usize,
    seed: u64,
    tickets_seed: u64,
    out_dir: &Path,
    charts: bool,
) -> Result<()> {
    let records = load_records(config, file)?;

    println!("\nTirages après nettoyage : {}", records.len());
    display_records(&records[..records.len().min(5)]);

    let (main_full, bonus_full) = windowed_frequency(&records, None, config);
    display_hot_cold(&main_full, 10, "historique complet");
    display_frequency_table(&bonus_full, Pool::Bonus);

    if charts {
        display_frequency_chart(&main_full, Pool::Main);
        display_frequency_chart(&bonus_full, Pool::Bonus);
    }

    let (main_recent, bonus_recent) = windowed_frequency(&records, Some(window), config);
    let recent_title = window_title(Some(window), records.len());
    display_hot(&main_recent, 10, &recent_title);

    let mut picker = WeightedPicker::new(None);

    let full_pick = picker.build_ticket(&main_full, &bonus_full, Some(seed))?;
    display_ticket("Grille pondérée (historique complet)", &full_pick);

    let recent_pick = picker.build_ticket(&main_recent, &bonus_recent, Some(seed))?;
    display_ticket(&format!("Grille pondérée ({})", recent_title), &recent_pick);

    let tickets = picker.generate_tickets(&main_full, &bonus_full, n_tickets, Some(tickets_seed))?;
    display_tickets(&tickets, "historique complet");

    ensure_dir(out_dir)?;
    let paths = SnapshotPaths::in_dir(out_dir);
    write_clean_snapshot(&paths.clean, &records)?;
    write_frequency_table(&paths.freq_main, &main_full)?;
    write_frequency_table(&paths.freq_bonus, &bonus_full)?;
    display_saved(&paths);

    Ok(())
}

fn cmd_clean(config: &GameConfig, file: Option<PathBuf>, output: &Path) -> Result<()> {
    let records = load_records(config, file)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    write_clean_snapshot(output, &records)?;
    println!("\n{} tirages enregistrés dans {}", records.len(), output.display());
    Ok(())
}

fn cmd_stats(config: &GameConfig, file: Option<PathBuf>, window: Option<usize>, charts: bool) -> Result<()> {
    let records = load_records(config, file)?;
    let (main, bonus) = windowed_frequency(&records, window, config);

    let title = window_title(window, records.len());

    display_hot_cold(&main, 10, &title);
    display_frequency_table(&main, Pool::Main);
    display_frequency_table(&bonus, Pool::Bonus);

    if charts {
        display_frequency_chart(&main, Pool::Main);
        display_frequency_chart(&bonus, Pool::Bonus);
    }
    Ok(())
}

fn cmd_pick(
    config: &GameConfig,
    file: Option<PathBuf>,
    window: Option<usize>,
    count: usize,
    seed: Option<u64>,
) -> Result<()> {
    let records = load_records(config, file)?;
    let (main, bonus) = windowed_frequency(&records, window, config);

    let mut picker = WeightedPicker::new(None);
    let tickets = picker.generate_tickets(&main, &bonus, count, seed)?;

    let title = window_title(window, records.len());
    display_tickets(&tickets, &title);
    Ok(())
}

/// Fenêtre effective : bornée par le nombre de tirages disponibles.
fn window_title(window: Option<usize>, n_records: usize) -> String {
    match window {
        Some(n) if n > 0 => format!("{} derniers tirages", n.min(n_records)),
        _ => "historique complet".to_string(),
    }
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    Ok(input.trim().to_string())
}
