use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};
use textplots::{Chart, Plot, Shape};

use crate::import::ImportReport;
use powerpick_data::models::{DrawRecord, FrequencyTable, Pool, SamplingStatus, Ticket};
use powerpick_data::snapshot::SnapshotPaths;

fn format_main(main: &[u8]) -> String {
    main.iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn display_import_summary(report: &ImportReport) {
    println!("Import terminé :");
    println!("  Total lignes lues   : {}", report.total_rows);
    println!("  Conservées          : {}", report.kept);
    if report.dropped_missing > 0 {
        println!("  Champs manquants    : {}", report.dropped_missing);
    }
    if report.dropped_invalid > 0 {
        println!("  Hors domaine/doubles: {}", report.dropped_invalid);
    }
}

pub fn display_records(records: &[DrawRecord]) {
    if records.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Date", "Numéros", "Powerball"]);
    for record in records {
        let mut sorted = record.main;
        sorted.sort();
        table.add_row(vec![
            record.date.format("%Y-%m-%d").to_string(),
            format_main(&sorted),
            format!("{:2}", record.bonus),
        ]);
    }
    println!("{table}");
}

fn display_counts(entries: &[(u8, u32)], scale_max: u32) {
    let mut table = new_table(vec!["Numéro", "Fréquence", ""]);
    let scale = if scale_max > 0 { 30.0 / scale_max as f64 } else { 0.0 };

    for &(number, count) in entries {
        let bar = "█".repeat((count as f64 * scale).round() as usize);
        table.add_row(vec![format!("{:2}", number), count.to_string(), bar]);
    }
    println!("{table}");
}

pub fn display_hot_cold(table: &FrequencyTable, top: usize, title: &str) {
    let scale_max = table.hottest(1).first().map(|&(_, c)| c).unwrap_or(0);

    println!("\n🔥 Top {} numéros chauds ({})\n", top, title);
    display_counts(&table.hottest(top), scale_max);

    println!("\n❄ Top {} numéros froids ({})\n", top, title);
    display_counts(&table.coldest(top), scale_max);
}

pub fn display_hot(table: &FrequencyTable, top: usize, title: &str) {
    let scale_max = table.hottest(1).first().map(|&(_, c)| c).unwrap_or(0);
    println!("\n🔥 Top {} numéros chauds ({})\n", top, title);
    display_counts(&table.hottest(top), scale_max);
}

/// Table complète, par numéro croissant.
pub fn display_frequency_table(table: &FrequencyTable, pool: Pool) {
    println!("\n── Fréquences {} (1-{}) ──", pool.label(), table.max());
    let entries: Vec<(u8, u32)> = table.entries().collect();
    let scale_max = entries.iter().map(|&(_, c)| c).max().unwrap_or(0);
    display_counts(&entries, scale_max);
}

pub fn display_frequency_chart(table: &FrequencyTable, pool: Pool) {
    println!("\n== Fréquence : {} ==\n", pool.label());

    if table.total() == 0 {
        println!("  (Pas de données à afficher)");
        return;
    }

    let points: Vec<(f32, f32)> = table
        .entries()
        .map(|(n, c)| (n as f32, c as f32))
        .collect();
    let y_max = table.hottest(1).first().map(|&(_, c)| c).unwrap_or(1) as f32;

    let shape = Shape::Bars(&points);
    Chart::new_with_y_range(120, 40, 0.0, table.max() as f32 + 1.0, 0.0, y_max)
        .lineplot(&shape)
        .display();
    println!("  x : numéro, y : nombre d'occurrences");
}

pub fn display_ticket(label: &str, ticket: &Ticket) {
    println!("\n{} :", label);
    println!("  Numéros : {} | Powerball : {:2}", format_main(&ticket.main), ticket.bonus);
    if ticket.is_fallback() {
        println!("  (poids insuffisants : tirage uniforme)");
    }
}

fn status_cell(status: SamplingStatus) -> Cell {
    let color = match status {
        SamplingStatus::Weighted => Color::White,
        SamplingStatus::UniformFallback => Color::Yellow,
    };
    Cell::new(status.to_string()).fg(color)
}

pub fn display_tickets(tickets: &[Ticket], title: &str) {
    println!("\n🎲 {} grilles ({})\n", tickets.len(), title);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Numéros", "Powerball", "Tirage"]);

    for (i, ticket) in tickets.iter().enumerate() {
        let status = if ticket.is_fallback() {
            SamplingStatus::UniformFallback
        } else {
            SamplingStatus::Weighted
        };
        table.add_row(vec![
            Cell::new(format!("{:>2}", i + 1)),
            Cell::new(format_main(&ticket.main)),
            Cell::new(format!("{:2}", ticket.bonus)),
            status_cell(status),
        ]);
    }
    println!("{table}");
}

pub fn display_saved(paths: &SnapshotPaths) {
    println!(
        "\nFichiers enregistrés : {}, {}, {}",
        paths.clean.display(),
        paths.freq_main.display(),
        paths.freq_bonus.display()
    );
}
