//! Plain-text output for the subcommands.

use deeplibby_core::{CatalogEntry, MigrationReport, ScanStatus, ScanSummary};
use deeplibby_model::links::{libby_library_url, libby_media_url};
use deeplibby_model::{
    AvailabilityRow, AvailabilitySnapshot, DiffEntry, HoldingCounts,
    IntersectEntry, Library, SearchResult, UniqueResponse,
};

pub fn search_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }
    for result in results {
        println!("{:>12}  {}", result.id, result.title);
        let creators = result.creator_line();
        if !creators.is_empty() {
            println!("{:>12}  {creators}", "");
        }
        if let Some(series) = result.series_label() {
            println!("{:>12}  {series}", "");
        }
        println!("{:>12}  {} libraries", "", result.library_count);
    }
}

pub fn availability(snapshot: &AvailabilitySnapshot) {
    println!("{} ({})", snapshot.media.title, snapshot.media.id);
    println!(
        "{:<2}{:<28} {:>6} {:>6} {:>6} {:>6}  link",
        "", "library", "owned", "avail", "holds", "wait"
    );
    for row in snapshot.rows_by_priority() {
        availability_row(row, snapshot);
    }
    println!(
        "{} of {} rows refreshed live",
        snapshot.fresh_count(),
        snapshot.rows.len()
    );
}

fn availability_row(row: &AvailabilityRow, snapshot: &AvailabilitySnapshot) {
    let marker = match (row.favorite, row.fresh) {
        (true, true) => "*+",
        (true, false) => "* ",
        (false, true) => " +",
        (false, false) => "  ",
    };
    println!(
        "{marker}{:<28} {:>6} {:>6} {:>6} {:>6}  {}",
        truncate(&row.library.name, 28),
        row.owned_count,
        row.available_count,
        row.holds_count,
        wait_label(row.available_count, row.estimated_wait_days),
        libby_media_url(row.library_id(), &snapshot.media.id),
    );
}

pub fn catalog(entries: &[CatalogEntry]) {
    for entry in entries {
        let marker = if entry.favorite { "*" } else { " " };
        println!(
            "{marker} {:<24} {:<40} {}",
            entry.library.id,
            truncate(&entry.library.name, 40),
            libby_library_url(&entry.library.id)
        );
    }
    println!("{} libraries", entries.len());
}

pub fn libraries(libraries: &[Library]) {
    if libraries.is_empty() {
        println!("No favorite libraries.");
        return;
    }
    for library in libraries {
        println!("{:<24} {}", library.id, library.name);
    }
}

pub fn migration(report: &MigrationReport) {
    if report.skipped {
        println!("Favorites already use library ids; nothing to migrate.");
        return;
    }
    println!("Migrated {} favorites.", report.migrated.len());
    for legacy in &report.unresolved {
        println!("  unresolved legacy id {legacy}");
    }
}

pub fn diff(entries: &[DiffEntry]) {
    for entry in entries {
        holding_line(&entry.media, &entry.holding.counts);
    }
    println!("{} titles", entries.len());
}

pub fn intersect(entries: &[IntersectEntry]) {
    for entry in entries {
        println!("{:>12}  {}", entry.media.id, entry.media.title);
        for side in [&entry.left, &entry.right] {
            println!(
                "{:>12}  {:<28} {}",
                "",
                truncate(&side.library.name, 28),
                counts_label(&side.counts)
            );
        }
    }
    println!("{} titles", entries.len());
}

pub fn unique(response: &UniqueResponse) {
    println!("Only at {}:", response.library.name);
    for entry in &response.unique {
        holding_line(&entry.media, &entry.counts);
    }
    println!("{} titles", response.unique.len());
}

pub fn scan(summaries: &[ScanSummary]) {
    for summary in summaries {
        let status = match summary.status() {
            ScanStatus::AvailableNow { library, copies } => format!(
                "available now at {library} ({copies} copies, {} favorites)",
                summary.available_now()
            ),
            ScanStatus::Waitlist { library, wait_days } => {
                format!("waitlist at {library}, ~{wait_days} days")
            }
            ScanStatus::NotFound => "not found at favorites".to_string(),
        };
        println!("{:<48} {status}", truncate(&summary.media.title, 48));
    }
}

fn holding_line(media: &SearchResult, counts: &HoldingCounts) {
    println!(
        "{:>12}  {:<48} {}",
        media.id,
        truncate(&media.title, 48),
        counts_label(counts)
    );
}

fn counts_label(counts: &HoldingCounts) -> String {
    format!(
        "{}/{} available, {} holds, wait {}",
        counts.available_count,
        counts.owned_count,
        counts.holds_count,
        wait_label(counts.available_count, counts.estimated_wait_days)
    )
}

fn wait_label(available: u32, wait_days: i32) -> String {
    if available > 0 {
        "now".to_string()
    } else if wait_days <= 0 {
        "?".to_string()
    } else {
        format!("{wait_days}d")
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
