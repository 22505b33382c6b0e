use comfy_table::{presets, ContentArrangement, Table};

use crate::db::queries::MovieHit;

const COLUMNS: [&str; 8] = [
    "id",
    "title",
    "vote_average",
    "release_date",
    "runtime",
    "overview",
    "imdb_url",
    "distance",
];

/// Prints hits as one table, mirroring psql-style output.
pub fn print_table(hits: &[MovieHit]) {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(COLUMNS);

    for hit in hits {
        table.add_row(row_values(hit));
    }

    println!("{table}");
}

/// Prints hits one record per block, for terminals too narrow for the table.
pub fn print_vertical(hits: &[MovieHit]) {
    print!("{}", format_vertical(hits));
}

fn format_vertical(hits: &[MovieHit]) -> String {
    let mut out = String::new();
    for (i, hit) in hits.iter().enumerate() {
        out.push_str(&format!("--- Record {} ---\n", i + 1));
        for (column, value) in COLUMNS.iter().zip(row_values(hit)) {
            out.push_str(&format!("{column}: {value}\n"));
        }
        out.push('\n');
    }
    out
}

fn row_values(hit: &MovieHit) -> Vec<String> {
    vec![
        hit.id.to_string(),
        hit.title.clone().unwrap_or_default(),
        hit.vote_average.map(|v| v.to_string()).unwrap_or_default(),
        hit.release_date.map(|d| d.to_string()).unwrap_or_default(),
        hit.runtime.map(|r| r.to_string()).unwrap_or_default(),
        hit.overview.clone().unwrap_or_default(),
        hit.imdb_url.clone(),
        format!("{:.6}", hit.distance),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_hit() -> MovieHit {
        MovieHit {
            id: 27205,
            title: Some("Inception".to_string()),
            vote_average: Some(8.364),
            release_date: NaiveDate::from_ymd_opt(2010, 7, 15),
            runtime: Some(148),
            overview: Some("A thief who steals corporate secrets.".to_string()),
            imdb_url: "https://www.imdb.com/title/tt1375666".to_string(),
            distance: 0.4321,
        }
    }

    #[test]
    fn test_vertical_format() {
        let out = format_vertical(&[sample_hit()]);
        assert!(out.starts_with("--- Record 1 ---\n"));
        assert!(out.contains("title: Inception\n"));
        assert!(out.contains("release_date: 2010-07-15\n"));
        assert!(out.contains("distance: 0.432100\n"));
    }

    #[test]
    fn test_vertical_format_empty() {
        assert_eq!(format_vertical(&[]), "");
    }

    #[test]
    fn test_row_values_handle_nulls() {
        let hit = MovieHit {
            id: 1,
            title: None,
            vote_average: None,
            release_date: None,
            runtime: None,
            overview: None,
            imdb_url: "N/A".to_string(),
            distance: 1.0,
        };
        let values = row_values(&hit);
        assert_eq!(values[1], "");
        assert_eq!(values[6], "N/A");
    }
}
