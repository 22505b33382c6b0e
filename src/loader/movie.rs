use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// One row of the TMDB movie dataset CSV.
///
/// Field names match the CSV header. Numeric and date columns are optional
/// because the export leaves them blank for obscure titles; `adult` uses
/// the dataset's `True`/`False` spelling.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieRecord {
    pub id: i64,
    pub title: String,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub status: String,
    #[serde(deserialize_with = "opt_date")]
    pub release_date: Option<NaiveDate>,
    pub revenue: Option<i64>,
    pub runtime: Option<i32>,
    #[serde(deserialize_with = "loose_bool")]
    pub adult: bool,
    pub backdrop_path: String,
    pub budget: Option<i64>,
    pub homepage: String,
    pub imdb_id: String,
    pub original_language: String,
    pub original_title: String,
    pub overview: String,
    pub popularity: Option<f64>,
    pub poster_path: String,
    pub tagline: String,
    pub genres: String,
    pub production_companies: String,
    pub production_countries: String,
    pub spoken_languages: String,
    pub keywords: String,
}

fn opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(Some)
        .map_err(serde::de::Error::custom)
}

fn loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "not a boolean: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,title,vote_average,vote_count,status,release_date,revenue,runtime,\
adult,backdrop_path,budget,homepage,imdb_id,original_language,original_title,overview,popularity,\
poster_path,tagline,genres,production_companies,production_countries,spoken_languages,keywords";

    fn parse_one(row: &str) -> Result<MovieRecord, csv::Error> {
        let data = format!("{HEADER}\n{row}");
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        reader.deserialize().next().unwrap()
    }

    #[test]
    fn test_parse_full_row() {
        let movie = parse_one(
            "27205,Inception,8.364,34495,Released,2010-07-15,825532764,148,False,/bg.jpg,\
160000000,https://example.com,tt1375666,en,Inception,\"Cobb, a skilled thief.\",83.952,\
/poster.jpg,Your mind is the scene of the crime.,\"Action, Science Fiction\",\
Legendary Pictures,United Kingdom,English,\"rescue, dream\"",
        )
        .unwrap();

        assert_eq!(movie.id, 27205);
        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.vote_average, Some(8.364));
        assert_eq!(
            movie.release_date,
            Some(NaiveDate::from_ymd_opt(2010, 7, 15).unwrap())
        );
        assert_eq!(movie.runtime, Some(148));
        assert!(!movie.adult);
        assert_eq!(movie.overview, "Cobb, a skilled thief.");
    }

    #[test]
    fn test_parse_sparse_row() {
        let movie =
            parse_one("99,Obscure Title,,,Rumored,,,,True,,,,,xx,Obscure Title,,,,,,,,,").unwrap();

        assert_eq!(movie.id, 99);
        assert_eq!(movie.vote_average, None);
        assert_eq!(movie.vote_count, None);
        assert_eq!(movie.release_date, None);
        assert_eq!(movie.runtime, None);
        assert!(movie.adult);
        assert_eq!(movie.overview, "");
    }

    #[test]
    fn test_bad_id_is_an_error() {
        assert!(parse_one("abc,T,,,S,,,,False,,,,,en,T,,,,,,,,,").is_err());
    }
}
