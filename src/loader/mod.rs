//! Bulk-load support: turning scraped Python-literal records into catalog
//! rows.

use chrono::NaiveDate;

use crate::models::NewMovie;

pub mod pyliteral;

use pyliteral::PyValue;

/// Parses a scraper date field.
///
/// Accepts `YYYY-MM-DD` (or with slashes), tolerates longer timestamps by
/// truncating to the date part, and maps a bare year to January 1st.
/// Unparseable input becomes `None` rather than an error.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let normalized = value.trim().replace('/', "-");
    if normalized.is_empty() {
        return None;
    }

    if normalized.len() == 4 {
        let year: i32 = normalized.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    let prefix = normalized.get(..10).unwrap_or(&normalized);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn joined_list(record: &PyValue, key: &str) -> Option<String> {
    let items: Vec<&str> = record
        .get(key)?
        .as_list()?
        .iter()
        .filter_map(PyValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if items.is_empty() {
        None
    } else {
        // Joined with a delimiter the token splitter understands.
        Some(items.join(","))
    }
}

fn string_field(record: &PyValue, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(PyValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Maps one scraped record dict to a catalog row.
///
/// The score comes from the `score` key when present, else the first element
/// of the `rating` list. Returns `None` for records without a title.
pub fn movie_from_record(record: &PyValue) -> Option<NewMovie> {
    let title = string_field(record, "title")?;

    let score = record
        .get("score")
        .and_then(PyValue::as_f64)
        .or_else(|| {
            record
                .get("rating")?
                .as_list()?
                .first()?
                .as_f64()
        });

    let date = record
        .get("release_date")
        .and_then(PyValue::as_str)
        .and_then(parse_date);

    Some(NewMovie {
        title,
        score,
        date,
        poster: string_field(record, "cover_url"),
        actors: joined_list(record, "actors"),
        region: joined_list(record, "regions"),
        category: joined_list(record, "types"),
        summary: string_field(record, "summary"),
    })
}

/// Parses one export line into its record dicts.
///
/// Each line is a Python-literal list of dicts; a bare dict is tolerated.
/// Anything else yields an empty vec.
pub fn records_from_line(line: &str) -> Vec<PyValue> {
    let Some(parsed) = pyliteral::parse(line) else {
        return Vec::new();
    };

    match parsed {
        PyValue::Dict(_) => vec![parsed],
        PyValue::List(items) => items
            .into_iter()
            .filter(|item| matches!(item, PyValue::Dict(_)))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_iso() {
        assert_eq!(parse_date("2022-05-20"), NaiveDate::from_ymd_opt(2022, 5, 20));
    }

    #[test]
    fn test_parse_date_slashes() {
        assert_eq!(parse_date("2022/05/20"), NaiveDate::from_ymd_opt(2022, 5, 20));
    }

    #[test]
    fn test_parse_date_bare_year() {
        assert_eq!(parse_date("1994"), NaiveDate::from_ymd_opt(1994, 1, 1));
    }

    #[test]
    fn test_parse_date_truncates_timestamps() {
        assert_eq!(
            parse_date("2022-05-20T00:00:00"),
            NaiveDate::from_ymd_opt(2022, 5, 20)
        );
    }

    #[test]
    fn test_parse_date_invalid() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("soon"), None);
        assert_eq!(parse_date("2022-13-40"), None);
    }

    #[test]
    fn test_movie_from_record_full() {
        let record = pyliteral::parse(
            "{'title': '让子弹飞', 'score': '8.9', 'release_date': '2010-12-16', \
             'cover_url': 'https://img.example/p.jpg', 'actors': ['姜文', '葛优'], \
             'regions': ['中国大陆'], 'types': ['剧情', '喜剧'], 'summary': '...'}",
        )
        .unwrap();

        let movie = movie_from_record(&record).unwrap();
        assert_eq!(movie.title, "让子弹飞");
        assert_eq!(movie.score, Some(8.9));
        assert_eq!(movie.date, NaiveDate::from_ymd_opt(2010, 12, 16));
        assert_eq!(movie.actors.as_deref(), Some("姜文,葛优"));
        assert_eq!(movie.category.as_deref(), Some("剧情,喜剧"));
    }

    #[test]
    fn test_movie_from_record_score_from_rating_list() {
        let record = pyliteral::parse("{'title': 'A', 'rating': ['8.7', '40']}").unwrap();
        let movie = movie_from_record(&record).unwrap();
        assert_eq!(movie.score, Some(8.7));
    }

    #[test]
    fn test_movie_from_record_requires_title() {
        let record = pyliteral::parse("{'score': '8.7'}").unwrap();
        assert!(movie_from_record(&record).is_none());
    }

    #[test]
    fn test_records_from_line_list_of_dicts() {
        let records = records_from_line("[{'title': 'A'}, {'title': 'B'}]");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_records_from_line_bare_dict() {
        let records = records_from_line("{'title': 'A'}");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_records_from_line_garbage() {
        assert!(records_from_line("not python at all {").is_empty());
        assert!(records_from_line("'just a string'").is_empty());
    }

    #[test]
    fn test_records_from_line_filters_non_dict_items() {
        let records = records_from_line("[{'title': 'A'}, 'stray', 3]");
        assert_eq!(records.len(), 1);
    }
}
