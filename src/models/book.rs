use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A book record as exchanged with `/api/books`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Assigned by the server; absent on create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: u32,
    pub isbn: Option<String>,
    #[serde(default, deserialize_with = "date_or_datetime")]
    pub published_date: Option<NaiveDate>,
    pub publisher: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl Book {
    /// Client-side checks matching the server's bean validation, so obviously
    /// bad input fails before a round trip.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be blank".to_string());
        }
        if self.author.trim().is_empty() {
            return Err("author must not be blank".to_string());
        }
        if !(self.price.is_finite() && self.price > 0.0) {
            return Err(format!("price must be positive, got {}", self.price));
        }
        Ok(())
    }
}

/// Accepts `YYYY-MM-DD` as well as a full ISO timestamp, keeping only the date.
fn date_or_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => {
            let date_part = s.split('T').next().unwrap_or(s);
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .map(Some)
                .map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Book {
        Book {
            id: None,
            title: "Leaves of Grass".to_string(),
            author: "Walt Whitman".to_string(),
            description: None,
            price: 12.5,
            quantity: 3,
            isbn: Some("978-0-00-000000-0".to_string()),
            published_date: NaiveDate::from_ymd_opt(1855, 7, 4),
            publisher: None,
            category: Some("Poetry".to_string()),
            image_url: None,
        }
    }

    #[test]
    fn test_book_wire_format() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["publishedDate"], "1855-07-04");
        assert_eq!(json["imageUrl"], serde_json::Value::Null);
        assert!(json.get("id").is_none(), "id is omitted on create");
    }

    #[test]
    fn test_book_accepts_timestamp_dates() {
        let book: Book = serde_json::from_value(json!({
            "id": "65f0c0ffee",
            "title": "Ariel",
            "author": "Sylvia Plath",
            "price": 9.99,
            "quantity": 0,
            "publishedDate": "1965-03-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(book.id.as_deref(), Some("65f0c0ffee"));
        assert_eq!(book.published_date, NaiveDate::from_ymd_opt(1965, 3, 1));
        assert!(book.description.is_none());
    }

    #[test]
    fn test_book_validation() {
        assert!(sample().validate().is_ok());
        let mut blank = sample();
        blank.title = "  ".to_string();
        assert!(blank.validate().is_err());
        let mut free = sample();
        free.price = 0.0;
        assert!(free.validate().is_err());
    }
}
