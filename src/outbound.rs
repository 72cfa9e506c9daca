use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
const CATEGORIES_PATH: &str = "/api/categories";
const SMART_SEARCH_PATH: &str = "/api/smart-search";
const CITIES_PATH: &str = "/api/cities-by-llm";

/// An event as returned by the smart-search endpoint.
///
/// The backend fills missing cells with empty strings and may send numbers
/// where text is expected, so every field is optional and read leniently.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct EventRecord {
    #[serde(rename = "EventName", default, deserialize_with = "lenient_text")]
    pub(crate) name: Option<String>,
    #[serde(rename = "Description", default, deserialize_with = "lenient_text")]
    pub(crate) description: Option<String>,
    #[serde(rename = "Category", default, deserialize_with = "lenient_text")]
    pub(crate) category: Option<String>,
    #[serde(rename = "City", default, deserialize_with = "lenient_text")]
    pub(crate) city: Option<String>,
    #[serde(rename = "Link", default, deserialize_with = "lenient_text")]
    pub(crate) link: Option<String>,
    #[serde(rename = "DateTime_start", default, deserialize_with = "lenient_text")]
    pub(crate) start_date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub(crate) lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub(crate) lon: Option<f64>,
}

/// Number of matching events in one city.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct CityAggregate {
    #[serde(rename = "City", default, deserialize_with = "lenient_text")]
    pub(crate) city_name: Option<String>,
    #[serde(rename = "count", default)]
    pub(crate) matching_count: u64,
}

/// The three read endpoints the client depends on.
///
/// `query` is a canonical query string as produced by `query::build`.
#[async_trait]
pub(crate) trait Backend: Send + Sync + 'static {
    async fn categories(&self) -> Result<Vec<String>>;
    async fn smart_search(&self, query: &str) -> Result<Vec<EventRecord>>;
    async fn cities(&self, query: &str) -> Result<Vec<CityAggregate>>;
}

pub(crate) struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub(crate) fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().user_agent(APP_USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, path: &str, query: Option<&str>) -> RequestBuilder {
        let url = match query {
            Some(query) => format!("{}{path}?{query}", self.base_url),
            None => format!("{}{path}", self.base_url),
        };
        debug!("GET {url}");
        self.client.get(url)
    }

    async fn send_request<T>(&self, path: &str, query: Option<&str>) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let resp = self
            .request(path, query)
            .send()
            .await
            .with_context(|| format!("Problem while requesting {path}"))?
            .error_for_status()?;
        let body: Option<Vec<T>> = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse response of {path}"))?;
        Ok(body.unwrap_or_default())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn categories(&self) -> Result<Vec<String>> {
        self.send_request(CATEGORIES_PATH, None).await
    }

    async fn smart_search(&self, query: &str) -> Result<Vec<EventRecord>> {
        self.send_request(SMART_SEARCH_PATH, Some(query)).await
    }

    async fn cities(&self, query: &str) -> Result<Vec<CityAggregate>> {
        self.send_request(CITIES_PATH, Some(query)).await
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return Ok(None),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let coordinate = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(coordinate.filter(|c| c.is_finite()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use warp::{http::StatusCode, Filter};

    use super::*;

    async fn serve() -> String {
        let categories = warp::path!("api" / "categories")
            .map(|| warp::reply::json(&json!(["Danse", "Théâtre"])));
        let search = warp::path!("api" / "smart-search")
            .and(warp::query::raw())
            .map(|query: String| {
                warp::reply::json(&json!([{ "EventName": query, "City": "Lyon", "lat": 45.76, "lon": 4.83 }]))
            });
        let cities = warp::path!("api" / "cities-by-llm")
            .map(|| warp::reply::with_status(warp::reply(), StatusCode::INTERNAL_SERVER_ERROR));
        let routes = categories.or(search).or(cities);
        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn fetches_categories() {
        let backend = HttpBackend::new(&serve().await).unwrap();
        assert_eq!(backend.categories().await.unwrap(), ["Danse", "Théâtre"]);
    }

    #[tokio::test]
    async fn sends_query_string_verbatim() {
        let backend = HttpBackend::new(&serve().await).unwrap();
        let query = "interests=danse:3,theatre:2&q=jazz&city=Saint-%C3%89tienne";
        let events = backend.smart_search(query).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name.as_deref(), Some(query));
        assert_eq!(events[0].city.as_deref(), Some("Lyon"));
        assert_eq!(events[0].lat, Some(45.76));
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let backend = HttpBackend::new(&serve().await).unwrap();
        assert!(backend.cities("q=").await.is_err());
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_error() {
        let backend = HttpBackend::new("http://127.0.0.1:1").unwrap();
        assert!(backend.categories().await.is_err());
    }

    #[test]
    fn tolerates_malformed_records() {
        let record: EventRecord = serde_json::from_value(json!({
            "EventName": "",
            "Description": 42,
            "City": "  Nantes ",
            "DateTime_start": null,
            "lat": "",
            "lon": "1.55"
        }))
        .unwrap();
        assert_eq!(record.name, None);
        assert_eq!(record.description.as_deref(), Some("42"));
        assert_eq!(record.city.as_deref(), Some("Nantes"));
        assert_eq!(record.start_date_time, None);
        assert_eq!(record.lat, None);
        assert_eq!(record.lon, Some(1.55));
        assert_eq!(record.link, None);
    }

    #[test]
    fn reads_city_aggregates() {
        let cities: Vec<CityAggregate> =
            serde_json::from_value(json!([{ "City": "Paris", "count": 12 }, { "count": 3 }])).unwrap();
        assert_eq!(cities[0].city_name.as_deref(), Some("Paris"));
        assert_eq!(cities[0].matching_count, 12);
        assert_eq!(cities[1].city_name, None);
    }
}
