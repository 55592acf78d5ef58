//! OpenWeatherMap client: current air temperature and 3-hourly forecast.

use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainInfo,
}

#[derive(Debug, Deserialize)]
struct MainInfo {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastItem>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt_txt: String,
    main: MainInfo,
    weather: Vec<WeatherInfo>,
}

#[derive(Debug, Deserialize)]
struct WeatherInfo {
    description: String,
}

/// One forecast line: timestamp text, temperature, sky description.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    pub dt_txt: String,
    pub temp: f64,
    pub description: String,
}

#[derive(Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl WeatherClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    /// Current air temperature in °C, or `None` on any failure.
    pub async fn current_temp(&self, lat: f64, lon: f64) -> Option<f64> {
        let resp = self
            .client
            .get(format!("{}/weather", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".into()),
            ])
            .timeout(crate::FETCH_TIMEOUT)
            .send()
            .await;

        let resp = match resp {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!("Weather API returned {}", r.status());
                return None;
            }
            Err(e) => {
                tracing::warn!("Weather fetch failed: {e}");
                return None;
            }
        };

        match resp.json::<WeatherResponse>().await {
            Ok(body) => Some(body.main.temp),
            Err(e) => {
                tracing::warn!("Unparsable weather payload: {e}");
                None
            }
        }
    }

    /// Up to four upcoming forecast entries, or `None` on any failure.
    pub async fn forecast(&self, lat: f64, lon: f64) -> Option<Vec<ForecastEntry>> {
        let resp = self
            .client
            .get(format!("{}/forecast", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".into()),
            ])
            .timeout(crate::FETCH_TIMEOUT)
            .send()
            .await;

        let resp = match resp {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!("Forecast API returned {}", r.status());
                return None;
            }
            Err(e) => {
                tracing::warn!("Forecast fetch failed: {e}");
                return None;
            }
        };

        match resp.json::<ForecastResponse>().await {
            Ok(body) => Some(collect_entries(body)),
            Err(e) => {
                tracing::warn!("Unparsable forecast payload: {e}");
                None
            }
        }
    }
}

/// First four entries of the forecast list.
fn collect_entries(body: ForecastResponse) -> Vec<ForecastEntry> {
    body.list
        .into_iter()
        .take(4)
        .map(|item| ForecastEntry {
            dt_txt: item.dt_txt,
            temp: item.main.temp,
            description: item
                .weather
                .into_iter()
                .next()
                .map(|w| w.description)
                .unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_payload_parse() {
        let body: WeatherResponse =
            serde_json::from_str(r#"{"main":{"temp":24.3},"name":"Budva"}"#).unwrap();
        assert!((body.main.temp - 24.3).abs() < 1e-9);
    }

    #[test]
    fn test_weather_payload_missing_temp_is_error() {
        let res = serde_json::from_str::<WeatherResponse>(r#"{"main":{}}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_forecast_takes_first_four() {
        let items: Vec<String> = (0..6)
            .map(|i| {
                format!(
                    r#"{{"dt_txt":"2024-07-0{} 12:00:00","main":{{"temp":2{}.0}},"weather":[{{"description":"clear sky"}}]}}"#,
                    i + 1,
                    i
                )
            })
            .collect();
        let json = format!(r#"{{"list":[{}]}}"#, items.join(","));
        let body: ForecastResponse = serde_json::from_str(&json).unwrap();
        let entries = collect_entries(body);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].dt_txt, "2024-07-01 12:00:00");
        assert_eq!(entries[3].description, "clear sky");
        assert!((entries[3].temp - 23.0).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_entry_without_weather_array_entry() {
        let json = r#"{"list":[{"dt_txt":"2024-07-01 12:00:00","main":{"temp":20.0},"weather":[]}]}"#;
        let body: ForecastResponse = serde_json::from_str(json).unwrap();
        let entries = collect_entries(body);
        assert_eq!(entries[0].description, "");
    }

    /// Serves the same canned response to every connection.
    async fn stub_server(response: &'static [u8]) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(response).await;
                });
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_server_error_yields_none() {
        let base_url = stub_server(
            b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let client = WeatherClient {
            client: reqwest::Client::new(),
            api_key: "test-key".into(),
            base_url,
        };
        assert_eq!(client.current_temp(42.28, 18.84).await, None);
        assert_eq!(client.forecast(42.28, 18.84).await, None);
    }
}
