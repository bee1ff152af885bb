use reqwest::Url;

use crate::{
    model::{LocationSelector, RequestMode},
    provider::FetchError,
};

/// Everything needed to address the provider, resolved from [`crate::Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub icon_base_url: String,
    pub api_key: String,
    pub units: String,
    pub lang: String,
}

/// Build the GET URL for a current-weather or forecast request.
///
/// The city name is passed through untouched: an empty or malformed name still
/// produces a request and the provider's own error comes back.
pub fn build_url(
    settings: &ApiSettings,
    selector: &LocationSelector,
    mode: RequestMode,
) -> Result<Url, FetchError> {
    let raw = format!("{}/data/2.5/{}", settings.base_url, mode.endpoint());
    let mut url = Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;

    {
        let mut pairs = url.query_pairs_mut();
        match selector {
            LocationSelector::City(name) => {
                pairs.append_pair("q", name);
            }
            LocationSelector::Coordinates(c) => {
                pairs.append_pair("lat", &c.latitude.to_string());
                pairs.append_pair("lon", &c.longitude.to_string());
            }
        }
        pairs
            .append_pair("units", &settings.units)
            .append_pair("appid", &settings.api_key)
            .append_pair("lang", &settings.lang);
    }

    Ok(url)
}

pub fn icon_url(settings: &ApiSettings, icon: &str) -> String {
    format!("{}/img/wn/{icon}@2x.png", settings.icon_base_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinates;

    fn settings() -> ApiSettings {
        ApiSettings {
            base_url: "https://api.openweathermap.org".into(),
            icon_base_url: "https://openweathermap.org".into(),
            api_key: "KEY".into(),
            units: "metric".into(),
            lang: "ru".into(),
        }
    }

    fn param_names(url: &Url) -> Vec<String> {
        url.query_pairs().map(|(k, _)| k.into_owned()).collect()
    }

    #[test]
    fn city_uses_q_and_omits_coordinates() {
        let url = build_url(
            &settings(),
            &LocationSelector::City("Paris".into()),
            RequestMode::Current,
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.openweathermap.org/data/2.5/weather?q=Paris&units=metric&appid=KEY&lang=ru"
        );
        let names = param_names(&url);
        assert!(!names.contains(&"lat".to_string()));
        assert!(!names.contains(&"lon".to_string()));
    }

    #[test]
    fn coordinates_use_lat_lon_and_omit_q() {
        let url = build_url(
            &settings(),
            &LocationSelector::Coordinates(Coordinates::new(55.75, 37.62)),
            RequestMode::Forecast,
        )
        .unwrap();

        assert_eq!(url.path(), "/data/2.5/forecast");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("lat".to_string(), "55.75".to_string()));
        assert_eq!(pairs[1], ("lon".to_string(), "37.62".to_string()));
        assert!(!param_names(&url).contains(&"q".to_string()));
    }

    #[test]
    fn empty_city_is_passed_through() {
        let url = build_url(
            &settings(),
            &LocationSelector::City(String::new()),
            RequestMode::Current,
        )
        .unwrap();

        assert!(url.as_str().contains("?q=&units=metric"));
    }

    #[test]
    fn city_with_spaces_and_cyrillic_is_encoded() {
        let url = build_url(
            &settings(),
            &LocationSelector::City("Нижний Новгород".into()),
            RequestMode::Current,
        )
        .unwrap();

        let q = url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned());
        assert_eq!(q.as_deref(), Some("Нижний Новгород"));
    }

    #[test]
    fn bad_base_url_is_reported() {
        let mut s = settings();
        s.base_url = "not a url".into();

        let err = build_url(&s, &LocationSelector::City("x".into()), RequestMode::Current)
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[test]
    fn icon_url_shape() {
        assert_eq!(
            icon_url(&settings(), "10d"),
            "https://openweathermap.org/img/wn/10d@2x.png"
        );
    }
}
