use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

use crate::{
    model::{Forecast, Source, WeatherSnapshot},
    request::{ApiSettings, icon_url},
    widget::{ViewState, WeatherWidget},
};

const HPA_TO_MMHG: f64 = 0.750_062;

pub fn hpa_to_mmhg(hpa: u32) -> i64 {
    (f64::from(hpa) * HPA_TO_MMHG).round() as i64
}

// Halves round up, toward +inf: -2.5 becomes -2 and -0.5 becomes 0.
fn whole_degrees(celsius: f64) -> i64 {
    (celsius + 0.5).floor() as i64
}

fn format_time<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    ts.with_timezone(tz).format("%H:%M").to_string()
}

fn format_date<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    ts.with_timezone(tz).format("%d.%m.%Y").to_string()
}

/// Render the widget as text, with times and dates shown in `tz`.
///
/// The geolocation banner is independent of the main block and prints above it.
pub fn render<Tz: TimeZone>(widget: &WeatherWidget, settings: &ApiSettings, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let mut lines = Vec::new();

    if let Some(geo) = widget.geo_error() {
        lines.push(format!("[!] {geo}"));
    }

    match widget.view() {
        ViewState::Idle | ViewState::GeolocationError(_) => {}
        ViewState::Loading => lines.push("Загрузка...".to_string()),
        ViewState::Error(msg) => lines.push(format!("Ошибка: {msg}")),
        ViewState::Current(snapshot, source) => {
            lines.extend(current_lines(snapshot, source, settings, tz));
        }
        ViewState::Forecast(forecast, source) => {
            lines.extend(forecast_lines(forecast, source, settings, tz));
        }
    }

    lines.into_iter().map(|line| line + "\n").collect()
}

fn current_lines<Tz: TimeZone>(
    s: &WeatherSnapshot,
    source: Source,
    settings: &ApiSettings,
    tz: &Tz,
) -> Vec<String>
where
    Tz::Offset: Display,
{
    vec![
        format!("== {} ==", s.location_name),
        format!("Ответ получен {source}"),
        format!("{} ({})", icon_url(settings, &s.icon), s.description),
        format!("{}°C", whole_degrees(s.temperature_c)),
        s.description.clone(),
        format!("Влажность: {}%", s.humidity_pct),
        // The provider reports hPa; the label is mmHg, so the value is converted.
        format!("Давление: {} мм рт. ст.", hpa_to_mmhg(s.pressure_hpa)),
        format!("Ветер: {} м/с", s.wind_speed_mps),
        format!("Восход: {}", format_time(&s.sunrise, tz)),
        format!("Закат: {}", format_time(&s.sunset, tz)),
    ]
}

fn forecast_lines<Tz: TimeZone>(
    f: &Forecast,
    source: Source,
    settings: &ApiSettings,
    tz: &Tz,
) -> Vec<String>
where
    Tz::Offset: Display,
{
    let mut lines = vec![
        format!("== Прогноз на 5 дней для {} ==", f.city_name),
        format!("Ответ получен {source}"),
    ];

    for day in &f.days {
        lines.extend([
            String::new(),
            format_date(&day.time, tz),
            format!("  {} ({})", icon_url(settings, &day.icon), day.description),
            format!("  {}°C", whole_degrees(day.temperature_c)),
            format!("  {}", day.description),
        ]);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geolocation::GeolocationError,
        model::{Coordinates, ForecastEntry},
        provider::FetchError,
    };
    use chrono::FixedOffset;

    fn settings() -> ApiSettings {
        ApiSettings {
            base_url: "https://api.openweathermap.org".into(),
            icon_base_url: "https://openweathermap.org".into(),
            api_key: "KEY".into(),
            units: "metric".into(),
            lang: "ru".into(),
        }
    }

    fn at(ts: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(ts, 0).unwrap()
    }

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            location_name: "Paris".into(),
            temperature_c: 21.6,
            humidity_pct: 40,
            pressure_hpa: 1013,
            wind_speed_mps: 3.5,
            // 2024-01-01 05:30 and 16:45 UTC
            sunrise: at(1_704_087_000),
            sunset: at(1_704_127_500),
            description: "ясно".into(),
            icon: "01d".into(),
        }
    }

    #[test]
    fn pressure_conversion() {
        assert_eq!(hpa_to_mmhg(1013), 760);
        assert_eq!(hpa_to_mmhg(1000), 750);
    }

    #[test]
    fn idle_renders_nothing() {
        assert_eq!(render(&WeatherWidget::new(), &settings(), &Utc), "");
    }

    #[test]
    fn loading_indicator() {
        let mut w = WeatherWidget::new();
        w.submit_city();
        assert_eq!(render(&w, &settings(), &Utc), "Загрузка...\n");
    }

    #[test]
    fn error_block_shows_upstream_text() {
        let mut w = WeatherWidget::new();
        let t = w.submit_city();
        w.apply_current(
            &t,
            Err(FetchError::from_response(404, r#"{"message":"city not found"}"#)),
        );

        assert_eq!(render(&w, &settings(), &Utc), "Ошибка: city not found\n");
    }

    #[test]
    fn current_block() {
        let mut w = WeatherWidget::new();
        w.set_city_input("Paris");
        let t = w.submit_city();
        w.apply_current(&t, Ok(snapshot()));

        let msk = FixedOffset::east_opt(3 * 3600).unwrap();
        let text = render(&w, &settings(), &msk);

        assert!(text.starts_with("== Paris ==\nОтвет получен вручную\n"));
        assert!(text.contains("https://openweathermap.org/img/wn/01d@2x.png"));
        assert!(text.contains("22°C"));
        assert!(text.contains("Влажность: 40%"));
        assert!(text.contains("Давление: 760 мм рт. ст."));
        assert!(text.contains("Ветер: 3.5 м/с"));
        assert!(text.contains("Восход: 08:30"));
        assert!(text.contains("Закат: 19:45"));
    }

    #[test]
    fn forecast_block_has_one_card_per_day() {
        let mut w = WeatherWidget::new();
        let t = w
            .apply_geolocation(Ok(Coordinates::new(48.85, 2.35)))
            .unwrap();
        w.apply_current(&t, Ok(snapshot()));

        let day = |ts: i64, temp: f64| ForecastEntry {
            time: at(ts),
            temperature_c: temp,
            humidity_pct: 50,
            pressure_hpa: 1000,
            wind_speed_mps: 1.0,
            description: "дождь".into(),
            icon: "10d".into(),
        };
        let t = w.request_forecast();
        w.apply_forecast(
            &t,
            Ok(Forecast {
                city_name: "Paris".into(),
                days: vec![day(1_704_103_200, -0.4), day(1_704_189_600, 3.5)],
            }),
        );

        let text = render(&w, &settings(), &Utc);
        assert!(text.starts_with("== Прогноз на 5 дней для Paris ==\nОтвет получен по геопозиции\n"));
        assert!(text.contains("01.01.2024"));
        assert!(text.contains("02.01.2024"));
        assert!(text.contains("  0°C"));
        assert!(!text.contains("-0°C"));
        assert!(text.contains("  4°C"));
        assert!(!text.contains("Влажность"));
    }

    #[test]
    fn halves_round_toward_positive_infinity() {
        assert_eq!(whole_degrees(2.5), 3);
        assert_eq!(whole_degrees(-2.5), -2);
        assert_eq!(whole_degrees(-0.5), 0);
        assert_eq!(whole_degrees(-0.6), -1);
        assert_eq!(whole_degrees(21.4), 21);
    }

    #[test]
    fn geo_banner_sits_above_results() {
        let mut w = WeatherWidget::new();
        let t = w.submit_city();
        w.apply_current(&t, Ok(snapshot()));
        w.apply_geolocation(Err(GeolocationError::PermissionDenied));

        let text = render(&w, &settings(), &Utc);
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("[!] Невозможно получить доступ к геолокации. Введите город вручную.")
        );
        assert_eq!(lines.next(), Some("== Paris =="));
    }
}
