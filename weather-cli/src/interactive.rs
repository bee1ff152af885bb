use anyhow::Result;
use chrono::Local;
use inquire::{InquireError, Select, Text};
use std::fmt;
use weather_core::{Geolocator, WeatherProvider, WidgetController, render::render};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Current,
    Geolocation,
    Forecast,
    Quit,
}

impl Action {
    const ALL: [Action; 4] = [
        Action::Current,
        Action::Geolocation,
        Action::Forecast,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Current => "Показать текущую погоду",
            Action::Geolocation => "Получить текущую геолокацию",
            Action::Forecast => "Показать прогноз на 5 дней",
            Action::Quit => "Выход",
        })
    }
}

fn cancelled(err: &InquireError) -> bool {
    matches!(
        err,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// Menu loop over the widget. Request failures are rendered and the loop keeps going;
/// only a broken terminal ends it with an error.
pub async fn run<P, G>(ctl: &mut WidgetController<P, G>) -> Result<()>
where
    P: WeatherProvider,
    G: Geolocator,
{
    println!("Погода");

    loop {
        let action = match Select::new("Действие:", Action::ALL.to_vec()).prompt() {
            Ok(action) => action,
            Err(e) if cancelled(&e) => break,
            Err(e) => return Err(e.into()),
        };

        match action {
            Action::Current => {
                let city = match Text::new("Введите город")
                    .with_initial_value(ctl.widget().city_input())
                    .prompt()
                {
                    Ok(city) => city,
                    Err(e) if cancelled(&e) => continue,
                    Err(e) => return Err(e.into()),
                };
                ctl.submit_city(city).await;
            }
            Action::Geolocation => ctl.use_geolocation().await,
            Action::Forecast => ctl.show_forecast().await,
            Action::Quit => break,
        }

        println!();
        print!("{}", render(ctl.widget(), ctl.provider().settings(), &Local));
        println!();
    }

    Ok(())
}
