use anyhow::{Context, anyhow, ensure};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Confirm, CustomType, Password, Text};
use std::sync::Arc;

use skyfeed_core::{
    Config, Location, ProviderId, TrendSeries, WeatherEffectiveness, WeatherProvider,
    WeatherRecord,
    present::{detailed_label, filtered, mini_label, select, time_label},
    provider::default_provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyfeed", version, about = "Weather for small displays")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials and location for a specific provider.
    Configure {
        /// Provider short name, e.g. "caiyun".
        provider: String,
    },

    /// Show the weather at the configured location.
    Show {
        /// Which bucket to show.
        #[arg(long, value_enum, default_value_t = Effect::Current)]
        effect: Effect,

        /// List every matching record instead of the first one.
        #[arg(long)]
        all: bool,
    },

    /// Print one metric over time, as a chart would plot it.
    Trend {
        metric: Metric,

        #[arg(long, value_enum, default_value_t = Effect::Hourly)]
        effect: Effect,

        /// Number of records to label along the time axis.
        #[arg(long, default_value_t = 4)]
        samples: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Effect {
    Current,
    Hourly,
    Daily,
    Any,
}

impl From<Effect> for WeatherEffectiveness {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Current => WeatherEffectiveness::Current,
            Effect::Hourly => WeatherEffectiveness::Hourly,
            Effect::Daily => WeatherEffectiveness::Daily,
            Effect::Any => WeatherEffectiveness::Any,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Metric {
    Temperature,
    Humidity,
    Pressure,
}

impl Metric {
    fn extractor(self) -> fn(&WeatherRecord) -> f64 {
        match self {
            Metric::Temperature => WeatherRecord::temperature,
            Metric::Humidity => WeatherRecord::humidity,
            Metric::Pressure => WeatherRecord::pressure,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show { effect, all } => show(effect.into(), all).await,
            Command::Trend {
                metric,
                effect,
                samples,
            } => trend(metric, effect.into(), samples).await,
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    ensure!(!api_key.trim().is_empty(), "API key must not be empty");
    config.upsert_provider_api_key(id, api_key.trim().to_string());

    let ask_location = Confirm::new("Set the weather location now?")
        .with_default(config.location().is_none())
        .prompt()
        .context("Failed to read answer")?;

    if ask_location {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number, e.g. 31.23")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number, e.g. 121.47")
            .prompt()
            .context("Failed to read longitude")?;
        ensure!(
            (-90.0..=90.0).contains(&latitude),
            "Latitude must be within [-90, 90]"
        );
        ensure!(
            (-180.0..=180.0).contains(&longitude),
            "Longitude must be within [-180, 180]"
        );

        let name = Text::new("Place name (optional):")
            .prompt()
            .context("Failed to read name")?;
        let location = match name.trim() {
            "" => Location::new(latitude, longitude),
            name => Location::named(latitude, longitude, name),
        };
        config.set_location(location);
    }

    config.save()?;
    println!(
        "Saved configuration for {id} to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn show(effect: WeatherEffectiveness, all: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let provider = default_provider_from_config(&config)?;
    let unit = provider.temperature_unit();

    let records = provider
        .get_weather()
        .await
        .context("Failed to fetch weather")?;
    tracing::debug!(records = records.len(), "Fetched weather for {}", provider.location());
    println!("{}", provider.location());

    if all {
        for record in filtered(&records, effect) {
            println!(
                "{:<8} {}  {:<14} {:>6} {}  {:>3} %",
                record.effect(),
                record.time().format("%a %H:%M"),
                record.day().display_name(),
                record.temperature(),
                unit.symbol(),
                (record.humidity() * 100.0).round(),
            );
        }
        return Ok(());
    }

    let record = select(&records, effect)
        .ok_or_else(|| anyhow!("No {effect} weather in the response"))?;
    println!(
        "{} ({})",
        record.day().display_name(),
        record.day().icon_name()
    );
    println!("{}", detailed_label(record, unit));
    Ok(())
}

async fn trend(metric: Metric, effect: WeatherEffectiveness, samples: usize) -> anyhow::Result<()> {
    let config = Config::load()?;
    let provider: Arc<dyn WeatherProvider> = Arc::from(default_provider_from_config(&config)?);
    let unit = provider.temperature_unit();

    let mut series = TrendSeries::new(provider, effect, metric.extractor());
    series.refresh().await.context("Failed to fetch weather")?;

    let Some(sample) = series.axis_sample() else {
        println!("No {effect} weather in the response");
        return Ok(());
    };
    println!(
        "{}  {}",
        time_label(sample.time()),
        mini_label(sample, unit).replace('\n', ", ")
    );

    for (offset, value) in series.points(Local::now().fixed_offset()) {
        println!("{offset:>+4}h  {value}");
    }

    let axis: Vec<_> = series
        .axis_samples(samples)
        .into_iter()
        .map(|record| format!("{} {}", time_label(record.time()), record.day().icon_name()))
        .collect();
    println!("{}", axis.join(" | "));

    Ok(())
}
