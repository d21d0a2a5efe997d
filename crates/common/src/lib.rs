use clap::Parser;
use database::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:finance.db")]
    pub database_url: String,

    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// How many of the most recent months the monthly chart shows.
    #[arg(long, env = "CHART_MONTHS", default_value = "6", value_parser = clap::value_parser!(u16).range(1..))]
    pub chart_months: u16,
}

impl Config {
    pub fn chart_window(&self) -> usize {
        usize::from(self.chart_months)
    }
}
