//! cubejs CLI
//!
//! Command-line interface for the Cube.js REST API:
//! - Run load queries
//! - Print the serialized form of a query
//! - Print the current API token

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use cubejs_client::{
    Config, Cube, CubeClient, DateRange, Filter, FilterOperator, Granularity, Member, Order,
    Query, TimeDimension,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cubejs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query a Cube.js analytics API from the command line")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/cubejs/config.toml or ./cubejs.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API host, overrides the config file
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a query and print the result rows
    Load(QueryArgs),

    /// Print the serialized query without sending it
    Query(QueryArgs),

    /// Print the current API token
    Token,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct QueryArgs {
    /// Cube name
    #[arg(long)]
    cube: String,

    /// Measures to select
    #[arg(short, long, required = true)]
    measure: Vec<String>,

    /// Dimensions to group by
    #[arg(short, long)]
    dimension: Vec<String>,

    /// Time dimension to filter and bucket on
    #[arg(short, long)]
    time_dimension: Option<String>,

    /// Relative date range (e.g., "last year")
    #[arg(long)]
    relative: Option<String>,

    /// Absolute range start (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Absolute range end (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Granularity (second, minute, hour, day, week, month, year)
    #[arg(short, long)]
    granularity: Option<String>,

    /// Filter in member:operator:value[,value] format
    #[arg(long)]
    filter: Vec<String>,

    /// Segments to apply
    #[arg(long)]
    segment: Vec<String>,

    /// Ordering in member:asc|desc format
    #[arg(short, long)]
    order: Vec<String>,

    #[arg(short, long, default_value_t = cubejs_client::query::DEFAULT_LIMIT)]
    limit: u64,

    #[arg(long, default_value_t = 0)]
    offset: u64,

    #[arg(long, default_value = cubejs_client::query::DEFAULT_TIMEZONE)]
    timezone: String,

    /// Skip GROUP BY
    #[arg(long)]
    ungrouped: bool,
}

impl QueryArgs {
    fn build(&self) -> anyhow::Result<Query> {
        let cube = Cube::new(&self.cube);
        let member = |name: &str| -> Member {
            if self.measure.iter().any(|m| m == name) {
                cube.measure(name).into()
            } else {
                cube.dimension(name).into()
            }
        };

        let mut builder = Query::builder(self.measure.iter().map(|m| cube.measure(m.as_str())))
            .dimensions(self.dimension.iter().map(|d| cube.dimension(d.as_str())))
            .limit(self.limit)
            .offset(self.offset)
            .timezone(&self.timezone)
            .ungrouped(self.ungrouped);

        let has_range = self.relative.is_some() || self.start.is_some() || self.end.is_some();
        if self.time_dimension.is_none() && (has_range || self.granularity.is_some()) {
            bail!("--relative, --start, --end and --granularity require --time-dimension");
        }

        if let Some(name) = &self.time_dimension {
            let range =
                DateRange::from_parts(self.start.clone(), self.end.clone(), self.relative.clone())?;
            let mut td = TimeDimension::new(cube.dimension(name.as_str()), range);
            if let Some(granularity) = &self.granularity {
                td = td.granularity(granularity.parse::<Granularity>()?);
            }
            builder = builder.time_dimension(td);
        }

        for spec in &self.filter {
            let mut parts = spec.splitn(3, ':');
            let (Some(name), Some(op)) = (parts.next(), parts.next()) else {
                bail!("Invalid filter '{}', expected member:operator:values", spec);
            };
            let operator: FilterOperator = op.parse()?;
            let values: Vec<&str> = parts
                .next()
                .map(|v| v.split(',').collect())
                .unwrap_or_default();
            builder = builder.filter(Filter::new(member(name), operator, values));
        }

        for name in &self.segment {
            builder = builder.segment(cube.segment(name.as_str()));
        }

        for spec in &self.order {
            let (name, direction) = spec.split_once(':').unwrap_or((spec.as_str(), "asc"));
            builder = builder.order_by(member(name), direction.parse::<Order>()?);
        }

        Ok(builder.build())
    }
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| format!("cubejs_client={}", config.logging.level)),
    );

    // Logs go to stderr so stdout stays machine-readable
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(host) = &cli.host {
        config.client.host = host.clone();
    }

    init_logging(&config);

    match cli.command {
        Commands::Load(args) => {
            let query = args.build()?;
            let client = CubeClient::new(config.client_config());
            let result = client
                .load(&query)
                .await
                .with_context(|| format!("Load request to {} failed", client.base_url()))?;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&result)?),
                _ => print_table(&result.data),
            }
        }

        Commands::Query(args) => {
            let query = args.build()?;
            println!("{}", serde_json::to_string_pretty(&query)?);
        }

        Commands::Token => {
            let client = CubeClient::new(config.client_config());
            match client.token()? {
                Some(token) => println!("{}", token),
                None => {
                    eprintln!("No secret configured; requests are sent unauthenticated.");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            let content = cubejs_client::config::generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Wrote default config to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn print_table(rows: &[serde_json::Value]) {
    let Some(first) = rows.first().and_then(|r| r.as_object()) else {
        println!("No rows returned.");
        return;
    };

    let columns: Vec<&String> = first.keys().collect();
    let header: Vec<String> = columns.iter().map(|c| format!("{:<24}", c)).collect();
    println!("{}", header.join(" "));
    println!("{}", "-".repeat(25 * columns.len()));

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| {
                let cell = match row.get(c.as_str()) {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(serde_json::Value::Null) | None => "-".to_string(),
                    Some(other) => other.to_string(),
                };
                format!("{:<24}", cell)
            })
            .collect();
        println!("{}", cells.join(" "));
    }
}
