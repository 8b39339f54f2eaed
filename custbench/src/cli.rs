use clap::{Args, Parser};
use std::time::Duration;

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 30s, 500ms, 1m)".to_string());
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);

    if number_end == 0 {
        return Err(format!(
            "invalid duration '{s}' (expected e.g. 30s, 500ms, 1m)"
        ));
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value: u64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 30s, 500ms, 1m)"))?;

    let duration = match unit_str.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Duration::from_secs(value),
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => Duration::from_millis(value),
        "m" | "min" | "mins" | "minute" | "minutes" => {
            let secs = value
                .checked_mul(60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Duration::from_secs(secs)
        }
        _ => {
            return Err(format!(
                "invalid duration '{s}' (expected e.g. 30s, 500ms, 1m)"
            ));
        }
    };

    if duration.is_zero() {
        return Err(format!("duration '{s}' must be greater than zero"));
    }
    Ok(duration)
}

fn parse_limit(input: &str) -> Result<u64, String> {
    match input.trim().parse::<u64>() {
        Ok(0) => Err("must be a positive integer".to_string()),
        Ok(v) => Ok(v),
        Err(_) => Err(format!("'{input}' is not a positive integer")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Per-request lines plus a final tally.
    HumanReadable,
    /// Emit one JSON object per event (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "custbench",
    author,
    version,
    about = "Load-test customer creation against a payments API",
    long_about = "custbench keeps up to --active create-customer requests in flight against the payments API and stops admitting new ones once --total requests were issued or --delayed requests took longer than --deadline.\n\nEvery admitted request is allowed to finish before the final tally is printed.",
    after_help = "Examples:\n  custbench --key sk_test_...\n  STRIPE_API_KEY=sk_test_... custbench --active 25 --total 5000 --deadline 1500\n  custbench --key sk_test_123 --base-url http://localhost:12111 --output json\n\nExit codes:\n  0   all requests completed within tolerance\n  11  delayed or total budget exceeded\n  30  invalid input\n  40  runtime error"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Milliseconds before a request is considered delayed
    #[arg(long, value_name = "MS", default_value_t = 2000)]
    pub deadline: u64,

    /// Maximum number of requests active at one time
    #[arg(long, value_name = "N", default_value_t = 10, value_parser = parse_limit)]
    pub active: u64,

    /// Quit after this many delayed requests
    #[arg(long, value_name = "N", default_value_t = 20)]
    pub delayed: u64,

    /// Quit after this many total requests
    #[arg(long, value_name = "N", default_value_t = 1000, value_parser = parse_limit)]
    pub total: u64,

    /// API key used for every request
    #[arg(long, value_name = "KEY", env = "STRIPE_API_KEY", hide_env_values = true)]
    pub key: String,

    /// Debug logging and a dump of the run parameters
    #[arg(short = 'D', long)]
    pub debug: bool,

    /// API endpoint (e.g. a local mock server)
    #[arg(long, value_name = "URL", default_value = custbench_stripe::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout (e.g. 30s, 500ms); unset means no client-side timeout
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Host identity embedded in request descriptions (defaults to the hostname)
    #[arg(long, value_name = "ID")]
    pub host_id: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}
