use std::net::SocketAddr;

use custbench_testserver::{FailureMode, TestServerBehavior};
use tokio::net::TcpListener;
use tokio::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut bind_addr: SocketAddr = "127.0.0.1:0".parse()?;
    let mut behavior = TestServerBehavior::default();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bind" => {
                let addr = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--bind requires an address, e.g. 127.0.0.1:0")
                })?;
                bind_addr = addr.parse()?;
            }
            "--latency-ms" => {
                let ms = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--latency-ms requires a number"))?;
                behavior.latency = Duration::from_millis(ms.parse()?);
            }
            "--fail" => {
                let mode = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--fail requires a mode, e.g. card-declined"))?;
                behavior.failure = mode
                    .parse::<FailureMode>()
                    .map_err(|_| anyhow::anyhow!("unknown failure mode: {mode}"))?;
            }
            "--key" => {
                let key = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--key requires an API key"))?;
                behavior.api_key = Some(key);
            }
            "-h" | "--help" => {
                eprintln!(
                    "custbench-testserver\n\nUSAGE:\n  custbench-testserver [--bind 127.0.0.1:0] [--latency-ms N] [--fail MODE] [--key KEY]\n\nMODES:\n  none, card-declined, expired-card, incorrect-cvc, incorrect-zip,\n  invalid-request, rate-limited, api-error\n\nOUTPUT:\n  Prints HTTP_URL=<url> to stdout once ready."
                );
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown argument: {other}"));
            }
        }
    }

    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    let stats = custbench_testserver::TestServerStats::default();
    let app = custbench_testserver::router(stats, behavior);

    println!("HTTP_URL=http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
