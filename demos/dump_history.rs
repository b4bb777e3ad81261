// Dump persisted records as JSON (decodes the wincode payloads).
//
// Usage: cargo run --example dump_history -- [DB_PATH] [STREAM] [LIMIT]
//   DB_PATH  default: ./data/devhealth.db
//   STREAM   cpu | resources | battery | frame_rate | anr, or "all" (default)
//   LIMIT    default: 5 (per stream)

use devhealth::models::MetricFamily;
use devhealth::sink::SqliteSink;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = args.get(1).map(String::as_str).unwrap_or("./data/devhealth.db");
    let stream = args.get(2).map(String::as_str).unwrap_or("all");
    let limit: u32 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(5);

    let families: Vec<MetricFamily> = if stream == "all" {
        MetricFamily::ALL.to_vec()
    } else {
        let family = MetricFamily::from_tag(stream)
            .ok_or_else(|| anyhow::anyhow!("unknown stream {stream:?}"))?;
        vec![family]
    };

    let sink = SqliteSink::connect(path).await?;
    let mut out = Vec::new();
    for family in families {
        out.extend(sink.get_recent(family, limit).await?);
    }

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
