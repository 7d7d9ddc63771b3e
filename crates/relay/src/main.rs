//! Console Relay - capture console traffic, carry it across a JSON
//! boundary, and replay it on the other side.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use parking_lot::Mutex;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use capture::{hook, unhook, CapturedEntry, EntryCallback, SystemConsole, Target};
use codec::{decode_entry, entry_json, Value};
use common::Method;

mod config;

use config::RelayConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Console Relay - capture, encode, and replay console traffic
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Capture raw entries instead of transport-encoded ones
    #[arg(long)]
    raw: bool,

    /// Depth and breadth bound for encoded values
    #[arg(long, default_value = "100")]
    limit: usize,

    /// Do not echo the wire JSON of each entry
    #[arg(long)]
    no_wire: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Console Relay v{}", VERSION);

    let mut config = RelayConfig::new();
    config.encode_for_transport = !args.raw;
    config.limit = args.limit;
    config.echo_wire = !args.no_wire;

    let console = Arc::new(SystemConsole::new());
    let captured: Arc<Mutex<Vec<CapturedEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = captured.clone();
    let callback: EntryCallback = Arc::new(move |entry: &CapturedEntry| {
        sink.lock().push(entry.clone());
    });

    let target: Arc<dyn Target> = console.clone();
    let handle = hook(
        target,
        callback,
        config.encode_for_transport,
        config.limit,
    )?;

    drive(console.as_ref());

    unhook(&handle);
    info!("captured {} entries", captured.lock().len());

    replay(&captured.lock(), &config)?;
    Ok(())
}

/// Exercise the hooked console the way an application would.
fn drive(console: &SystemConsole) {
    console.call(
        Method::Log,
        &[
            Value::from("service started"),
            Value::object([
                ("version", Value::from(VERSION)),
                ("workers", Value::from(4)),
            ]),
        ],
    );

    console.call(
        Method::Info,
        &[Value::instance(
            "Session",
            [
                ("user", Value::from("ada")),
                ("expires", Value::Date(chrono::Utc::now())),
                ("token", Value::Symbol("opaque".to_string())),
            ],
        )],
    );

    console.call(
        Method::Table,
        &[Value::array([
            Value::object([("id", Value::from(1)), ("status", Value::from("active"))]),
            Value::object([("id", Value::from(2)), ("status", Value::from("inactive"))]),
        ])],
    );

    // Values with no lossless primitive form.
    console.call(
        Method::Log,
        &[
            Value::Num(f64::NAN),
            Value::Num(f64::INFINITY),
            Value::BigInt("900719925474099123".to_string()),
            Value::map([(Value::from("k"), Value::from(1))]),
            Value::set([Value::from(1), Value::from(2)]),
        ],
    );

    // A cyclic object terminates through the cycle marker.
    let cyclic = Value::object([("name", Value::from("loop"))]);
    if let Value::Object(object) = &cyclic {
        object.write().fields.insert("own".to_string(), cyclic.clone());
    }
    console.call(Method::Dir, &[cyclic]);

    // An oversized array is truncated, not dropped.
    console.call(Method::Log, &[Value::array((0..1000).map(Value::from))]);

    // A failing property degrades to a placeholder.
    console.call(
        Method::Log,
        &[Value::object([(
            "broken",
            Value::getter(|| Err("proxy revoked".to_string())),
        )])],
    );

    console.call(
        Method::Error,
        &[Value::Error {
            name: "TypeError".to_string(),
            message: "cannot read properties of undefined".to_string(),
            stack: Some("at main (relay.rs:1:1)".to_string()),
        }],
    );

    console.call(Method::Count, &[Value::from("tick")]);
    console.call(Method::Count, &[Value::from("tick")]);
    console.call(Method::Count, &[]);

    console.call(Method::Time, &[Value::from("startup")]);
    std::thread::sleep(Duration::from_millis(25));
    console.call(Method::TimeEnd, &[Value::from("startup")]);
    console.call(Method::TimeEnd, &[Value::from("missing")]);

    console.call(Method::Assert, &[Value::Bool(true), Value::from("not shown")]);
    console.call(
        Method::Assert,
        &[Value::Bool(false), Value::from("invariant broken")],
    );

    console.call(Method::Group, &[Value::from("shutdown")]);
    console.call(Method::Log, &[Value::from("draining workers")]);
    console.call(Method::GroupEnd, &[]);
}

/// Carry each entry across the JSON boundary and print its decoded form.
fn replay(entries: &[CapturedEntry], config: &RelayConfig) -> Result<()> {
    for captured in entries {
        match captured {
            CapturedEntry::Raw(entry) => {
                println!("[{}] {}", entry.method, capture::render_args(&entry.data));
            }
            CapturedEntry::Encoded(entry) => {
                let line = entry_json(entry)?;
                if config.echo_wire {
                    println!("wire: {line}");
                }
                let wire: serde_json::Value = serde_json::from_str(&line)?;
                let decoded = decode_entry(&wire);
                let rendered = decoded
                    .data
                    .iter()
                    .map(|value| value.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("[{}] {}", decoded.method, rendered);
            }
        }
    }
    Ok(())
}
