//! Sonance CLI — fetch a stream and dump its audio payload

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use sonance::config::reader::POLL_INTERVAL_MS;
use sonance::config::TransportConfig;
use sonance::source::StreamReader;
use sonance::InputError;

/// Bad arguments, local files, configuration
const EXIT_LOCAL: i32 = 1;
/// The server or the network failed us
const EXIT_REMOTE: i32 = 2;

#[derive(Parser)]
#[command(name = "sonance", about = "Fetch an HTTP/ICY stream or local file", version)]
struct Cli {
    /// Stream URL (http://...), file:// URL, or absolute path
    url: String,

    /// Write the payload here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after this many payload bytes
    #[arg(long)]
    max_bytes: Option<u64>,

    /// Give up when no data arrives for this many seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn init_tracing(&self) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let filter = if self.verbose {
            "sonance=debug"
        } else {
            "sonance=info"
        };

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn exit_code(err: &InputError) -> i32 {
    if err.is_remote() {
        EXIT_REMOTE
    } else {
        EXIT_LOCAL
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    cli.init_tracing();

    let config = TransportConfig::default();
    let stream = match sonance::open(&cli.url, &config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(exit_code(&e));
        }
    };

    let mut reader = StreamReader::with_timing(
        stream,
        Duration::from_millis(POLL_INTERVAL_MS),
        Duration::from_secs(cli.timeout),
    );
    let titles = reader.subscribe();

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let limit = cli.max_bytes.unwrap_or(u64::MAX);
    let mut written = 0u64;
    let mut announced = false;
    let mut chunk = vec![0u8; 16 * 1024];

    while written < limit {
        let want = (limit - written).min(chunk.len() as u64) as usize;
        let n = match reader.read(&mut chunk[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("stream error after {} bytes: {}", written, e);
                out.flush()?;
                let code = e
                    .get_ref()
                    .and_then(|inner| inner.downcast_ref::<InputError>())
                    .map_or(EXIT_REMOTE, exit_code);
                std::process::exit(code);
            }
        };

        if !announced {
            let info = reader.info();
            info!(
                "{} ({})",
                info.meta_name.as_deref().unwrap_or("unnamed stream"),
                info.mime.as_deref().unwrap_or("unknown type")
            );
            if let Some(size) = info.size {
                info!("size: {} bytes", size);
            }
            announced = true;
        }
        if let Some(rx) = &titles {
            for meta in rx.try_iter() {
                info!("now playing: {}", meta.raw);
            }
        }

        out.write_all(&chunk[..n])?;
        written += n as u64;
    }

    out.flush()?;
    info!("{} bytes written", written);
    reader.into_inner().close();
    Ok(())
}
