//! TLV Dump - decode an encoded tree and print it
//!
//! Input comes from a file (memory-mapped) or from a hex string.
//!
//! Usage:
//!   cargo run --release --bin tlv_dump -- [OPTIONS] <FILE>
//!   cargo run --release --bin tlv_dump -- --hex FA00010007BA00020002ABCD

use std::sync::Arc;

use tlvtree::{Decoder, Node, TlvFile, TracingSink};
use tracing_subscriber::EnvFilter;

/// Dump configuration
#[derive(Default)]
struct DumpConfig {
    path: Option<String>,
    hex: Option<String>,
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "tlvtree=debug,info" } else { "warn" };
    let mut env_filter = EnvFilter::new(default);
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        for directive in rust_log.split(',').filter_map(|s| match s.parse() {
            Ok(directive) => Some(directive),
            Err(err) => {
                eprintln!("Ignoring directive `{}`: {}", s, err);
                None
            }
        }) {
            env_filter = env_filter.add_directive(directive);
        }
    }

    let _ = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_help() {
    println!("TLV Dump v{} - print an encoded tree\n", tlvtree::version());
    println!("Usage: tlv_dump [OPTIONS] <FILE>\n");
    println!("Options:");
    println!("      --hex <HEX>   Decode a hex string instead of a file");
    println!("  -v, --verbose     Trace decoding to stderr");
    println!("  -V, --version     Print version");
    println!("  -h, --help        Show this help");
}

fn parse_args() -> DumpConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = DumpConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--hex" => {
                if i + 1 < args.len() {
                    config.hex = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--version" | "-V" => {
                println!("tlv_dump {}", tlvtree::version());
                std::process::exit(0);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                config.path = Some(other.to_string());
            }
        }
        i += 1;
    }

    config
}

fn run(config: DumpConfig) -> Result<(), String> {
    let sink = Arc::new(TracingSink);

    let (root, size): (Node, usize) = match (&config.hex, &config.path) {
        (Some(text), _) => {
            let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = hex::decode(&cleaned).map_err(|e| format!("invalid hex: {}", e))?;
            let root = Decoder::new(&bytes)
                .with_sink(sink)
                .decode()
                .map_err(|e| e.to_string())?;
            (root, bytes.len())
        }
        (None, Some(path)) => {
            let file = TlvFile::open(path)
                .map_err(|e| format!("{}: {}", path, e))?
                .with_sink(sink);
            let root = file.decode().map_err(|e| format!("{}: {}", path, e))?;
            (root, file.len())
        }
        (None, None) => return Err("no input given (see --help)".to_string()),
    };

    print!("{}", root.dump());
    println!("\n{} nodes, {} bytes", root.count(), size);
    Ok(())
}

fn main() {
    let config = parse_args();
    init_logging(config.verbose);

    if let Err(e) = run(config) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
