//! TLV Demo - build a sample tree, encode it and decode it back
//!
//! Usage:
//!   cargo run --release --bin tlv_demo -- [OPTIONS]

use std::sync::Arc;
use std::time::Instant;

use tlvtree::{decode, write_file, Encoder, Node, TlvError, TracingSink};
use tracing_subscriber::EnvFilter;

/// Demo configuration
#[derive(Default)]
struct DemoConfig {
    output: Option<String>,
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::new(if verbose { "tlvtree=debug,info" } else { "info" });
    let _ = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_args() -> DemoConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = DemoConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--output" | "-o" => {
                if i + 1 < args.len() {
                    config.output = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--version" | "-V" => {
                println!("tlv_demo {}", tlvtree::version());
                std::process::exit(0);
            }
            "--help" | "-h" => {
                println!("TLV Demo v{} - sample tree round trip\n", tlvtree::version());
                println!("Usage: tlv_demo [OPTIONS]\n");
                println!("Options:");
                println!("  -o, --output <PATH>  Also write the encoded tree to PATH");
                println!("  -v, --verbose        Trace encoding to stderr");
                println!("  -V, --version        Print version");
                println!("  -h, --help           Show this help");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

/// |cdo+123|
///     |pdo+2222| dfg
///     |cdo+6666|
///         |cdo+444|
///         |pdo+5555| tttt
///         |pdo+88| bábébíböbåbä
///     |pdo+3333| xyz
fn build_sample() -> Result<Node, TlvError> {
    let mut root = Node::constructed(123);
    let first = root.append_child(Node::primitive(2222, b"dfg".to_vec())?)?;
    first.set_next(Node::constructed(6666));
    root.append_child(Node::primitive(3333, b"xyz".to_vec())?)?;

    let inner = root
        .find_by_tag_mut(6666)
        .ok_or(TlvError::NullArgument)?;
    inner.append_child(Node::constructed(444))?;
    inner.append_child(Node::primitive(5555, b"tttt".to_vec())?)?;
    inner.append_child(Node::primitive_str(88, "bábébíböbåbä")?)?;

    Ok(root)
}

fn run(config: DemoConfig) -> Result<(), TlvError> {
    println!("🌳 TLV Tree Demo v{}", tlvtree::version());
    println!("=========================\n");

    let mut root = build_sample()?;
    println!("{}", root.dump());

    let start = Instant::now();
    let mut encoder = Encoder::for_tree(&mut root)?.with_sink(Arc::new(TracingSink));
    let bytes = encoder.encode(&mut root)?.to_vec();
    let encode_duration = start.elapsed();
    println!("Encoded {} bytes in {:?}", bytes.len(), encode_duration);
    println!("{}\n", hex::encode_upper(&bytes));

    let start = Instant::now();
    let back = decode(&bytes)?;
    println!("Decoded {} nodes in {:?}", back.count(), start.elapsed());
    println!("Round trip equal: {}", back == root);

    if let Some(path) = &config.output {
        let written = write_file(path, &mut root)?;
        println!("Wrote {} bytes to {}", written, path);
    }

    Ok(())
}

fn main() {
    let config = parse_args();
    init_logging(config.verbose);

    if let Err(e) = run(config) {
        eprintln!("❌ Demo error: {}", e);
        std::process::exit(1);
    }
}
