#[macro_use]
extern crate log;

use std::fs;
use std::io::Read;
use std::path::PathBuf;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error>>;

use structopt::StructOpt;

use chipsim_core::script::Script;
use chipsim_core::sys::{AdcBoard, BoardConfig};

mod convcfg;

use crate::convcfg::{parse_addr, ConverterCfg};

#[derive(StructOpt)]
#[structopt(name = "chipsim")]
#[structopt(about = r#"
Drives an emulated ADS1115 I2C ADC with a transaction script.
"#)]
struct Args {
    /// Transaction script to replay. Read from stdin if omitted.
    ///
    /// One command per line: `start <addr> <r|w>`, `read [count]`,
    /// `write <byte>...`, `stop`. `#` starts a comment.
    #[structopt(long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// ADC conversion model.
    ///
    /// Format: `fixed:value=<n>` (default: `fixed:value=1234`)
    #[structopt(long)]
    converter: Option<ConverterCfg>,

    /// Populate the given address with an unemulated stub device. May be
    /// repeated.
    #[structopt(long, parse(try_from_str = parse_addr))]
    stub: Vec<u8>,

    /// Scan the bus and print every acknowledging address before running the
    /// script.
    #[structopt(long)]
    scan: bool,
}

fn main() -> DynResult<()> {
    pretty_env_logger::formatted_builder()
        .filter(None, log::LevelFilter::Error)
        .filter(Some("chipsim"), log::LevelFilter::Info)
        .filter(Some("I2C"), log::LevelFilter::Warn)
        .filter(Some("BOARD"), log::LevelFilter::Info)
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_default())
        .init();

    let args = Args::from_args();

    let mut cfg = BoardConfig {
        stubs: args.stub,
        ..BoardConfig::default()
    };
    if let Some(ConverterCfg::Fixed { value }) = args.converter {
        cfg.conversion = value;
    }

    let mut board = AdcBoard::new(cfg)?;

    if args.scan {
        for addr in board.bus_mut().scan() {
            println!("found device @ {:#04x}", addr);
        }
    }

    let text = match args.script {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    let script: Script = text.parse()?;
    if script.is_empty() {
        warn!("script contains no commands");
    }

    let report = board.run(&script)?;

    for b in &report.reads {
        println!("{:#04x} ({})", b, b);
    }
    for nack in &report.nacks {
        println!("line {}: NACK @ {:#04x}", nack.line, nack.addr);
    }
    if report.write_nacks != 0 {
        println!("{} written byte(s) not acknowledged", report.write_nacks);
    }

    Ok(())
}
