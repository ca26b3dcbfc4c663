extern crate log;

use std::fs::File;
use std::io::{self, Read as _};
use std::str::FromStr;

use clap::Parser;
use env_logger::Builder;
use log::{error, info, LevelFilter};

use mlat_decoder_core::{Mode, Reader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input file to decode, or "-" for stdin.
    #[arg(value_name = "FILE", default_value = "-")]
    input: String,

    /// Wire format of the input stream.
    #[arg(
        short = None,
        long = "mode",
        action,
        value_parser = ["beast", "radarcape", "avr", "avrmlat", "sbs"],
        default_value_t = String::from("beast"),
        env = "MLAT_DECODE_MODE",
        help = "Wire format of the input stream"
    )]
    mode: String,

    #[arg(short = 'v', long = "log-level", alias = "loglevel", action = clap::ArgAction::Set, default_value_t = String::from("info"), value_parser = ["off", "error", "warn", "info", "debug", "trace"], env = "MLAT_DECODE_LOG_LEVEL", help = "Log level")]
    log_level: String,
    #[arg(short = None, long = "log-style", alias = "logstyle", action = clap::ArgAction::Set, default_value_t = String::from("auto"), value_parser = ["auto", "always", "never"], env = "MLAT_DECODE_LOG_STYLE", help = "Manage color for log messages")]
    log_style: String,
}

fn mode_from_str(s: &str) -> Mode {
    match s {
        "beast" => Mode::Beast,
        "radarcape" => Mode::Radarcape,
        "avr" => Mode::Avr,
        "avrmlat" => Mode::AvrMlat,
        "sbs" => Mode::Sbs,
        _ => unreachable!("value_parser restricts this to known modes"),
    }
}

fn read_input(path: &str) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if path == "-" {
        io::stdin().read_to_end(&mut buf)?;
    } else {
        File::open(path)?.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

fn main() {
    let cli = Cli::parse();

    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::from_str(cli.log_level.as_str()).unwrap());
    builder.parse_write_style(cli.log_style.as_str());
    builder.init();

    let data = match read_input(&cli.input) {
        Ok(data) => data,
        Err(e) => {
            error!("failed to read {}: {}", cli.input, e);
            std::process::exit(1);
        }
    };

    let mut reader = Reader::new(mode_from_str(&cli.mode));
    info!(
        "decoding {} bytes as {} (frequency {} Hz)",
        data.len(),
        reader.mode(),
        reader.frequency()
    );

    let mut offset = 0;
    while offset < data.len() {
        match reader.feed(&data[offset..], 0) {
            Ok(outcome) => {
                for msg in &outcome.messages {
                    println!("{}", msg);
                }
                if outcome.consumed == 0 {
                    break;
                }
                offset += outcome.consumed;
                if outcome.error_pending {
                    // The framing fault behind the pending messages will
                    // surface on the next feed() call.
                    continue;
                }
            }
            Err(e) => {
                error!("decode error: {}", e);
                std::process::exit(1);
            }
        }
    }

    info!(
        "received {} messages, suppressed {}, mlat {}",
        reader.received_messages, reader.suppressed_messages, reader.mlat_messages
    );
}
