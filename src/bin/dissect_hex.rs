//! Command-line front-end: feed hex-encoded messages through the
//! dissectors and print the decoded trees.
//!
//! Input is one message per line: `<proto> <dir> <hex>` where proto is
//! `vt`, `uas` or `mausb`. For `vt`, dir is `ecu` or `vt`; for `uas`, dir
//! is the endpoint in hex (e.g. `81`). Lines starting with `#` are
//! skipped. Frame numbers are assigned in input order.
//!
//!     $ echo "vt ecu 00 01 34 12 78 56 03" | dissect_hex -
//!     $ dissect_hex capture.txt --json --object-names names.csv

use busdissect::{
    dissect_mausb, dissect_pipe_usage, dissect_uas, dissect_vt, Direction, FieldTree,
    ObjectNameTable, OpcodeNamer, Session,
};
use clap::Parser;
use log::warn;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "dissect_hex", about = "Dissect hex-encoded bus capture messages")]
struct Args {
    /// Input file of hex message lines, or `-` for stdin.
    input: PathBuf,

    /// Emit trees as JSON instead of plain text.
    #[arg(long)]
    json: bool,

    /// Optional `<decimal id>,<name>` object-ID translation file.
    #[arg(long)]
    object_names: Option<PathBuf>,
}

fn main() -> ExitCode {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let contents = match read_input(&args.input) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("failed to read {}: {}", args.input.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let mut session = Session::new();
    if let Some(path) = &args.object_names {
        match ObjectNameTable::load_from_file(path) {
            Ok(table) => session.object_names = table,
            Err(err) => warn!("object name file not loaded: {}", err),
        }
    }
    let mut scsi = OpcodeNamer::new();

    let mut seq: u64 = 0;
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        seq += 1;
        match dissect_line(&mut session, &mut scsi, line, seq) {
            Ok(tree) => print_tree(seq, &tree, args.json),
            Err(err) => eprintln!("line {}: {}", lineno + 1, err),
        }
    }
    ExitCode::SUCCESS
}

fn read_input(path: &PathBuf) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read_to_string(path)
    }
}

fn dissect_line(
    session: &mut Session,
    scsi: &mut OpcodeNamer,
    line: &str,
    seq: u64,
) -> Result<FieldTree, String> {
    let mut parts = line.splitn(3, char::is_whitespace);
    let proto = parts.next().ok_or("empty line")?;
    let selector = parts.next().ok_or("missing direction/endpoint")?;
    let hex_part = parts.next().ok_or("missing payload")?;
    let payload = parse_hex(hex_part)?;

    match proto {
        "vt" => {
            let direction = match selector {
                "ecu" => Direction::ToServer,
                "vt" => Direction::ToClient,
                other => return Err(format!("bad vt direction {:?}", other)),
            };
            Ok(dissect_vt(session, direction, &payload))
        }
        "uas" => {
            let endpoint = u8::from_str_radix(selector, 16)
                .map_err(|_| format!("bad endpoint {:?}", selector))?;
            Ok(dissect_uas(session, endpoint, seq, &payload, scsi))
        }
        "pipe" => {
            let endpoint = u8::from_str_radix(selector, 16)
                .map_err(|_| format!("bad endpoint {:?}", selector))?;
            Ok(dissect_pipe_usage(session, endpoint, &payload))
        }
        "mausb" => Ok(dissect_mausb(&payload)),
        other => Err(format!("unknown protocol {:?}", other)),
    }
}

fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact).map_err(|err| format!("bad hex: {}", err))
}

fn print_tree(seq: u64, tree: &FieldTree, json: bool) {
    if json {
        match serde_json::to_string(tree) {
            Ok(s) => println!("{}", s),
            Err(err) => eprintln!("frame {}: {}", seq, err),
        }
    } else {
        print!("frame {}: {}", seq, tree);
    }
}
