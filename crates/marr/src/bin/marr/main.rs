//! marr CLI
//!
//! Demo workload and snapshot tools for struct-of-arrays containers.

mod commands;

use commands::{inspect_file, run_zones, snapshot_zones, SnapshotOptions, ZonesOptions};

fn main() {
    marr::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "zones" => {
            let options = ZonesOptions::parse(&args[2..]).unwrap_or_else(|error| {
                eprintln!("error: {error}");
                eprintln!("Usage: marr zones [--count N] [--steps S]");
                std::process::exit(1);
            });
            match run_zones(&options) {
                Ok(report) => println!("{report}"),
                Err(error) => {
                    eprintln!("error: {error}");
                    std::process::exit(1);
                }
            }
        }
        "inspect" => {
            if args.len() < 3 {
                eprintln!("Usage: marr inspect <file>");
                std::process::exit(1);
            }
            match inspect_file(&args[2]) {
                Ok(summary) => print!("{summary}"),
                Err(error) => {
                    eprintln!("error: {error}");
                    std::process::exit(1);
                }
            }
        }
        "snapshot-zones" => {
            if args.len() < 3 {
                eprintln!("Usage: marr snapshot-zones <file> [--count N]");
                std::process::exit(1);
            }
            let options = SnapshotOptions::parse(&args[3..]).unwrap_or_else(|error| {
                eprintln!("error: {error}");
                eprintln!("Usage: marr snapshot-zones <file> [--count N]");
                std::process::exit(1);
            });
            match snapshot_zones(&args[2], options.count) {
                Ok(bytes) => println!("wrote {} zones ({bytes} bytes) to {}", options.count, args[2]),
                Err(error) => {
                    eprintln!("error: {error}");
                    std::process::exit(1);
                }
            }
        }
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("marr - struct-of-arrays containers");
    println!();
    println!("Usage: marr <command> [options]");
    println!();
    println!("Commands:");
    println!("  zones [--count N] [--steps S]         Move N zones S times with Vec and MultiArray");
    println!("  snapshot-zones <file> [--count N]     Write a binary snapshot of N zones");
    println!("  inspect <file>                        Print a snapshot's header and type");
    println!();
    println!("Set MARR_LOG (e.g. MARR_LOG=marr=debug) to enable logging.");
}
