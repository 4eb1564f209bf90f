#[macro_use]
extern crate clap;

use clap::Arg;
use decaf::error::FatalError;
use decaf::{print, CompileOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("FILE")
                .help("Decaf source file to compile (must end in .dec)")
                .required(true)
                .index(1),
        )
        .arg(Arg::with_name("debug").short("d").long("debug").help("Print verbose node-creation tracing"))
        .arg(
            Arg::with_name("opt_level")
                .short("O")
                .takes_value(true)
                .value_name("LEVEL")
                .help("Enable an optimization pass; only level 0 (NOP removal) is supported"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Write the IR listing to this file instead of stdout"),
        )
        .arg(
            Arg::with_name("preprocess_only")
                .long("preprocess-only")
                .help("Stop after writing the .pre file and keep it"),
        )
        .get_matches();

    let path = matches.value_of("FILE").expect("FILE is required");
    let debug = matches.is_present("debug");
    let preprocess_only = matches.is_present("preprocess_only");
    let output = matches.value_of("output");

    let remove_nops = match matches.value_of("opt_level") {
        None => false,
        Some("0") => true,
        Some(level) => {
            eprintln!("{}", FatalError::Usage(format!("unsupported optimization level \"{}\"", level)));
            process::exit(1);
        }
    };

    let opts = CompileOptions { debug, remove_nops };

    if let Err(err) = run(path, &opts, preprocess_only, output) {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run(path: &str, opts: &CompileOptions, preprocess_only: bool, output: Option<&str>) -> Result<(), FatalError> {
    let input_path = Path::new(path);
    if input_path.extension().and_then(|e| e.to_str()) != Some("dec") {
        return Err(FatalError::BadExtension { path: path.to_owned() });
    }

    let source = fs::read_to_string(input_path).map_err(|e| FatalError::Io {
        path: path.to_owned(),
        detail: e.to_string(),
    })?;

    let preprocessed = decaf::preprocess::strip_comments(&source);
    let pre_path: PathBuf = input_path.with_extension("pre");
    fs::write(&pre_path, &preprocessed).map_err(|e| FatalError::Io {
        path: pre_path.display().to_string(),
        detail: e.to_string(),
    })?;

    if preprocess_only {
        return Ok(());
    }

    let cleanup = |result: Result<(), FatalError>| -> Result<(), FatalError> {
        let _ = fs::remove_file(&pre_path);
        result
    };

    let pre_text = match fs::read_to_string(&pre_path) {
        Ok(text) => text,
        Err(e) => {
            return cleanup(Err(FatalError::Io {
                path: pre_path.display().to_string(),
                detail: e.to_string(),
            }))
        }
    };

    println!("decaf compiler");
    if opts.debug {
        println!("debug: compiling \"{}\"", path);
    }

    let result = decaf::compile(&pre_text, opts);

    print::print_symbol_tables(&result.scope);
    print::print_data_section(&result.ir);
    print::print_ir(&result.ir);
    if let Some(ir_after_nop) = &result.ir_after_nop {
        println!("after NOP removal:");
        print::print_ir(ir_after_nop);
    }
    print::print_rt_error_targets(&result.ir);

    result.diag.print_summary();

    if let Some(out_path) = output {
        let listing_ir = result.ir_after_nop.as_ref().unwrap_or(&result.ir);
        let mut listing = String::new();
        for (i, entry) in listing_ir.entries.iter().enumerate() {
            listing.push_str(&print::format_ir_line(i + 1, entry));
            listing.push('\n');
        }
        if let Err(e) = fs::write(out_path, listing) {
            return cleanup(Err(FatalError::Io {
                path: out_path.to_owned(),
                detail: e.to_string(),
            }));
        }
    }

    cleanup(Ok(()))
}
