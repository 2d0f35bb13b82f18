use std::{collections::HashMap, io::Read, path::Path};

use anyhow::Context;
use nix::unistd::Pid;
use tracing_subscriber::EnvFilter;

use trace2prog::{convert_trace, Conversion, ConvertOptions, SkeletonCatalog};

use cli::{FAILED_ONLY, ONLY_PID, OUTPUT_FILE, ROOT_PID, SUMMARY, TRACE2PROG_ARGS};
use one_line_formatter::{one_line, process_header};
use writer::Writer;

mod cli;
mod colors;
mod one_line_formatter;
mod writer;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace2prog=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let trace_path = TRACE2PROG_ARGS.trace.as_path();
    let text = read_trace(trace_path)?;
    let options = ConvertOptions {
        root_pid: ROOT_PID.map(Pid::from_raw),
        ..ConvertOptions::default()
    };
    let conversion = convert_trace(&text, &SkeletonCatalog, &options)
        .with_context(|| format!("could not convert {}", trace_path.display()))?;

    let mut writer = Writer::initialize(OUTPUT_FILE.map(|path| path.as_path()))?;
    writer
        .write_line_errors(&conversion.line_errors)
        .context("could not report the skipped lines")?;
    for program in &conversion.programs {
        if ONLY_PID.is_some_and(|pid| pid != program.pid.as_raw()) {
            continue;
        }
        writer.extend(process_header(program, &conversion));
        for call in &program.calls {
            if *FAILED_ONLY && !call.failed() {
                continue;
            }
            writer.extend(one_line(program.pid, call));
        }
        writer.write_general_text("\n");
        writer.flush_buffer().context("could not write the programs")?;
    }

    if *SUMMARY {
        print_table(&conversion);
    }
    Ok(())
}

fn read_trace(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("could not read the trace from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))
}

fn print_table(conversion: &Conversion) {
    // variant -> (calls, failed, generic fallbacks)
    let mut counts: HashMap<&str, (usize, usize, usize)> = HashMap::new();
    for call in conversion.programs.iter().flat_map(|program| &program.calls) {
        let entry = counts.entry(call.variant.as_str()).or_default();
        entry.0 += 1;
        entry.1 += usize::from(call.failed());
        entry.2 += usize::from(call.fallback);
    }
    let mut rows = Vec::from_iter(counts);
    rows.sort_by(|(name, (count, ..)), (name2, (count2, ..))| {
        count2.cmp(count).then_with(|| name.cmp(name2))
    });

    use tabled::{builder::Builder, settings::Style};
    let mut builder = Builder::new();

    builder.push_record(["calls", "errors", "generic", "variant"]);
    builder.push_record([""]);
    for (variant, (count, failed, fallback)) in rows {
        builder.push_record([
            count.to_string().as_str(),
            failed.to_string().as_str(),
            fallback.to_string().as_str(),
            variant,
        ]);
    }
    builder.push_record([""]);
    builder.push_record([
        conversion.programs.len().to_string().as_str(),
        "processes",
        conversion.line_errors.len().to_string().as_str(),
        "skipped lines",
    ]);
    let table = builder.build().with(Style::ascii_rounded()).to_string();

    println!("\n{}", table);
}
