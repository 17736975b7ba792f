use futures::executor::block_on;
use ledgerflow::{ChartController, ChartError, ChartKind, Dataset, ExportFormat};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{Read, Write};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error("invalid {what} `{value}`")]
    Invalid { what: &'static str, value: String },
}

impl From<ledgerflow::ledgerflow_core::Error> for CliError {
    fn from(value: ledgerflow::ledgerflow_core::Error) -> Self {
        Self::Chart(value.into())
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    Process,
    Layout,
    #[default]
    Render,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    kind: Option<ChartKind>,
    input: Option<String>,
    pretty: bool,
    format: Option<ExportFormat>,
    config: Option<String>,
    preset: Option<String>,
    curve: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    id: Option<String>,
    out: Option<String>,
}

#[derive(Serialize)]
struct ProcessOut<'a> {
    graph: &'a ledgerflow::ProcessedGraph,
    warnings: &'a [ledgerflow::FlowWarning],
}

fn usage() -> &'static str {
    "ledgerflow\n\
\n\
USAGE:\n\
  ledgerflow process [--pretty] [<path>|-]\n\
  ledgerflow layout [--pretty] [--kind sankey|bar] [--config <file.json>] [--preset <name>] [--curve <n>] [--width <w>] [--height <h>] [<path>|-]\n\
  ledgerflow [render] [--format svg|png|csv] [--kind sankey|bar] [--config <file.json>] [--preset <name>] [--curve <n>] [--width <w>] [--height <h>] [--id <svg-id>] [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input is a {nodes, links, metadata} dataset or an income statement with `revenue`.\n\
  - --config takes a JSON object of chart options; --width/--height/--curve override it.\n\
  - render prints SVG or CSV to stdout by default; use --out to write a file.\n\
  - PNG output defaults to writing next to the input file (or ./out.png for stdin).\n\
  - Set LEDGERFLOW_LOG (e.g. `debug`) to control log output on stderr.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a str, CliError> {
    it.next()
        .map(String::as_str)
        .ok_or(CliError::Usage(usage()))
}

fn parse_number(what: &'static str, value: &str) -> Result<f64, CliError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CliError::Invalid {
            what,
            value: value.to_string(),
        })
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "process" => args.command = Command::Process,
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "--format" => {
                let v = next_value(&mut it)?;
                args.format = Some(v.parse().map_err(|_| CliError::Invalid {
                    what: "format",
                    value: v.to_string(),
                })?);
            }
            "--kind" => args.kind = Some(next_value(&mut it)?.parse()?),
            "--config" => args.config = Some(next_value(&mut it)?.to_string()),
            "--preset" => args.preset = Some(next_value(&mut it)?.to_string()),
            "--curve" => args.curve = Some(parse_number("curve", next_value(&mut it)?)?),
            "--width" => args.width = Some(parse_number("width", next_value(&mut it)?)?),
            "--height" => args.height = Some(parse_number("height", next_value(&mut it)?)?),
            "--id" => args.id = Some(next_value(&mut it)?.to_string()),
            "--out" => args.out = Some(next_value(&mut it)?.to_string()),
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

/// Config file first, then the individual flags on top.
fn chart_options(args: &Args) -> Result<Value, CliError> {
    let mut options = match &args.config {
        Some(path) => match serde_json::from_str::<Value>(&std::fs::read_to_string(path)?)? {
            Value::Object(map) => map,
            _ => {
                return Err(CliError::Invalid {
                    what: "config file (expected a JSON object)",
                    value: path.clone(),
                });
            }
        },
        None => Map::new(),
    };
    if let Some(w) = args.width {
        options.insert("width".to_string(), w.into());
    }
    if let Some(h) = args.height {
        options.insert("height".to_string(), h.into());
    }
    if let Some(c) = args.curve {
        options.insert("curveIntensity".to_string(), c.into());
    }
    Ok(Value::Object(options))
}

fn write_json(value: &impl Serialize, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    write_bytes(text.as_bytes(), out)
}

fn write_bytes(bytes: &[u8], out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            std::io::stdout().lock().write_all(bytes)?;
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, bytes)?;
            Ok(())
        }
    }
}

fn default_out_path(input: Option<&str>, ext: &str) -> std::path::PathBuf {
    match input {
        Some(path) if path != "-" => std::path::PathBuf::from(path).with_extension(ext),
        _ => std::path::PathBuf::from(format!("out.{ext}")),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let data = Dataset::from_json(&text)?;
    let options = chart_options(&args)?;

    let mut chart = ChartController::with_options(args.kind.unwrap_or_default(), &options)?;
    if let Some(id) = &args.id {
        chart = chart.with_surface_id(id.clone());
    }
    if let Some(preset) = &args.preset {
        chart.apply_curvature_preset(preset)?;
    }
    chart.render(&data)?;
    for w in chart.warnings() {
        tracing::warn!(
            node = %w.node,
            value = w.value,
            inflow = w.inflow,
            outflow = w.outflow,
            "flow imbalance"
        );
    }

    match args.command {
        Command::Process => {
            let graph = chart.graph().ok_or(ChartError::NotRendered)?;
            let out = ProcessOut {
                graph,
                warnings: chart.warnings(),
            };
            write_json(&out, args.pretty, args.out.as_deref())
        }
        Command::Layout => {
            let layout = chart.layout().ok_or(ChartError::NotRendered)?;
            write_json(layout, args.pretty, args.out.as_deref())
        }
        Command::Render => match args.format.unwrap_or(ExportFormat::Svg) {
            ExportFormat::Svg => {
                let svg = block_on(chart.export_svg_async())?;
                write_bytes(svg.as_bytes(), args.out.as_deref())
            }
            ExportFormat::Csv => {
                let csv = block_on(chart.export_csv_async())?;
                write_bytes(csv.as_bytes(), args.out.as_deref())
            }
            ExportFormat::Png => {
                let bytes = block_on(chart.export_png_async())?;
                let out = args.out.clone().unwrap_or_else(|| {
                    default_out_path(args.input.as_deref(), "png")
                        .to_string_lossy()
                        .to_string()
                });
                write_bytes(&bytes, Some(out.as_str()))
            }
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LEDGERFLOW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        let code = match err {
            CliError::Chart(ChartError::Core(_)) | CliError::Json(_) => 3,
            _ => 1,
        };
        std::process::exit(code);
    }
}
