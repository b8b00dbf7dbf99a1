use clap::{ArgGroup, Parser};
use frame_cut_planner::render;
use frame_cut_planner::types::{Demand, Stock};
use frame_cut_planner::{CuttingPlanResult, expand_demands};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "frame_cut_planner",
    about = "Cutting plans for frame-shop bars and sheets"
)]
#[command(group(ArgGroup::new("stock").required(true).args(["bar", "sheet"])))]
struct Cli {
    /// Bar length in cm (mouldings)
    #[arg(long)]
    bar: Option<f64>,

    /// Sheet dimensions in cm as WxH (glass, backing, passe-partout)
    #[arg(long)]
    sheet: Option<String>,

    /// Cuts as W[xH]:qty[:label] (e.g. 54.5:4:#1042 or 40x30:2)
    #[arg(long = "cuts", num_args = 1..)]
    cuts: Vec<String>,

    /// Show an ASCII diagram of each stock unit
    #[arg(long)]
    layout: bool,

    /// Print the plan as JSON instead of a cutting sheet
    #[arg(long)]
    json: bool,

    /// Fail if any piece does not fit the stock
    #[arg(long)]
    strict: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_number(s: &str, what: &str) -> Result<f64, String> {
    let v = s
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid {what} '{s}'"))?;
    if !v.is_finite() || v <= 0.0 {
        return Err(format!("{what} must be positive in '{s}'"));
    }
    Ok(v)
}

fn parse_dimensions(s: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{s}', expected WxH"));
    }
    Ok((parse_number(parts[0], "width")?, parse_number(parts[1], "height")?))
}

fn parse_stock(cli: &Cli) -> Result<Stock, String> {
    match (cli.bar, &cli.sheet) {
        (Some(length), _) => {
            if !length.is_finite() || length <= 0.0 {
                return Err(format!("bar length must be positive, got {length}"));
            }
            Ok(Stock::Bar { length })
        }
        (None, Some(sheet)) => {
            let (width, height) = parse_dimensions(sheet)?;
            Ok(Stock::Sheet { width, height })
        }
        (None, None) => Err("one of --bar or --sheet is required".to_string()),
    }
}

fn parse_cut(s: &str, stock: &Stock) -> Result<Demand, String> {
    let mut parts = s.splitn(3, ':');
    let size = parts.next().unwrap_or_default();
    let qty = parts
        .next()
        .ok_or_else(|| format!("invalid cut '{s}', expected W[xH]:qty[:label]"))?;
    let label = parts.next().unwrap_or_default().to_string();

    let (width, height) = if stock.is_bar() {
        (parse_number(size, "length")?, 0.0)
    } else {
        parse_dimensions(size)?
    };
    let qty = qty
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{s}'"))?;
    if qty == 0 {
        return Err(format!("quantity must be non-zero in '{s}'"));
    }

    Ok(Demand {
        width,
        height,
        qty,
        label,
    })
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

fn print_diagrams(stock: &Stock, result: &CuttingPlanResult) {
    for layout in &result.layouts {
        println!("#{}", layout.stock_unit_index);
        match *stock {
            Stock::Bar { length } => print!("{}", render::render_bar(length, &layout.placed_pieces)),
            Stock::Sheet { width, height } => {
                print!("{}", render::render_sheet(width, height, &layout.placed_pieces))
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let stock = parse_stock(&cli).unwrap_or_else(|e| fail(e));

    let demands: Vec<Demand> = cli
        .cuts
        .iter()
        .map(|c| parse_cut(c, &stock))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| fail(e));

    let pieces = expand_demands(&stock, &demands).unwrap_or_else(|e| fail(e));

    let mut result = stock.plan(&pieces).unwrap_or_else(|e| fail(e));
    if cli.strict {
        result = result.into_strict().unwrap_or_else(|e| fail(e));
    }

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => fail(e),
        }
        return;
    }

    print!("{}", render::render_cutting_sheet(&stock, &result));
    if cli.layout {
        println!();
        print_diagrams(&stock, &result);
    }
}
