//! PNZED CLI - Convert longitude/latitude tables to State Plane
//!
//! # Main Commands
//!
//! ```bash
//! pnzed serve                      # Start HTTP server (port 5000)
//! pnzed convert points.csv         # Convert a file to Easting/Northing CSV
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! pnzed parse points.csv           # Just parse the table to JSON
//! pnzed validate points.csv        # Run the coordinate validator only
//! ```

use clap::{Parser, Subcommand};
use pnzed::{
    convert_file, parse_table_file, validate_coordinate_columns, write_csv_file, ConvertOptions,
    CrsId, ServerConfig, EASTING_FIELD, NORTHING_FIELD,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pnzed")]
#[command(about = "Convert longitude/latitude tables to State Plane Northing/Easting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a coordinate table to CSV with Easting/Northing columns
    Convert {
        /// Input file (.csv, .xlsx or .xls)
        input: PathBuf,

        /// Output CSV file (default: <input stem>_converted_Northing_Easting.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column holding the longitude coordinate
        #[arg(long, default_value = "x")]
        x_field: String,

        /// Column holding the latitude coordinate
        #[arg(long, default_value = "y")]
        y_field: String,

        /// Geographic source CRS
        #[arg(long, default_value = "EPSG:4326")]
        source_crs: String,

        /// Projected target CRS
        #[arg(long, default_value = "EPSG:6543")]
        target_crs: String,
    },

    /// Parse a table file and output JSON records
    Parse {
        /// Input file (.csv, .xlsx or .xls)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a table's coordinate columns without converting
    Validate {
        /// Input file (.csv, .xlsx or .xls)
        input: PathBuf,

        /// Column holding the longitude coordinate
        #[arg(long, default_value = "x")]
        x_field: String,

        /// Column holding the latitude coordinate
        #[arg(long, default_value = "y")]
        y_field: String,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            x_field,
            y_field,
            source_crs,
            target_crs,
        } => cmd_convert(
            &input,
            output.as_deref(),
            x_field,
            y_field,
            source_crs,
            target_crs,
        ),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Validate {
            input,
            x_field,
            y_field,
        } => cmd_validate(&input, &x_field, &y_field),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    x_field: String,
    y_field: String,
    source_crs: String,
    target_crs: String,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Converting: {}", input.display());

    let options = ConvertOptions {
        x_field,
        y_field,
        source_crs: CrsId::new(source_crs),
        target_crs: CrsId::new(target_crs),
    };

    let outcome = convert_file(input, &options)?;

    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => {
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("points");
            input.with_file_name(pnzed::output_filename(stem))
        }
    };

    write_csv_file(&outcome.table, &output_path)?;

    eprintln!(
        "✅ Converted {} rows ({} -> {})",
        outcome.table.len(),
        options.source_crs,
        options.target_crs
    );
    eprintln!("💾 Output written to: {}", output_path.display());

    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let result = parse_table_file(input)?;

    if let Some(encoding) = &result.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    if let Some(delimiter) = result.delimiter {
        eprintln!(
            "   Delimiter: '{}'",
            match delimiter {
                '\t' => "\\t".to_string(),
                c => c.to_string(),
            }
        );
    }
    if let Some(sheet) = &result.sheet {
        eprintln!("   Worksheet: {}", sheet);
    }
    eprintln!("   Columns: {}", result.table.headers().join(", "));
    eprintln!("✅ Parsed {} records", result.table.len());

    let json = serde_json::to_string_pretty(result.table.rows())?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_validate(
    input: &Path,
    x_field: &str,
    y_field: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let result = parse_table_file(input)?;
    validate_coordinate_columns(&result.table, x_field, y_field)?;

    eprintln!(
        "✅ {} rows valid: columns '{}' and '{}' present and populated",
        result.table.len(),
        x_field,
        y_field
    );
    eprintln!(
        "   Conversion would append '{}' and '{}'",
        EASTING_FIELD, NORTHING_FIELD
    );

    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    pnzed::server::start_server(port, ServerConfig::from_env()).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
