//! layoutmd CLI - Markdown from extracted PDF page layouts

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use layoutmd::{
    parse_file_with_options, Document, HeadingStyle, JsonFormat, PageSelection, ParseOptions,
    RenderOptions,
};

#[derive(Parser)]
#[command(name = "layoutmd")]
#[command(version)]
#[command(about = "Rebuild reading order, columns and tables from extracted PDF layouts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write Markdown, text and JSON into a directory
    Convert {
        /// Extracted layout (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[command(flatten)]
        parse: ParseArgs,
    },

    /// Convert to Markdown
    #[command(alias = "md")]
    Markdown {
        /// Extracted layout (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include YAML frontmatter
        #[arg(short, long)]
        frontmatter: bool,

        /// Heading syntax
        #[arg(long, value_enum, default_value = "atx")]
        headings: HeadingMode,

        /// Wrap body text at this width
        #[arg(long, value_name = "COLUMNS")]
        wrap: Option<usize>,

        /// Render pages top to bottom even when columns are detected
        #[arg(long)]
        no_columns: bool,

        /// Column detection tolerance in points
        #[arg(long, env = "LAYOUTMD_COLUMN_TOLERANCE", default_value = "10.0")]
        column_tolerance: f32,

        /// Escape Markdown special characters
        #[arg(long)]
        escape: bool,

        /// Page selection (e.g., "0-9", "0,2,4")
        #[arg(long)]
        pages: Option<String>,

        #[command(flatten)]
        parse: ParseArgs,
    },

    /// Convert to plain text
    Text {
        /// Extracted layout (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Page selection (e.g., "0-9", "0,2,4")
        #[arg(long)]
        pages: Option<String>,

        #[command(flatten)]
        parse: ParseArgs,
    },

    /// Dump the reconstructed document as JSON
    Json {
        /// Extracted layout (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        parse: ParseArgs,
    },

    /// Show document information and layout statistics
    Info {
        /// Extracted layout (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        parse: ParseArgs,
    },

    /// Show version information
    Version,
}

/// Options shared by every command that parses a document.
#[derive(Args, Clone)]
struct ParseArgs {
    /// Process pages one at a time
    #[arg(long)]
    sequential: bool,

    /// Skip the quality gate
    #[arg(long)]
    no_quality_check: bool,

    /// Skip table reconstruction
    #[arg(long)]
    no_tables: bool,

    /// Fragment merge tolerance in points
    #[arg(long, env = "LAYOUTMD_MERGE_TOLERANCE", default_value = "2.0")]
    merge_tolerance: f32,
}

impl Default for ParseArgs {
    fn default() -> Self {
        Self {
            sequential: false,
            no_quality_check: false,
            no_tables: false,
            merge_tolerance: ParseOptions::default().merge_tolerance,
        }
    }
}

impl ParseArgs {
    fn options(&self) -> ParseOptions {
        ParseOptions::new()
            .with_parallel(!self.sequential)
            .with_quality_check(!self.no_quality_check)
            .with_table_detection(!self.no_tables)
            .with_merge_tolerance(self.merge_tolerance)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum HeadingMode {
    /// `#` prefixed headings
    Atx,
    /// Underlined headings for the top two levels
    Setext,
}

impl From<HeadingMode> for HeadingStyle {
    fn from(mode: HeadingMode) -> Self {
        match mode {
            HeadingMode::Atx => HeadingStyle::Atx,
            HeadingMode::Setext => HeadingStyle::Setext,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            parse,
        } => cmd_convert(&input, output.as_deref(), &parse),
        Commands::Markdown {
            input,
            output,
            frontmatter,
            headings,
            wrap,
            no_columns,
            column_tolerance,
            escape,
            pages,
            parse,
        } => {
            let mut options = RenderOptions::new()
                .with_metadata(frontmatter)
                .with_heading_style(headings.into())
                .with_columns(!no_columns)
                .with_column_tolerance(column_tolerance)
                .with_escaping(escape)
                .with_tables(!parse.no_tables);
            if let Some(width) = wrap {
                options = options.with_line_length(width);
            }
            parse_pages(pages.as_deref()).and_then(|selection| {
                cmd_markdown(&input, output.as_deref(), &parse, options.with_pages(selection))
            })
        }
        Commands::Text {
            input,
            output,
            pages,
            parse,
        } => parse_pages(pages.as_deref())
            .and_then(|selection| cmd_text(&input, output.as_deref(), &parse, selection)),
        Commands::Json {
            input,
            output,
            compact,
            parse,
        } => cmd_json(&input, output.as_deref(), compact, &parse),
        Commands::Info { input, parse } => cmd_info(&input, &parse),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn parse_pages(pages: Option<&str>) -> Result<PageSelection, Box<dyn std::error::Error>> {
    match pages {
        Some(p) => Ok(PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?),
        None => Ok(PageSelection::All),
    }
}

fn load(input: &Path, parse: &ParseArgs) -> Result<Document, Box<dyn std::error::Error>> {
    let doc = parse_file_with_options(input, parse.options())?;
    for warning in &doc.diagnostics.warnings {
        eprintln!("{}: {}", "Warning".yellow().bold(), warning);
    }
    log::debug!(
        "{}: {} pages, {} blocks",
        input.display(),
        doc.page_count(),
        doc.total_block_count()
    );
    Ok(doc)
}

fn write_or_print(output: Option<&Path>, content: &str) -> CmdResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_convert(input: &Path, output: Option<&Path>, parse: &ParseArgs) -> CmdResult {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_output", stem))
    });
    fs::create_dir_all(&output_dir)?;

    let doc = load(input, parse)?;
    let render_options = RenderOptions::new()
        .with_metadata(true)
        .with_tables(!parse.no_tables);

    let markdown = layoutmd::render::to_markdown(&doc, &render_options)?;
    fs::write(output_dir.join("extract.md"), &markdown)?;

    let text = layoutmd::render::to_text(&doc, &render_options)?;
    fs::write(output_dir.join("extract.txt"), &text)?;

    let json = layoutmd::render::to_json(&doc, JsonFormat::Pretty)?;
    fs::write(output_dir.join("content.json"), &json)?;

    println!("{}", "Output files:".green().bold());
    println!("  {} extract.md", "├─".dimmed());
    println!("  {} extract.txt", "├─".dimmed());
    println!("  {} content.json", "└─".dimmed());

    Ok(())
}

fn cmd_markdown(
    input: &Path,
    output: Option<&Path>,
    parse: &ParseArgs,
    options: RenderOptions,
) -> CmdResult {
    let doc = load(input, parse)?;
    let markdown = layoutmd::render::to_markdown(&doc, &options)?;
    write_or_print(output, &markdown)
}

fn cmd_text(
    input: &Path,
    output: Option<&Path>,
    parse: &ParseArgs,
    pages: PageSelection,
) -> CmdResult {
    let doc = load(input, parse)?;
    let options = RenderOptions::new().with_pages(pages);
    let text = layoutmd::render::to_text(&doc, &options)?;
    write_or_print(output, &text)
}

fn cmd_json(input: &Path, output: Option<&Path>, compact: bool, parse: &ParseArgs) -> CmdResult {
    let doc = load(input, parse)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = layoutmd::render::to_json(&doc, format)?;
    write_or_print(output, &json)
}

fn cmd_info(input: &Path, parse: &ParseArgs) -> CmdResult {
    let doc = load(input, parse)?;
    let meta = &doc.metadata;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    if let Some(ref format) = meta.format {
        println!("{}: {}", "Format".bold(), format);
    }
    println!("{}: {}", "Pages".bold(), meta.page_count);

    let fields = [
        ("Title", &meta.title),
        ("Author", &meta.author),
        ("Subject", &meta.subject),
        ("Creator", &meta.creator),
        ("Producer", &meta.producer),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{}: {}", label.bold(), value);
        }
    }
    if let Some(ref created) = meta.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = meta.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Layout Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let tables: usize = doc.pages.iter().map(|p| p.tables.len()).sum();
    println!("{}: {}", "Processed pages".bold(), doc.page_count());
    println!("{}: {}", "Blocks".bold(), doc.total_block_count());
    println!("{}: {}", "Words".bold(), doc.total_word_count());
    println!("{}: {}", "Fonts".bold(), doc.unique_fonts().len());
    println!("{}: {}", "Table candidates".bold(), tables);

    let hierarchy = doc.typography_hierarchy();
    if !hierarchy.is_empty() {
        println!();
        println!("{}", "Typography".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        for level in hierarchy {
            println!("  {:>5.1}pt  {:?}", level.size, level.role);
        }
    }

    if let Some(ref quality) = doc.diagnostics.quality {
        println!();
        println!("{}", "Quality".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        println!("{}", serde_json::to_string_pretty(quality)?);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "layoutmd".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Markdown from extracted PDF page layouts");
    println!();
    println!("License: MIT");
}
