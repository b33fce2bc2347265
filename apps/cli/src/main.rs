use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use labelkit_address::{Address, PostalCode};
use labelkit_barcode::{
    AdditionalService, Cepnet, CepnetRenderer, PayloadFields, ServiceType, TrackingCode,
};
use labelkit_printing::{
    GeneratedDocument, LabelEntry, LabelFormatId, LabelGenerator, LayoutOptions,
};
use labelkit_settings::{load_sender, read_update, SharedGeneratorState};
use serde_json::{Map, Value};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "labelkit",
    about = "Postal label generator: CEPNet bar codes, 2-D symbol payloads and print-ready PDFs",
    author,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a single label from a destination address file.
    Generate(GenerateArgs),
    /// Generate every label of a JSON batch into one document.
    Batch(BatchArgs),
    /// List the supported label formats.
    Formats,
    /// Print the CEPNet check digit and bar pattern of a postal code.
    CheckDigit(CheckDigitArgs),
    /// Render a CEPNet bar code to PNG.
    Barcode(BarcodeArgs),
    /// Pack the 2-D symbol payload and print it.
    Payload(PayloadArgs),
}

/// Options shared by `generate` and `batch`.
#[derive(Args)]
struct RenderArgs {
    /// Label format identifier (see `labelkit formats`).
    #[arg(long, value_name = "ID")]
    format: String,

    /// Sender profile (JSON).
    #[arg(long, value_name = "PATH")]
    sender: Option<PathBuf>,

    /// Config update (JSON object), merged over the defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Leave the CEPNet bar code off.
    #[arg(long)]
    no_barcode: bool,

    /// Draw the sender block on formats that have one.
    #[arg(long)]
    with_sender: bool,

    /// Bar code resolution override.
    #[arg(long, value_name = "N")]
    dpi: Option<u32>,

    /// Output PDF path.
    #[arg(long, short, value_name = "PATH")]
    output: PathBuf,

    /// Also write a PNG preview of the first page.
    #[arg(long, value_name = "PATH")]
    preview: Option<PathBuf>,

    /// Resolution of the preview image.
    #[arg(long, value_name = "N", default_value_t = 96)]
    preview_dpi: u32,
}

#[derive(Args)]
struct GenerateArgs {
    /// Destination address (JSON), or a `{cliente_nome, endereco}` entry.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,

    /// Display name used when the address has no recipient override.
    #[arg(long, default_value = "")]
    name: String,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args)]
struct BatchArgs {
    /// JSON array of `{cliente_nome, endereco, codigo_rastreamento}` entries.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args)]
struct CheckDigitArgs {
    /// Postal code; punctuation is ignored.
    cep: String,
}

#[derive(Args)]
struct BarcodeArgs {
    /// Postal code; punctuation is ignored.
    cep: String,

    #[arg(long, short, value_name = "PATH")]
    output: PathBuf,

    #[arg(long, default_value_t = 300)]
    dpi: u32,

    /// Physical width of the symbol.
    #[arg(long, default_value_t = 65.0)]
    width_mm: f32,

    /// Physical height of the symbol.
    #[arg(long, default_value_t = 12.0)]
    height_mm: f32,
}

#[derive(Args)]
struct PayloadArgs {
    #[arg(long)]
    dest_cep: String,

    #[arg(long, default_value = "")]
    dest_number: String,

    #[arg(long)]
    origin_cep: String,

    #[arg(long, default_value = "")]
    origin_number: String,

    /// Service type: a two-digit code or a name such as CARTA_REGISTRADA.
    #[arg(long, default_value = "03")]
    service: String,

    /// Additional services (AR, MP, VD, DD), comma separated.
    #[arg(long, value_delimiter = ',')]
    additional: Vec<String>,

    /// Tracking code, e.g. `JT123456789BR`.
    #[arg(long)]
    tracking: Option<String>,

    #[arg(long, default_value = "")]
    cif: String,

    #[arg(long, default_value = "")]
    cnae: String,

    #[arg(long, default_value = "")]
    principal_service: String,

    #[arg(long, default_value = "")]
    free_text: String,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LABELKIT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<()> {
    let Cli { command } = Cli::parse();
    match command {
        Commands::Generate(args) => execute_generate(args),
        Commands::Batch(args) => execute_batch(args),
        Commands::Formats => {
            list_formats();
            Ok(())
        }
        Commands::CheckDigit(args) => execute_check_digit(args),
        Commands::Barcode(args) => execute_barcode(args),
        Commands::Payload(args) => execute_payload(args),
    }
}

fn execute_generate(args: GenerateArgs) -> Result<()> {
    let value = read_json(&args.input)?;
    let entry = if value.get("endereco").is_some() {
        let mut entry: LabelEntry = serde_json::from_value(value)
            .with_context(|| format!("invalid label entry in {}", args.input.display()))?;
        if entry.name.is_empty() {
            entry.name = args.name;
        }
        entry
    } else {
        let address: Address = serde_json::from_value(value)
            .with_context(|| format!("invalid address in {}", args.input.display()))?;
        LabelEntry::new(args.name, address)
    };
    render(&args.render, &[entry])
}

fn execute_batch(args: BatchArgs) -> Result<()> {
    let value = read_json(&args.input)?;
    let entries: Vec<LabelEntry> = serde_json::from_value(value)
        .with_context(|| format!("invalid label batch in {}", args.input.display()))?;
    render(&args.render, &entries)
}

fn render(args: &RenderArgs, entries: &[LabelEntry]) -> Result<()> {
    let generator = build_generator(args)?;
    let options = LayoutOptions {
        include_sender: args.with_sender,
        ..LayoutOptions::default()
    };
    let document = generator
        .generate_batch(&args.format, entries, options)
        .with_context(|| format!("failed to generate {} labels", args.format))?;

    write_output(&args.output, &document.pdf)?;
    if let Some(path) = &args.preview {
        let preview = document.preview(0, args.preview_dpi)?;
        write_output(path, &preview.data)?;
    }
    report(&args.output, &document);
    Ok(())
}

fn build_generator(args: &RenderArgs) -> Result<LabelGenerator> {
    let state = Arc::new(SharedGeneratorState::default());
    if let Some(path) = &args.config {
        let update = read_update(path)?;
        state.update_config(&update)?;
    }

    let mut overrides = Map::new();
    if let Some(dpi) = args.dpi {
        overrides.insert("resolucao_dpi".into(), Value::from(dpi));
    }
    if args.no_barcode {
        overrides.insert("incluir_cepnet".into(), Value::Bool(false));
    }
    if !overrides.is_empty() {
        state.update_config(&overrides)?;
    }

    if let Some(path) = &args.sender {
        let sender = load_sender(path)?;
        state.set_sender(Some(sender));
    } else if args.with_sender {
        tracing::warn!("--with-sender given without --sender; no sender block will be drawn");
    }
    Ok(LabelGenerator::new(state))
}

fn report(output: &Path, document: &GeneratedDocument) {
    println!(
        "Wrote {} page(s) with {} label(s) to {}",
        document.page_count,
        document.label_count,
        output.display()
    );
    for warning in &document.warnings {
        println!("warning: {warning}");
    }
}

fn list_formats() {
    for id in LabelFormatId::all() {
        let format = id.format();
        println!(
            "{:<16} {:<16} {:>4} per page  {}",
            id.as_str(),
            id.alias(),
            format.labels_per_page(),
            id.description()
        );
    }
}

fn execute_check_digit(args: CheckDigitArgs) -> Result<()> {
    let code = PostalCode::parse(&args.cep)?;
    let digit = Cepnet::check_digit_for(&code);
    println!("postal code: {}", code.formatted());
    println!("check digit: {digit}");
    println!("code: {}", Cepnet::with_check_digit(code.as_str())?);
    println!("pattern: {}", Cepnet::pattern_string(code.as_str())?);
    Ok(())
}

fn execute_barcode(args: BarcodeArgs) -> Result<()> {
    let code = PostalCode::parse(&args.cep)?;
    let image = CepnetRenderer::new(args.dpi)
        .render(code.as_str(), args.width_mm, args.height_mm)
        .with_context(|| format!("failed to render bar code for {}", code.formatted()))?;
    let png = image.raster.encode_png()?;
    write_output(&args.output, &png)?;
    println!(
        "Wrote {}x{} px bar code for {} to {}",
        image.raster.width(),
        image.raster.height(),
        image.caption,
        args.output.display()
    );
    Ok(())
}

fn execute_payload(args: PayloadArgs) -> Result<()> {
    let destination = PostalCode::parse(&args.dest_cep).context("invalid --dest-cep")?;
    let origin = PostalCode::parse(&args.origin_cep).context("invalid --origin-cep")?;
    let mut fields = PayloadFields::new(destination, args.dest_number, origin, args.origin_number);
    fields.service_type = ServiceType::parse(&args.service);
    fields.additional_services =
        AdditionalService::parse_list(args.additional.iter().map(String::as_str));
    if let Some(tracking) = &args.tracking {
        fields.tracking_code = TrackingCode::parse(tracking)?.to_string();
    }
    fields.service_content = args.cif;
    fields.classification = args.cnae;
    fields.principal_service = args.principal_service;
    fields.free_text = args.free_text;

    let payload = fields.pack();
    if !payload.truncated.is_empty() {
        tracing::warn!(fields = ?payload.truncated, "payload fields truncated to their width");
    }
    println!("{}", payload.content);
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("output path must not be empty");
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
}
