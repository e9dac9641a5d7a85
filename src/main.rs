//! labelgen command-line entrypoint

use clap::Parser;
use labelgen::output::{Verification, render_label_set};
use labelgen::{Error, LabelConfig, LabelGenerator, Result, Targets, logging};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "labelgen",
    version,
    about = "Generate QR code and Code128 barcode images for an order"
)]
struct Cli {
    /// Optional configuration file (toml/yaml). Defaults to labelgen.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Order identifier (default ORD-2025-001)
    #[arg(long, value_name = "ID")]
    order_id: Option<String>,

    /// Stock keeping unit (default TS-001)
    #[arg(long, value_name = "SKU")]
    sku: Option<String>,

    /// Encode this URL in the QR code instead of the templated order URL
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Directory receiving the images
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Include the order id in file names so orders do not overwrite each other
    #[arg(long)]
    name_by_order: bool,

    /// Only write the QR code
    #[arg(long, conflicts_with = "barcode_only")]
    qr_only: bool,

    /// Only write the barcode
    #[arg(long)]
    barcode_only: bool,

    /// Decode each written image and check it matches its payload
    #[arg(long)]
    verify: bool,

    /// Output results as formatted JSON instead of human-readable text
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply(&self, config: &mut LabelConfig) {
        if let Some(ref order_id) = self.order_id {
            config.order.order_id = order_id.clone();
        }
        if let Some(ref sku) = self.sku {
            config.order.sku = sku.clone();
        }
        if let Some(ref url) = self.url {
            config.order.url = Some(url.clone());
        }
        if let Some(ref dir) = self.out_dir {
            config.output.dir = dir.clone();
        }
        if self.name_by_order {
            config.output.name_by_order = true;
        }
    }

    fn targets(&self) -> Targets {
        Targets {
            qr: !self.barcode_only,
            barcode: !self.qr_only,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = LabelConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    logging::init(&config.logging)?;

    let generator = LabelGenerator::new(config)?;
    info!(order = ?generator.order(), "Generating labels");

    let set = generator
        .generate_order(generator.order(), cli.targets())
        .await?;

    let mut verifications = Vec::new();
    for artifact in set.artifacts() {
        if cli.verify {
            verifications.push(Verification::Verified(generator.verify(artifact).await?));
        } else {
            verifications.push(Verification::Skipped);
        }
    }

    let report = render_label_set(&set, &verifications);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.json).map_err(Error::from)?);
    } else {
        for line in &report.human {
            println!("{line}");
        }
    }

    Ok(())
}
