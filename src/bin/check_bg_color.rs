use anyhow::Result;
use apk_build_tools::{inspect, observability, Config};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(
    name = "check-bg-color",
    about = "Sample an image's edges and report its background color and transparency"
)]
struct Args {
    /// Image to check. Defaults to the configured image path.
    #[clap(value_name = "IMAGE")]
    image: Option<PathBuf>,

    /// JSON config file.
    #[clap(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    observability::init_tracing();
    let args = Args::parse();

    let image = match args.image {
        Some(image) => image,
        None => Config::load(args.config.as_deref())?.image_path,
    };

    println!("Checking image background color...");
    inspect(&image, &mut std::io::stdout().lock())?;

    Ok(())
}
