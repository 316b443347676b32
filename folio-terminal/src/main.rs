/// Folio terminal preview
///
/// Controls:
///   - j/k, arrows: scroll the page
///   - 1-5: jump to a section
///   - p: toggle playback (spins the turntable)
///   - q/ESC: quit
use anyhow::{Context, Result};
use clap::Parser;
use folio_core::{Section, SiteConfig};
use folio_terminal::{snapshot, AssetLoader, Preview, TerminalApp};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "folio-terminal", version, about = "ASCII preview of the folio page scenes")]
struct Args {
    /// Site configuration (TOML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory that site URIs such as /models/vinyl.glb resolve against
    #[arg(long, default_value = "public")]
    root: PathBuf,

    /// Section to start at
    #[arg(long)]
    section: Option<Section>,

    /// Print one frame of WIDTHxHEIGHT to stdout and exit
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    snapshot: Option<(usize, usize)>,
}

fn parse_size(s: &str) -> Result<(usize, usize), String> {
    let (w, h) = s.split_once('x').ok_or("expected WIDTHxHEIGHT")?;
    let parse = |v: &str| v.trim().parse::<usize>().map_err(|e| e.to_string());
    Ok((parse(w)?, parse(h)?))
}

fn load_config(path: Option<&PathBuf>) -> Result<SiteConfig> {
    let Some(path) = path else {
        return Ok(SiteConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    SiteConfig::from_toml_str(&text).with_context(|| format!("loading {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();
    let args = Args::parse();

    let config = load_config(args.config.as_ref())?;
    log::info!("asset root {}", args.root.display());
    let mut preview = Preview::new(&config, AssetLoader::new(&args.root));
    if let Some(section) = args.section {
        preview.navigate(section);
    }

    if let Some((width, height)) = args.snapshot {
        println!("{}", snapshot(&mut preview, width, height));
        return Ok(());
    }

    let mut app = TerminalApp::new(preview).context("terminal unavailable")?;
    app.run().context("terminal preview failed")?;
    Ok(())
}
