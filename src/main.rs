//! glyphscope: font shaping and inspection from the command line.
//!
//! Loads a font (binary data, or a textual source compiled through an
//! external command), optionally lists its layout features or an outline
//! summary, then shapes text or an explicit glyph sequence and prints the
//! positioned glyph run as a table or JSON.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use glyphscope_fonts::{
    CommandCompiler, Direction, GlyphSelector, LayoutTable, LoadedFont, ShapeInput, ShapeOptions,
    SourceFont, VarLocation,
};

/// glyphscope - inspect and shape fonts
#[derive(Parser)]
#[command(name = "glyphscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Font file (binary TTF/OTF/TTC/WOFF/WOFF2), or a textual font source
    /// when --compiler is given
    font: PathBuf,

    /// Text to shape
    text: Option<String>,

    /// Shape an explicit glyph sequence instead of text: comma-separated
    /// glyph names and U+XXXX codepoints, e.g. "f,i,U+0041"
    #[arg(long, value_name = "GLYPHS", conflicts_with = "text")]
    glyphs: Option<String>,

    /// Font index within a collection
    #[arg(long, default_value_t = 0)]
    index: u32,

    /// OpenType feature toggles, e.g. "liga=0,ss01=1" ("-liga" also works)
    #[arg(long, value_name = "FEATURES")]
    features: Option<String>,

    /// Variable-design-axis location, e.g. "wght=700,wdth=85"
    #[arg(long, value_name = "AXES")]
    variations: Option<String>,

    /// Writing direction override: ltr, rtl, ttb or btt
    #[arg(long, value_name = "DIR")]
    direction: Option<Direction>,

    /// ISO 15924 script tag override, e.g. "Arab"
    #[arg(long, value_name = "TAG")]
    script: Option<String>,

    /// BCP 47 language override, e.g. "tr"
    #[arg(long, value_name = "LANG")]
    language: Option<String>,

    /// External compiler command producing font bytes on stdout; FONT is
    /// passed as its last argument
    #[arg(long, value_name = "CMD")]
    compiler: Option<String>,

    /// Emit the glyph run as JSON
    #[arg(long)]
    json: bool,

    /// List scripts and features of the font's layout tables
    #[arg(long)]
    list_features: bool,

    /// Print an outline summary for a glyph name
    #[arg(long, value_name = "GLYPH")]
    outline: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut font = load_font(&cli).await?;
    log::info!(
        "loaded {} (index {}, {} glyphs)",
        cli.font.display(),
        cli.index,
        font.glyph_order().len()
    );

    let mut did_something = false;

    if cli.list_features {
        print_layout(&font);
        did_something = true;
    }

    if let Some(glyph_name) = &cli.outline {
        print_outline(&mut font, glyph_name)?;
        did_something = true;
    }

    if let Some(location) = &cli.variations {
        font.set_variable_location(&parse_variations(location)?);
    }

    let selectors;
    let input = if let Some(spec) = &cli.glyphs {
        selectors = parse_glyph_list(spec)?;
        Some(ShapeInput::Glyphs(&selectors))
    } else {
        cli.text.as_deref().map(ShapeInput::Text)
    };

    let Some(input) = input else {
        if did_something {
            return Ok(());
        }
        bail!("nothing to do: pass TEXT, --glyphs, --list-features or --outline");
    };

    let options = ShapeOptions {
        features: cli.features.as_deref().map(parse_features).transpose()?.unwrap_or_default(),
        variations: cli
            .variations
            .as_deref()
            .map(parse_variations)
            .transpose()?
            .unwrap_or_default(),
        direction: cli.direction,
        script: cli.script.clone(),
        language: cli.language.clone(),
    };

    let run = font.shape(input, &options);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print_run(&run);
    }
    Ok(())
}

/// Builds the font handle: directly from binary data, or through the
/// external compiler for textual sources.
async fn load_font(cli: &Cli) -> Result<LoadedFont> {
    let Some(command) = &cli.compiler else {
        return LoadedFont::from_path(&cli.font, cli.index)
            .with_context(|| format!("failed to load font {}", cli.font.display()));
    };

    let mut parts = command.split_whitespace();
    let program = parts.next().context("--compiler command is empty")?;
    let mut compiler = CommandCompiler::new(program);
    for arg in parts {
        compiler = compiler.arg(arg);
    }

    let mut source = SourceFont::new(&cli.font, cli.index);
    source
        .load(&compiler)
        .await
        .with_context(|| format!("failed to compile font source {}", cli.font.display()))?;
    source.into_font().context("font source did not reach the ready state")
}

fn print_layout(font: &LoadedFont) {
    for (label, table) in [
        ("GSUB", LayoutTable::Substitution),
        ("GPOS", LayoutTable::Positioning),
    ] {
        let scripts = font.shaper().script_tags(table);
        let features = font.shaper().feature_tags(table, 0, None);
        println!(
            "{label}: scripts [{}] features [{}]",
            scripts.join(" "),
            features.join(" ")
        );
    }
}

fn print_outline(font: &mut LoadedFont, glyph_name: &str) -> Result<()> {
    let outline = font
        .outline(glyph_name)
        .with_context(|| format!("no outline for glyph '{glyph_name}'"))?;
    println!(
        "{glyph_name}: {} points, {} segments",
        outline.points().len(),
        outline.verbs().len()
    );
    Ok(())
}

fn print_run(run: &[glyphscope_fonts::GlyphPlacement]) {
    let name_width = run.iter().map(|g| g.name.len()).max().unwrap_or(4).max(4);
    println!(
        "{:>5}  {:<name_width$}  {:>7}  {:>6}  {:>6}  {:>6}  {:>6}",
        "gid", "name", "cluster", "dx", "dy", "ax", "ay"
    );
    for glyph in run {
        println!(
            "{:>5}  {:<name_width$}  {:>7}  {:>6}  {:>6}  {:>6}  {:>6}",
            glyph.glyph_id,
            glyph.name,
            glyph.cluster,
            glyph.x_offset,
            glyph.y_offset,
            glyph.x_advance,
            glyph.y_advance
        );
    }
}

/// Parses "liga=0,ss01=1,-calt,kern" into feature toggles.
fn parse_features(spec: &str) -> Result<BTreeMap<String, u32>> {
    let mut features = BTreeMap::new();
    for item in spec.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        if let Some(tag) = item.strip_prefix('-') {
            features.insert(tag.to_string(), 0);
        } else if let Some((tag, value)) = item.split_once('=') {
            let value: u32 = value
                .trim()
                .parse()
                .with_context(|| format!("invalid feature value in '{item}'"))?;
            features.insert(tag.trim().to_string(), value);
        } else {
            features.insert(item.to_string(), 1);
        }
    }
    Ok(features)
}

/// Parses "wght=700,wdth=85" into an axis location.
fn parse_variations(spec: &str) -> Result<VarLocation> {
    let mut location = VarLocation::new();
    for item in spec.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let (axis, value) = item
            .split_once('=')
            .with_context(|| format!("expected AXIS=VALUE, got '{item}'"))?;
        let value: f32 = value
            .trim()
            .parse()
            .with_context(|| format!("invalid axis value in '{item}'"))?;
        location.insert(axis.trim().to_string(), value);
    }
    Ok(location)
}

/// Parses "f,i,U+0041" into glyph selectors.
fn parse_glyph_list(spec: &str) -> Result<Vec<GlyphSelector>> {
    spec.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            if let Some(hex) = item.strip_prefix("U+").or_else(|| item.strip_prefix("u+")) {
                let codepoint = u32::from_str_radix(hex, 16)
                    .with_context(|| format!("invalid codepoint '{item}'"))?;
                Ok(GlyphSelector::CodePoint(codepoint))
            } else {
                Ok(GlyphSelector::GlyphName(item.to_string()))
            }
        })
        .collect()
}
