// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Subcommand implementations.

use std::fs;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use photon_app_core::config::ConfigService;
use photon_app_core::fs::FsConfigStore;
use photon_app_core::prefs::ToolPrefs;
use photon_file::{analyze_file, LayerBitmap, PhotonFile, PreviewImage};
use photon_sl1::Sl1Archive;
use tracing::{debug, info, warn};

use crate::cli::{Cli, Command, ProfileAction};
use crate::report::{self, InfoFacts};

/// Large and small preview sizes for newly written jobs.
const PREVIEW_ONE_SIZE: (u32, u32) = (400, 300);
const PREVIEW_TWO_SIZE: (u32, u32) = (200, 125);

pub fn run(cli: Cli) -> Result<()> {
    let config_dir = cli.config_dir.as_deref();
    match cli.command {
        Command::Info { file, json, peel } => info_cmd(&file, json, peel),
        Command::Layers { file } => {
            let photon = read_photon(&file)?;
            println!("{}", report::layers_table(&photon));
            Ok(())
        }
        Command::Islands {
            file,
            workers,
            all,
            output,
        } => islands_cmd(config_dir, &file, workers, all, output.as_deref()),
        Command::Set {
            file,
            output,
            exposure,
            bottom_exposure,
            off_time,
            bottom_layers,
            aa,
        } => {
            let edits = Edits {
                exposure,
                bottom_exposure,
                off_time,
                bottom_layers,
                aa,
            };
            set_cmd(&file, &output, &edits)
        }
        Command::Upgrade { file, output } => upgrade_cmd(&file, &output),
        Command::New { output, layers } => new_cmd(config_dir, &output, layers),
        Command::ImportSl1 { file, output } => import_sl1_cmd(config_dir, &file, &output),
        Command::Profile { action } => profile_cmd(config_dir, &action),
    }
}

fn read_photon(path: &Path) -> Result<PhotonFile> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file = PhotonFile::parse(&bytes)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "loaded photon file");
    Ok(file)
}

fn write_photon(path: &Path, file: &PhotonFile) -> Result<()> {
    let bytes = file.to_bytes();
    fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote photon file");
    Ok(())
}

fn config(config_dir: Option<&Path>) -> Result<ConfigService<FsConfigStore>> {
    let store = match config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    }
    .context("failed to open config store")?;
    Ok(ConfigService::new(store))
}

fn info_cmd(path: &Path, json: bool, peel_s: f32) -> Result<()> {
    let file = read_photon(path)?;
    let facts = InfoFacts {
        exposed_pixels: file.exposed_pixels().context("failed to decode layer images")?,
        peel_s,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report::info_json(&file, &facts))?);
    } else {
        println!("{}", file.header().summary());
        println!("{}", report::info_table(&file, &facts));
    }
    Ok(())
}

fn islands_cmd(
    config_dir: Option<&Path>,
    path: &Path,
    workers: Option<usize>,
    all: bool,
    output: Option<&Path>,
) -> Result<()> {
    let mut file = read_photon(path)?;
    let workers = match workers {
        Some(n) => n,
        None => ToolPrefs::load(&config(config_dir)?)
            .context("failed to load preferences")?
            .effective_workers(),
    };
    let results = analyze_file(&file, workers).context("failed to decode layer images")?;

    let reconnected: u64 = results.iter().map(|r| u64::from(r.reconnected)).sum();
    let remaining: u64 = results.iter().map(|r| u64::from(r.remaining_islands)).sum();
    let affected = results.iter().filter(|r| r.remaining_islands > 0).count();
    if affected > 0 || all {
        println!("{}", report::islands_table(&results, all));
    }
    println!(
        "{} layers analyzed, {reconnected} pixels reconnected, {remaining} island pixels left on {affected} layers",
        results.len()
    );

    if let Some(out) = output {
        for (layer, result) in file.layers_mut().iter_mut().zip(results) {
            layer.set_image(result.packed);
        }
        write_photon(out, &file)?;
    }
    Ok(())
}

struct Edits {
    exposure: Option<f32>,
    bottom_exposure: Option<f32>,
    off_time: Option<f32>,
    bottom_layers: Option<u32>,
    aa: Option<u32>,
}

fn set_cmd(path: &Path, output: &Path, edits: &Edits) -> Result<()> {
    let mut file = read_photon(path)?;
    let mut changed = false;
    if let Some(s) = edits.exposure {
        file.header_mut().set_exposure_s(s);
        changed = true;
    }
    if let Some(s) = edits.bottom_exposure {
        file.header_mut().set_bottom_exposure_s(s);
        changed = true;
    }
    if let Some(s) = edits.off_time {
        file.header_mut().set_off_time_s(s);
        changed = true;
    }
    if let Some(n) = edits.bottom_layers {
        file.set_bottom_layers(n);
        changed = true;
    }
    if let Some(level) = edits.aa {
        file.set_anti_aliasing(level)
            .with_context(|| format!("cannot set anti-aliasing level {level}"))?;
        changed = true;
    }
    if !changed {
        bail!("nothing to change: pass at least one of --exposure, --bottom-exposure, --off-time, --bottom-layers, --aa");
    }
    file.apply_header_timing();
    println!("{}", file.header().summary());
    write_photon(output, &file)
}

fn upgrade_cmd(path: &Path, output: &Path) -> Result<()> {
    let mut file = read_photon(path)?;
    let before = file.header().version();
    if file.header().is_v2() {
        warn!(version = before, "file is already version 2 or later");
    }
    file.upgrade();
    println!("version {before} -> {}", file.header().version());
    write_photon(output, &file)
}

fn new_cmd(config_dir: Option<&Path>, output: &Path, layers: u32) -> Result<()> {
    let prefs = ToolPrefs::load(&config(config_dir)?).context("failed to load preferences")?;
    let [width, height] = prefs.profile.resolution;
    let bitmaps: Vec<_> = (0..layers).map(|_| LayerBitmap::new(width, height)).collect();
    let file = PhotonFile::from_profile(
        &prefs.profile,
        PreviewImage::blank(PREVIEW_ONE_SIZE.0, PREVIEW_ONE_SIZE.1),
        PreviewImage::blank(PREVIEW_TWO_SIZE.0, PREVIEW_TWO_SIZE.1),
        &bitmaps,
    );
    println!("{}", file.header().summary());
    write_photon(output, &file)
}

fn import_sl1_cmd(config_dir: Option<&Path>, path: &Path, output: &Path) -> Result<()> {
    let prefs = ToolPrefs::load(&config(config_dir)?).context("failed to load preferences")?;
    let reader = fs::File::open(path)
        .map(BufReader::new)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let archive =
        Sl1Archive::read(reader).with_context(|| format!("failed to read SL1 archive {}", path.display()))?;
    let file = archive
        .to_photon(&prefs.profile)
        .with_context(|| format!("failed to convert {}", path.display()))?;
    println!("{}", file.header().summary());
    write_photon(output, &file)
}

fn profile_cmd(config_dir: Option<&Path>, action: &ProfileAction) -> Result<()> {
    let service = config(config_dir)?;
    let prefs = match action {
        ProfileAction::Show => ToolPrefs::load(&service).context("failed to load preferences")?,
        ProfileAction::Reset => {
            let prefs = ToolPrefs::default();
            prefs.save(&service).context("failed to save preferences")?;
            info!("preferences reset");
            prefs
        }
    };
    println!("{}", serde_json::to_string_pretty(&prefs)?);
    Ok(())
}
