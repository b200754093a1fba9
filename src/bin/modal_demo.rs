use clap::Parser;
use std::path::PathBuf;

use modal_mesh::{
    MaterialPreset, ModalConfig, ModalError, Pipeline, PipelineEvent, PolyhedralMesh, SynthesisProgram,
    TetQuality,
};

/// Turn a surface mesh or revolved profile into a modal synthesis program
#[derive(Parser)]
#[command(name = "modal_demo")]
#[command(version)]
struct Cli {
    /// Surface mesh (.obj) or profile (.svg)
    input: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Material preset, overriding the configuration
    #[arg(short, long)]
    material: Option<MaterialPreset>,

    /// Insert interior points for better shaped tetrahedra
    #[arg(long)]
    quality: bool,

    /// Number of excitation channels
    #[arg(long)]
    channels: Option<usize>,

    /// Number of synthesized modes
    #[arg(long)]
    modes: Option<usize>,

    /// Output program (defaults to the input name with a .dsp extension)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> modal_mesh::Result<()> {
    let mut config = match &cli.config {
        Some(path) => ModalConfig::from_file(path)?,
        None => ModalConfig::default(),
    };
    if let Some(preset) = cli.material {
        config.material.preset = Some(preset);
    }
    if cli.quality {
        config.volume.quality = TetQuality::Quality;
    }
    if let Some(channels) = cli.channels {
        config.excitation.channels = channels;
    }
    if let Some(modes) = cli.modes {
        config.modal.synth_modes = modes;
        config.modal.fem_modes = config.modal.fem_modes.max(modes);
    }
    config.validate()?;
    config.log_summary();
    let material = config.material.resolve()?;

    println!("=== Modal Mesh Demo ===\n");
    println!("Loading {}...", cli.input.display());
    let mut surface = PolyhedralMesh::load_with(&cli.input, &config.profile)?;
    surface.center();
    println!("  Vertices: {}", surface.num_vertices());
    println!("  Faces: {}", surface.num_faces());

    let mut pipeline = Pipeline::new(surface).with_generator(config.volume.generator());
    pipeline.set_channel_count(config.excitation.channels);

    println!("\nTetrahedralizing ({:?})...", config.volume.quality);
    pipeline.request_volume(config.volume.quality)?;
    for event in pipeline.wait() {
        if let PipelineEvent::VolumeFailed(e) = event {
            return Err(e);
        }
    }
    let volume = pipeline.volume().cloned().ok_or(ModalError::EmptyVolume)?;
    let quality = volume.quality();
    println!("  Points: {}", volume.num_vertices());
    println!("  Tetrahedra: {}", volume.num_tetrahedra());
    println!("  Volume: {:.6}", volume.total_volume());
    println!("  {}", quality.report());
    println!("  Excitation channels: {}", pipeline.channels().len());

    println!("\nModal analysis...");
    pipeline.request_modal(material, config.modal.clone())?;
    let model = pipeline
        .wait()
        .into_iter()
        .find_map(|event| match event {
            PipelineEvent::ModalReady(model) => Some(Ok(model)),
            PipelineEvent::ModalFailed(e) => Some(Err(e)),
            _ => None,
        })
        .unwrap_or(Err(ModalError::TaskFailed("modal build produced no result".to_string())))?;

    for warning in &model.warnings {
        println!("  warning: {}", warning);
    }
    println!("\n  {:>4}  {:>12}  {:>10}  {:>12}", "mode", "freq (Hz)", "T60 (s)", "zeta");
    for (i, mode) in model.modes.iter().enumerate() {
        println!(
            "  {:>4}  {:>12.2}  {:>10.4}  {:>12.3e}",
            i, mode.frequency_hz, mode.t60, mode.damping_ratio
        );
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("dsp"));
    let name = cli
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("modal");
    let program = SynthesisProgram::from_model(&model, name);
    std::fs::write(&output, program.text()).map_err(|e| ModalError::io(&output, e))?;
    println!(
        "\nWrote {} ({} modes, {} channels, controls: {})",
        output.display(),
        program.num_modes(),
        program.num_channels(),
        program.control_names().join(", ")
    );
    Ok(())
}
